//! 字体解析器
//!
//! 样式表中引用的字体如果不在归档里，可以选择从网络取回并保存到 `resource/font/`。
//! 解析器关闭时什么也不做，引用保持指向原始地址。

use std::fs;

use tracing::{debug, warn};

use crate::core::{FilenamePolicy, UnpackError, UnpackOptions};
use crate::network::session::Session;
use crate::parsers::css::FONT_EXTENSIONS;
use crate::utils::url::{file_name_from_location, resolve_url, Url};

use super::mapping::ResourceMap;
use super::output::{OutputTree, ResourceKind};
use super::sanitize::{has_extension, sanitize_filename};

/// 没有任何线索时假定的字体格式
pub const DEFAULT_FONT_EXTENSION: &str = "woff2";

/// 根据媒体类型推断字体扩展名（不含 `.`）
///
/// 只识别常见的字体媒体类型，其余返回 `None`。
pub fn font_extension(media_type: &str) -> Option<&'static str> {
    let subtype = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    match subtype.as_str() {
        "vnd.ms-fontobject" | "eot" => Some("eot"),
        "woff2" | "font-woff2" | "x-font-woff2" => Some("woff2"),
        "woff" | "font-woff" | "x-font-woff" => Some("woff"),
        "ttf" | "truetype" | "x-font-ttf" | "x-font-truetype" | "sfnt" | "font-sfnt" => {
            Some("ttf")
        }
        "otf" | "opentype" | "x-font-otf" | "x-font-opentype" => Some("otf"),
        _ => None,
    }
}

pub struct FontResolver {
    session: Option<Session>,
}

impl FontResolver {
    /// 按选项创建解析器，`download_fonts` 关闭时不创建 HTTP 会话
    pub fn new(options: &UnpackOptions) -> Result<FontResolver, UnpackError> {
        let session = if options.download_fonts {
            Some(Session::new(options)?)
        } else {
            None
        };

        Ok(FontResolver { session })
    }

    pub fn disabled() -> FontResolver {
        FontResolver { session: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.session.is_some()
    }

    /// 把字体引用解析为本地路径（相对输出根目录）
    ///
    /// `base` 为样式表自身的 Content-Location，用于解析相对引用。
    /// 已经登记过的完整 URL 直接复用，不会重复下载。
    pub fn resolve(
        &self,
        reference: &str,
        base: Option<&Url>,
        tree: &mut OutputTree,
        map: &mut ResourceMap,
        policy: FilenamePolicy,
    ) -> Option<String> {
        let session = self.session.as_ref()?;

        let url = match Url::parse(reference.trim()) {
            Ok(url) => url,
            Err(_) => resolve_url(base?, reference)?,
        };
        if url.scheme() != "http" && url.scheme() != "https" {
            return None;
        }

        if let Some(existing) = map.get(url.as_str()) {
            return Some(existing.to_string());
        }

        let (data, final_url, media_type) = match session.retrieve_asset(&url) {
            Ok(fetched) => fetched,
            Err(err) => {
                warn!("Skipping font: {}", err);
                return None;
            }
        };

        let mut file_name = sanitize_filename(&file_name_from_location(final_url.as_str()));
        if !has_extension(&file_name, FONT_EXTENSIONS) {
            let extension = font_extension(&media_type).unwrap_or(DEFAULT_FONT_EXTENSION);
            file_name = format!("{file_name}.{extension}");
        }

        let relative_path = tree.claim(ResourceKind::Font, &file_name, policy);
        let absolute_path = tree.absolute_path(&relative_path);
        if let Err(err) = fs::write(&absolute_path, &data) {
            warn!("Cannot write font {}: {}", absolute_path.display(), err);
            return None;
        }

        map.register_key(url.as_str(), &relative_path);
        if final_url != url {
            map.register_key(final_url.as_str(), &relative_path);
        }
        debug!("Downloaded font {} -> {}", url, relative_path);

        Some(relative_path)
    }
}
