//! 资源分类与写入
//!
//! 每个非 HTML 部件按内容类型（以及 Content-Location 的扩展名）归入
//! 字体、图片、样式表、脚本之一，以清理并补全扩展名后的文件名写入对应目录，
//! 然后把它的所有引用键登记到映射表中。

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::core::{FilenamePolicy, UnpackError};
use crate::parsers::css::{rewrite_css_urls, FONT_EXTENSIONS};
use crate::parsers::encoding::decode_lossy;
use crate::parsers::mime::ArchivePart;
use crate::utils::url::{
    file_name_from_location, relative_path_between, url_path_without_query, Url,
};

use super::fonts::{font_extension, FontResolver};
use super::mapping::ResourceMap;
use super::output::{OutputTree, ResourceKind};
use super::sanitize::{has_extension, sanitize_filename};

/// 图片文件扩展名
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "svg", "ico", "bmp", "avif", "apng", "tif", "tiff",
];

/// HTML 文件扩展名
pub const DOCUMENT_EXTENSIONS: &[&str] = &["html", "htm"];

/// 根据内容类型与文件名判断资源类别
///
/// 判断顺序：字体、图片、样式表、脚本。HTML 部件不在此处处理。
pub fn classify(content_type: &str, file_name: &str) -> Option<ResourceKind> {
    if content_type.contains("font") || has_extension(file_name, FONT_EXTENSIONS) {
        Some(ResourceKind::Font)
    } else if content_type.contains("image") || has_extension(file_name, IMAGE_EXTENSIONS) {
        Some(ResourceKind::Image)
    } else if content_type.contains("css") || has_extension(file_name, &["css"]) {
        Some(ResourceKind::Stylesheet)
    } else if content_type.contains("javascript")
        || content_type.contains("ecmascript")
        || has_extension(file_name, &["js", "mjs"])
    {
        Some(ResourceKind::Script)
    } else {
        None
    }
}

/// 部件的候选文件名：Content-Location 的最后一段，没有时使用内容标识符
fn candidate_name(part: &ArchivePart) -> String {
    part.location
        .as_deref()
        .map(file_name_from_location)
        .filter(|name| !name.is_empty())
        .or_else(|| part.content_id.clone())
        .unwrap_or_default()
}

/// 按类别补全扩展名，`subtype` 为内容类型的子类型部分
fn normalize_extension(kind: ResourceKind, file_name: String, subtype: &str) -> String {
    let extension = match kind {
        ResourceKind::Font if !has_extension(&file_name, FONT_EXTENSIONS) => {
            font_extension(subtype).unwrap_or(subtype)
        }
        ResourceKind::Image if !has_extension(&file_name, IMAGE_EXTENSIONS) => {
            if subtype.contains("svg") {
                "svg"
            } else if subtype.contains("gif") {
                "gif"
            } else {
                subtype
            }
        }
        ResourceKind::Stylesheet if !has_extension(&file_name, &["css"]) => "css",
        ResourceKind::Script if !has_extension(&file_name, &["js", "mjs"]) => "js",
        ResourceKind::Document if !has_extension(&file_name, DOCUMENT_EXTENSIONS) => "html",
        _ => return file_name,
    };

    if extension.is_empty() {
        file_name
    } else {
        // 子类型可能含有 `+` 等字符，再清理一次
        sanitize_filename(&format!("{file_name}.{extension}"))
    }
}

/// 把部件写入输出目录树
pub struct ResourceWriter {
    tree: OutputTree,
    policy: FilenamePolicy,
    fonts: FontResolver,
}

impl ResourceWriter {
    pub fn new(tree: OutputTree, policy: FilenamePolicy, fonts: FontResolver) -> Self {
        ResourceWriter {
            tree,
            policy,
            fonts,
        }
    }

    pub fn tree(&self) -> &OutputTree {
        &self.tree
    }

    /// 分类并写入一个资源部件，返回相对输出根目录的路径
    ///
    /// 没有内容的部件返回 `Ok(None)`；无法分类的部件返回 [`UnpackError::UnsupportedPart`]。
    pub fn write_part(
        &mut self,
        part: &ArchivePart,
        map: &mut ResourceMap,
    ) -> Result<Option<String>, UnpackError> {
        if part.payload.is_empty() {
            return Ok(None);
        }

        let raw_name = candidate_name(part);
        let kind = classify(&part.content_type, url_path_without_query(&raw_name)).ok_or_else(
            || UnpackError::UnsupportedPart {
                content_type: part.content_type.clone(),
                location: part.location.clone().unwrap_or_default(),
                content_id: part.content_id.clone().unwrap_or_default(),
            },
        )?;

        let file_name = normalize_extension(kind, sanitize_filename(&raw_name), part.subtype());
        let relative_path = self.tree.claim(kind, &file_name, self.policy);

        let contents: Vec<u8> = match kind {
            ResourceKind::Stylesheet => self.prepare_stylesheet(part, map).into_bytes(),
            ResourceKind::Script => decode_lossy(&part.payload, part.charset.as_deref()).into_bytes(),
            _ => part.payload.clone(),
        };

        self.write_file(&relative_path, &contents)?;
        map.register(part.location.as_deref(), part.content_id.as_deref(), &relative_path);
        debug!("Saved {} as {}", part.content_type, relative_path);

        Ok(Some(relative_path))
    }

    /// 解码样式表，并在启用字体下载时把字体引用替换为相对样式表的本地路径
    fn prepare_stylesheet(&mut self, part: &ArchivePart, map: &mut ResourceMap) -> String {
        let css = decode_lossy(&part.payload, part.charset.as_deref());
        if !self.fonts.is_enabled() {
            return css;
        }

        let base = part
            .location
            .as_deref()
            .and_then(|location| Url::parse(location).ok());
        let stylesheet_dir = ResourceKind::Stylesheet.relative_dir();

        let ResourceWriter {
            tree,
            policy,
            fonts,
        } = self;

        let (rewritten, _) = rewrite_css_urls(&css, |url| {
            if !url.is_font() {
                return None;
            }
            fonts
                .resolve(&url.value, base.as_ref(), &mut *tree, &mut *map, *policy)
                .map(|path| relative_path_between(&stylesheet_dir, &path))
        });

        rewritten
    }

    /// 为次要 HTML 文档预留路径并登记引用键
    pub fn reserve_document(&mut self, part: &ArchivePart, map: &mut ResourceMap) -> String {
        let file_name = normalize_extension(
            ResourceKind::Document,
            sanitize_filename(&candidate_name(part)),
            part.subtype(),
        );
        let relative_path = self.tree.claim(ResourceKind::Document, &file_name, self.policy);

        map.register(part.location.as_deref(), part.content_id.as_deref(), &relative_path);
        debug!("Reserved {} for nested document", relative_path);

        relative_path
    }

    /// 写入相对输出根目录的文件
    pub fn write_file(&self, relative_path: &str, contents: &[u8]) -> Result<PathBuf, UnpackError> {
        let path = self.tree.absolute_path(relative_path);
        fs::write(&path, contents).map_err(|source| UnpackError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }

    /// 删除相对输出根目录的文件
    pub fn remove_file(&self, relative_path: &str) -> Result<(), UnpackError> {
        let path = self.tree.absolute_path(relative_path);
        fs::remove_file(&path).map_err(|source| UnpackError::Io { path, source })
    }
}
