//! URL 与输出路径工具函数
//!
//! 归档中的引用有三种形态：`cid:` 内容标识符、原始服务器 URL（或相对路径），
//! 以及已经落盘的输出路径。这里集中处理它们的识别、解析和相对路径换算。

use percent_encoding::percent_decode_str;

pub use url::Url;

/// 内容标识符引用的前缀
pub const CID_PREFIX: &str = "cid:";

/// 被视为外部引用的前缀，这些引用保持原样且不会被报告为未解析
const EXTERNAL_REFERENCE_PREFIXES: &[&str] = &[
    "http:",
    "https:",
    "data:",
    "about:",
    "blob:",
    "javascript:",
];

/// 去掉 `cid:` 前缀（不区分大小写），非 cid 引用返回 `None`
pub fn strip_cid_prefix(reference: &str) -> Option<&str> {
    if reference.len() >= CID_PREFIX.len()
        && reference.is_char_boundary(CID_PREFIX.len())
        && reference[..CID_PREFIX.len()].eq_ignore_ascii_case(CID_PREFIX)
    {
        Some(&reference[CID_PREFIX.len()..])
    } else {
        None
    }
}

/// 判断引用是否为外部（绝对）引用
///
/// 包括 http/https/data 等协议、根相对路径（`/path`、`//host/path`）以及
/// 仅包含片段的引用（`#top`）。
pub fn is_external_reference(reference: &str) -> bool {
    if reference.starts_with('/') || reference.starts_with('#') {
        return true;
    }

    EXTERNAL_REFERENCE_PREFIXES.iter().any(|prefix| {
        reference.len() >= prefix.len()
            && reference.is_char_boundary(prefix.len())
            && reference[..prefix.len()].eq_ignore_ascii_case(prefix)
    })
}

/// 基于基础 URL 解析引用，无法解析时返回 `None`
pub fn resolve_url(from: &Url, to: &str) -> Option<Url> {
    from.join(to.trim()).ok()
}

/// 从 Content-Location 中提取文件名
///
/// 取路径的最后一段，去掉查询参数和片段，并进行百分号解码。
/// 对于 `http://example.com/img/logo.png?v=2` 返回 `logo.png`。
pub fn file_name_from_location(location: &str) -> String {
    let segment = match Url::parse(location) {
        Ok(url) if url.has_host() || url.scheme() == "file" => url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or_default()
            .to_string(),
        // 相对路径或非层级 URL（例如 cid:）按纯文本处理
        _ => {
            let without_suffix = location
                .split(['?', '#'])
                .next()
                .unwrap_or_default();
            without_suffix
                .rsplit(['/', '\\'])
                .next()
                .unwrap_or_default()
                .to_string()
        }
    };

    percent_decode_str(&segment).decode_utf8_lossy().to_string()
}

/// 返回 URL 路径部分（不含查询参数与片段）
pub fn url_path_without_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or_default()
}

/// 将位于 `from_dir` 下文件中的相对引用换算为相对输出根目录的路径
///
/// `from_dir` 与返回值都使用正斜杠分隔。外部引用、cid 引用以及越过输出根目录的引用返回 `None`。
///
/// ```
/// use mhtml_unpack::utils::url::join_relative;
///
/// assert_eq!(
///     join_relative("resource/css", "../font/a.woff2"),
///     Some("resource/font/a.woff2".to_string())
/// );
/// ```
pub fn join_relative(from_dir: &str, reference: &str) -> Option<String> {
    let reference = url_path_without_query(reference.trim());
    if reference.is_empty() || is_external_reference(reference) || reference.contains(':') {
        return None;
    }

    let mut segments: Vec<&str> = from_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in reference.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }

    Some(segments.join("/"))
}

/// 计算从目录 `from_dir` 指向 `target` 的相对路径（均相对输出根目录）
///
/// ```
/// use mhtml_unpack::utils::url::relative_path_between;
///
/// assert_eq!(
///     relative_path_between("resource/css", "resource/font/a.woff2"),
///     "../font/a.woff2"
/// );
/// ```
pub fn relative_path_between(from_dir: &str, target: &str) -> String {
    let from: Vec<&str> = from_dir.split('/').filter(|s| !s.is_empty()).collect();
    let to: Vec<&str> = target.split('/').filter(|s| !s.is_empty()).collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<&str> = vec![".."; from.len() - common];
    parts.extend_from_slice(&to[common..]);
    parts.join("/")
}
