//! 文本解码
//!
//! HTML 部件按"声明字符集 → 文档内 meta 字符集 → 固定回退列表"的顺序严格解码，
//! 全部失败时放弃该部件；样式表与脚本则总是以替换字符方式宽松解码。

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};

use super::html::{get_charset, html_to_dom};

/// 严格解码失败时依次尝试的字符集
pub const FALLBACK_ENCODINGS: &[&str] = &["utf-8", "cp949", "euc-kr", "iso-8859-1"];

fn strip_bom(text: Cow<'_, str>) -> String {
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text.into_owned(),
    }
}

/// 严格解码 HTML 负载
///
/// `declared_charset` 为部件声明（或 MIME 层转码后）的字符集。
/// 所有候选字符集都无法无损解码时返回 `None`。
pub fn decode_document(payload: &[u8], declared_charset: Option<&str>) -> Option<String> {
    let declared = declared_charset.and_then(|label| Encoding::for_label(label.trim().as_bytes()));

    if let Some(encoding) = declared {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(payload) {
            return Some(strip_bom(text));
        }
    }

    // 先宽松解析一次，读取文档自身声明的字符集
    let provisional = html_to_dom(&String::from_utf8_lossy(payload));
    let sniffed = get_charset(&provisional.document)
        .and_then(|label| Encoding::for_label_no_replacement(label.trim().as_bytes()));

    let mut tried: Vec<&'static Encoding> = declared.into_iter().collect();
    let candidates = sniffed.into_iter().chain(
        FALLBACK_ENCODINGS
            .iter()
            .filter_map(|label| Encoding::for_label(label.as_bytes())),
    );

    for encoding in candidates {
        if tried.contains(&encoding) {
            continue;
        }
        tried.push(encoding);

        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(payload) {
            return Some(strip_bom(text));
        }
    }

    None
}

/// 宽松解码文本资源，无法识别的字符集按 UTF-8 处理，错误字节替换为 U+FFFD
pub fn decode_lossy(payload: &[u8], charset: Option<&str>) -> String {
    let encoding = charset
        .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
        .unwrap_or(UTF_8);

    let (text, _, _) = encoding.decode(payload);
    text.into_owned()
}
