//! MIME 部件读取
//!
//! 使用 `mail-parser` 将 MHTML 归档拆分为按流顺序排列的部件。
//! 每个叶子部件携带内容类型、可选的 Content-Location、可选的 Content-ID
//! 以及已经解码（base64 / quoted-printable）的字节内容。

use mail_parser::decoders::base64::base64_decode;
use mail_parser::decoders::quoted_printable::quoted_printable_decode;
use mail_parser::{Encoding, MessageParser, MessagePart, MimeHeaders, PartType};

use crate::core::UnpackError;

/// 缺省内容类型
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// 归档中的一个部件，解析后不再修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivePart {
    /// 小写的 `type/subtype`
    pub content_type: String,
    /// 原始引用（通常是 URL 或相对路径）
    pub location: Option<String>,
    /// 去掉尖括号后的内容标识符
    pub content_id: Option<String>,
    /// 部件头声明的字符集；文本部件未声明时为 `None`，交给文档解码探测
    pub charset: Option<String>,
    pub payload: Vec<u8>,
}

impl ArchivePart {
    pub fn is_html(&self) -> bool {
        self.content_type == "text/html"
    }

    /// 内容类型的子类型部分，例如 `image/svg+xml` 的 `svg+xml`
    pub fn subtype(&self) -> &str {
        self.content_type
            .split_once('/')
            .map(|(_, subtype)| subtype)
            .unwrap_or_default()
    }
}

/// 去掉内容标识符两侧的尖括号
pub fn strip_angle_brackets(content_id: &str) -> &str {
    content_id
        .trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
}

/// 把归档字节拆分为部件列表
///
/// 多部件容器本身没有内容，不会出现在结果中；非多部件的归档返回其唯一的正文部件。
pub fn read_archive_parts(data: &[u8]) -> Result<Vec<ArchivePart>, UnpackError> {
    let message = MessageParser::default()
        .parse(data)
        .ok_or(UnpackError::InvalidArchive)?;

    let mut parts = Vec::new();

    for part in message.parts.iter() {
        let declared_charset = part
            .content_type()
            .and_then(|ct| ct.attribute("charset"))
            .map(|charset| charset.to_string());

        let (charset, payload) = match &part.body {
            // 多部件容器和内嵌邮件不是网页资源
            PartType::Multipart(_) | PartType::Message(_) => continue,
            // 文本部件保留未转码的字节，字符集检测留给文档解码
            PartType::Text(_) | PartType::Html(_) => {
                match raw_body(message.raw_message(), part) {
                    Some(bytes) => (declared_charset, bytes),
                    // 取不到原始字节时只能使用 mail-parser 转好的 UTF-8 文本
                    None => (Some("utf-8".to_string()), part.contents().to_vec()),
                }
            }
            PartType::Binary(_) | PartType::InlineBinary(_) => {
                (declared_charset, part.contents().to_vec())
            }
        };

        let content_type = part
            .content_type()
            .map(|ct| match ct.subtype() {
                Some(subtype) => format!("{}/{}", ct.ctype(), subtype),
                None => ct.ctype().to_string(),
            })
            .map(|ct| ct.to_ascii_lowercase())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let location = part
            .content_location()
            .map(|location| location.trim().to_string())
            .filter(|location| !location.is_empty());

        let content_id = part
            .content_id()
            .map(|id| strip_angle_brackets(id).to_string())
            .filter(|id| !id.is_empty());

        parts.push(ArchivePart {
            content_type,
            location,
            content_id,
            charset,
            payload,
        });
    }

    Ok(parts)
}

/// 取出部件经过传输解码、但未做字符集转码的正文字节
fn raw_body(raw_message: &[u8], part: &MessagePart) -> Option<Vec<u8>> {
    let raw = raw_message.get(part.raw_body_offset()..part.raw_end_offset())?;

    match part.encoding {
        Encoding::Base64 => base64_decode(raw),
        Encoding::QuotedPrintable => quoted_printable_decode(raw),
        Encoding::None => Some(raw.to_vec()),
    }
}
