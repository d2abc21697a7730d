//! 链接类型与 srcset 解析
//!
//! ```rust
//! use mhtml_unpack::parsers::html::parser::{parse_link_type, parse_srcset, LinkType};
//!
//! let link_types = parse_link_type("preload stylesheet");
//! assert_eq!(link_types, vec![LinkType::Preload, LinkType::Stylesheet]);
//!
//! let srcset_items = parse_srcset("small.jpg 480w, large.jpg 800w");
//! assert_eq!(srcset_items.len(), 2);
//! ```

/// HTML `<link>` 元素 `rel` 属性中与资源相关的取值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkType {
    /// 备用版本链接
    Alternate,
    /// 网站图标（包括 Apple 触摸图标）
    Icon,
    /// 预加载资源
    Preload,
    /// CSS样式表
    Stylesheet,
}

/// srcset 属性中的一个候选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcSetItem<'a> {
    /// 图片路径或 URL
    pub path: &'a str,
    /// 宽度（`480w`）或像素密度（`2x`）描述符，可以为空
    pub descriptor: &'a str,
}

/// 解析HTML链接的rel属性值
///
/// 多个值以空白分隔，不区分大小写，不认识的值被忽略。
pub fn parse_link_type(link_attr_rel_value: &str) -> Vec<LinkType> {
    let mut types: Vec<LinkType> = vec![];

    for link_attr_rel_type in link_attr_rel_value.split_whitespace() {
        if link_attr_rel_type.eq_ignore_ascii_case("alternate") {
            types.push(LinkType::Alternate);
        } else if link_attr_rel_type.eq_ignore_ascii_case("preload") {
            types.push(LinkType::Preload);
        } else if link_attr_rel_type.eq_ignore_ascii_case("stylesheet") {
            types.push(LinkType::Stylesheet);
        } else if link_attr_rel_type.eq_ignore_ascii_case("icon")
            || link_attr_rel_type.eq_ignore_ascii_case("apple-touch-icon")
        {
            types.push(LinkType::Icon);
        }
    }

    types
}

/// 解析 `img` / `source` 元素的 srcset 属性
///
/// 候选项以逗号分隔；URL 本身可以包含逗号（例如 data URL），
/// 所以只有 URL 之后的逗号才被视为分隔符。
pub fn parse_srcset(srcset: &str) -> Vec<SrcSetItem<'_>> {
    let mut srcset_items: Vec<SrcSetItem> = vec![];
    let mut rest = srcset;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == ',');
        if rest.is_empty() {
            break;
        }

        let path_end = rest
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or(rest.len());
        let raw_path = &rest[..path_end];
        rest = &rest[path_end..];

        // 紧跟在 URL 后面的逗号表示没有描述符
        let path = raw_path.trim_end_matches(',');
        let descriptor = if path.len() < raw_path.len() {
            ""
        } else {
            let descriptor_end = rest.find(',').unwrap_or(rest.len());
            let descriptor = rest[..descriptor_end].trim();
            rest = &rest[descriptor_end..];
            descriptor
        };

        srcset_items.push(SrcSetItem { path, descriptor });
    }

    srcset_items
}
