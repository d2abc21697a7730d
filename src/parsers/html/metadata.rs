//! HTML 文档元数据处理
//!
//! 读取和更新文档头部的字符集声明与标题。

use markup5ever_rcdom::{Handle, NodeData};

use crate::core::parse_content_type;

use super::dom::{find_nodes, get_node_attr, set_node_attr};

/// 获取文档字符编码
///
/// 从 HTML 文档的 meta 标签中提取字符编码信息。支持两种格式：
/// 1. HTML5 格式：`<meta charset="utf-8">`
/// 2. HTML4 格式：`<meta http-equiv="content-type" content="text/html; charset=utf-8">`
///
/// # 返回值
///
/// * `Some(String)` - 如果找到字符编码声明，返回编码名称（如 "utf-8"）
/// * `None` - 如果没有找到任何字符编码声明
pub fn get_charset(node: &Handle) -> Option<String> {
    for meta_node in find_nodes(node, vec!["html", "head", "meta"]).iter() {
        if let Some(meta_charset_node_attr_value) = get_node_attr(meta_node, "charset") {
            return Some(meta_charset_node_attr_value);
        }

        if get_node_attr(meta_node, "http-equiv")
            .unwrap_or_default()
            .eq_ignore_ascii_case("content-type")
        {
            if let Some(meta_content_type_node_attr_value) = get_node_attr(meta_node, "content") {
                let (_media_type, charset, _is_base64) =
                    parse_content_type(&meta_content_type_node_attr_value);
                if !charset.is_empty() {
                    return Some(charset);
                }
            }
        }
    }

    None
}

/// 更新文档中已有的字符集声明
///
/// 只修改第一个字符集声明；文档没有声明时不做任何改动。返回是否做了修改。
pub fn set_charset(document: &Handle, charset: &str) -> bool {
    for meta_node in find_nodes(document, vec!["html", "head", "meta"]).iter() {
        if get_node_attr(meta_node, "charset").is_some() {
            set_node_attr(meta_node, "charset", Some(charset.to_string()));
            return true;
        }

        if get_node_attr(meta_node, "http-equiv")
            .unwrap_or_default()
            .eq_ignore_ascii_case("content-type")
        {
            let content = get_node_attr(meta_node, "content").unwrap_or_default();
            let (media_type, _, _) = parse_content_type(&content);
            let media_type = if media_type.is_empty() {
                "text/html".to_string()
            } else {
                media_type
            };
            set_node_attr(
                meta_node,
                "content",
                Some(format!("{media_type}; charset={charset}")),
            );
            return true;
        }
    }

    false
}

/// 获取文档标题
///
/// 只返回第一个 title 标签的文本内容。
pub fn get_title(node: &Handle) -> Option<String> {
    for title_node in find_nodes(node, vec!["html", "head", "title"]).iter() {
        for child_node in title_node.children.borrow().iter() {
            if let NodeData::Text { ref contents } = child_node.data {
                return Some(contents.borrow().to_string());
            }
        }
    }

    None
}
