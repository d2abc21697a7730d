//! HTML解析和处理模块
//!
//! - `dom`: 基础DOM操作
//! - `metadata`: 文档元数据处理
//! - `parser`: 链接类型与 srcset 解析
//! - `serializer`: 序列化功能

pub mod dom;
pub mod metadata;
pub mod parser;
pub mod serializer;

pub use dom::{find_elements, find_nodes, get_node_attr, get_node_name, html_to_dom, set_node_attr};
pub use metadata::{get_charset, get_title, set_charset};
pub use parser::{parse_link_type, parse_srcset, LinkType, SrcSetItem};
pub use serializer::serialize_document;
