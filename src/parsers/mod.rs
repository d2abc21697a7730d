//! # 解析器模块
//!
//! - `mime` - 把 MHTML 归档拆分为部件
//! - `encoding` - HTML 严格解码与文本资源宽松解码
//! - `html` - HTML文档解析、DOM操作、元数据处理
//! - `css` - 样式表中资源引用的定位与重写
//! - `link_rewriter` - 把文档中的引用改写为本地输出路径

pub mod css;
pub mod encoding;
pub mod html;
pub mod link_rewriter;
pub mod mime;

pub use css::{find_css_urls, rewrite_css_urls, CssUrl};
pub use encoding::{decode_document, decode_lossy};
pub use html::{get_charset, get_title, html_to_dom, serialize_document, set_charset};
pub use link_rewriter::{MarkupRewriter, RewriteOutcome};
pub use mime::{read_archive_parts, ArchivePart};
