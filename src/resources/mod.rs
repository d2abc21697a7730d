//! # 资源模块
//!
//! - `sanitize` - 文件名清理与随机文件名
//! - `output` - 输出目录布局与文件名占用
//! - `mapping` - 资源映射表
//! - `fonts` - 外部字体解析
//! - `writer` - 部件分类与写入

pub mod fonts;
pub mod mapping;
pub mod output;
pub mod sanitize;
pub mod writer;

pub use fonts::FontResolver;
pub use mapping::{Resolution, ResourceMap};
pub use output::{OutputTree, ResourceKind, PRIMARY_DOCUMENT_NAME};
pub use sanitize::{random_filename, sanitize_filename};
pub use writer::{classify, ResourceWriter};
