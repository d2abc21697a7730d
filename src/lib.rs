//! # MHTML Unpack Library
//!
//! 把 MHTML 网页归档拆解为一个目录：主文档 `main.html` 加上按类型分类的
//! `resource/` 子目录，文档中的 `cid:` 与 Content-Location 引用改写为本地路径。
//!
//! ## 模块组织
//!
//! - `core` - 核心功能和主要处理逻辑
//! - `env` - 环境变量配置
//! - `parsers` - 资源解析器（MIME、HTML、CSS）
//! - `resources` - 输出目录、资源映射表与资源写入
//! - `network` - 外部字体下载
//! - `utils` - 工具函数和实用程序

pub mod core;
pub mod env;
pub mod network;
pub mod parsers;
pub mod resources;
pub mod utils;

// Re-export commonly used items for convenience
pub use crate::core::*;
pub use network::*;
pub use parsers::*;
pub use resources::*;
pub use utils::*;
