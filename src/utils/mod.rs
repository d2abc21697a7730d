//! # 工具模块
//!
//! 这个模块包含各种工具函数和实用程序：
//!
//! - 引用形态识别（`cid:`、外部 URL、根相对路径）
//! - Content-Location 文件名提取
//! - 输出目录内的相对路径换算
//!
//! # 模块组织
//!
//! - `url` - URL 处理和路径换算工具函数

pub mod url;

// Re-export commonly used items for convenience
pub use url::{
    file_name_from_location, is_external_reference, join_relative, relative_path_between,
    resolve_url, strip_cid_prefix, url_path_without_query, Url, CID_PREFIX,
};
