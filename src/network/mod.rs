//! # 网络模块
//!
//! - `session` - HTTP会话管理、资源下载

pub mod session;

pub use session::Session;
