//! 文件名清理
//!
//! 为归档中的资源生成安全、稳定的磁盘文件名。两种策略：
//!
//! - **保留可读名称**：去掉查询参数，只保留字母、数字、`-`、`_`、`.`，
//!   其余字符替换为 `_`；主干为空时使用随机短标识。
//! - **总是随机**：丢弃原始名称，只保留扩展名，随机标识在目标目录中
//!   已存在同名文件时重新生成。

use std::path::Path;

use uuid::Uuid;

/// 文件名主干的最大长度
pub const MAX_STEM_LENGTH: usize = 100;

/// 随机标识的长度
pub const RANDOM_TOKEN_LENGTH: usize = 8;

fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'
}

/// 生成随机短标识（uuid v4 的前 8 个十六进制字符）
pub fn random_token() -> String {
    let mut token = Uuid::new_v4().simple().to_string();
    token.truncate(RANDOM_TOKEN_LENGTH);
    token
}

/// 拆分文件名为主干与扩展名（扩展名包含前导 `.`）
///
/// 以 `.` 开头且没有其他点的名称（如 `.htaccess`）视为没有扩展名。
pub fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(index) if index > 0 => (&file_name[..index], &file_name[index..]),
        _ => (file_name, ""),
    }
}

/// 判断文件名是否以给定扩展名之一结尾（不区分大小写，扩展名不含 `.`）
pub fn has_extension(file_name: &str, extensions: &[&str]) -> bool {
    let (_, extension) = split_extension(file_name);
    extension
        .strip_prefix('.')
        .map(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// 清理文件名，保留可读性
///
/// 对自身输出再次调用会得到相同结果。
///
/// ```
/// use mhtml_unpack::resources::sanitize::sanitize_filename;
///
/// assert_eq!(sanitize_filename("my photo (1).png?w=200"), "my_photo__1_.png");
/// assert_eq!(sanitize_filename(sanitize_filename("a b.css").as_str()), "a_b.css");
/// ```
pub fn sanitize_filename(file_name: &str) -> String {
    let without_query = file_name.split('?').next().unwrap_or_default();
    let (stem, extension) = split_extension(without_query);

    let mut stem: String = stem
        .chars()
        .map(|c| if is_safe_char(c) { c } else { '_' })
        .collect();
    let extension: String = extension
        .chars()
        .map(|c| if is_safe_char(c) { c } else { '_' })
        .collect();

    if stem.len() > MAX_STEM_LENGTH {
        // 清理后只剩 ASCII，按字节截断是安全的
        stem.truncate(MAX_STEM_LENGTH);
    }

    if stem.is_empty() {
        stem = random_token();
    }

    format!("{stem}{extension}")
}

/// 生成随机文件名，在 `directory` 中已存在同名文件时重新生成
pub fn random_filename(extension: &str, directory: &Path) -> String {
    let extension: String = extension
        .chars()
        .map(|c| if is_safe_char(c) { c } else { '_' })
        .collect();

    loop {
        let candidate = format!("{}{}", random_token(), extension);
        if !directory.join(&candidate).exists() {
            return candidate;
        }
    }
}
