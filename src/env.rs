//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量读取。命令行参数优先于环境变量，
//! 环境变量优先于内置默认值。

use std::env;
use std::fmt;

use crate::core::{FilenamePolicy, OutputLayout, UnpackOptions};

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "MHTML_UNPACK_LOG_LEVEL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            match value.trim().to_lowercase().as_str() {
                level @ ("trace" | "debug" | "info" | "warn" | "error") => Ok(level.to_string()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }

    /// 禁用颜色输出
    pub struct NoColor;
    impl EnvVar<bool> for NoColor {
        const NAME: &'static str = "NO_COLOR";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Disable colored output when set to any value";

        fn parse(value: &str) -> EnvResult<bool> {
            // NO_COLOR 约定：任何非空值都表示禁用颜色
            Ok(!value.is_empty())
        }
    }
}

/// 解包相关环境变量
pub mod unpack {
    use super::*;

    /// 下载归档中缺失的字体
    pub struct DownloadFonts;
    impl EnvVar<bool> for DownloadFonts {
        const NAME: &'static str = "MHTML_UNPACK_DOWNLOAD_FONTS";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str =
            "Fetch fonts referenced by style sheets but missing from the archive";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 将样式表内联到文档
    pub struct InlineCss;
    impl EnvVar<bool> for InlineCss {
        const NAME: &'static str = "MHTML_UNPACK_INLINE_CSS";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str =
            "Replace links to saved style sheets with <style> elements";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    /// 输出文件命名策略
    pub struct Filenames;
    impl EnvVar<FilenamePolicy> for Filenames {
        const NAME: &'static str = "MHTML_UNPACK_FILENAME_POLICY";
        const DEFAULT: Option<FilenamePolicy> = Some(FilenamePolicy::PreserveReadable);
        const DESCRIPTION: &'static str = "Output file naming: readable, random";

        fn parse(value: &str) -> EnvResult<FilenamePolicy> {
            value.parse().map_err(|message| EnvError {
                variable: Self::NAME.to_string(),
                message,
            })
        }
    }

    /// 输出目录布局
    pub struct Layout;
    impl EnvVar<OutputLayout> for Layout {
        const NAME: &'static str = "MHTML_UNPACK_OUTPUT_LAYOUT";
        const DEFAULT: Option<OutputLayout> = Some(OutputLayout::Fixed);
        const DESCRIPTION: &'static str = "Output directory layout: fixed, co-located";

        fn parse(value: &str) -> EnvResult<OutputLayout> {
            value.parse().map_err(|message| EnvError {
                variable: Self::NAME.to_string(),
                message,
            })
        }
    }

    /// 字体下载超时（秒）
    pub struct Timeout;
    impl EnvVar<u64> for Timeout {
        const NAME: &'static str = "MHTML_UNPACK_TIMEOUT";
        const DEFAULT: Option<u64> = None;
        const DESCRIPTION: &'static str = "Font download timeout in seconds (1-3600)";

        fn parse(value: &str) -> EnvResult<u64> {
            parse_bounded_u64(value, Self::NAME, 1, 3600)
        }
    }
}

/// 辅助函数
fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

fn parse_bounded_u64(value: &str, var_name: &str, min: u64, max: u64) -> EnvResult<u64> {
    let num: u64 = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

/// 环境变量配置汇总
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub log_level: String,
    pub no_color: bool,

    pub download_fonts: bool,
    pub inline_css: bool,
    pub filename_policy: FilenamePolicy,
    pub output_layout: OutputLayout,
    pub timeout: Option<u64>,
}

impl EnvConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> EnvResult<Self> {
        Ok(Self {
            log_level: core::LogLevel::get()?,
            no_color: core::NoColor::get()?,

            download_fonts: unpack::DownloadFonts::get()?,
            inline_css: unpack::InlineCss::get()?,
            filename_policy: unpack::Filenames::get()?,
            output_layout: unpack::Layout::get()?,
            timeout: match env::var(unpack::Timeout::NAME) {
                Ok(value) => Some(unpack::Timeout::parse(&value)?),
                Err(_) => None,
            },
        })
    }

    /// 生成以环境变量为基础的解包选项
    pub fn to_options(&self) -> UnpackOptions {
        UnpackOptions {
            output_layout: self.output_layout,
            filename_policy: self.filename_policy,
            download_fonts: self.download_fonts,
            inline_stylesheets: self.inline_css,
            timeout: self.timeout,
            ..UnpackOptions::default()
        }
    }
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables Documentation\n\n");

    docs.push_str("## Core Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: \"info\")\n",
        core::LogLevel::NAME,
        core::LogLevel::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        core::NoColor::NAME,
        core::NoColor::DESCRIPTION,
        core::NoColor::DEFAULT
    ));

    docs.push_str("\n## Unpack Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        unpack::DownloadFonts::NAME,
        unpack::DownloadFonts::DESCRIPTION,
        unpack::DownloadFonts::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        unpack::InlineCss::NAME,
        unpack::InlineCss::DESCRIPTION,
        unpack::InlineCss::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        unpack::Filenames::NAME,
        unpack::Filenames::DESCRIPTION,
        unpack::Filenames::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        unpack::Layout::NAME,
        unpack::Layout::DESCRIPTION,
        unpack::Layout::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: none)\n",
        unpack::Timeout::NAME,
        unpack::Timeout::DESCRIPTION
    ));

    docs
}
