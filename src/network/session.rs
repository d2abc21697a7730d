//! HTTP 会话
//!
//! 只在启用字体下载时创建，用于取回样式表中引用但归档里缺失的字体文件。

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use tracing::debug;

use crate::core::{parse_content_type, UnpackError, UnpackOptions};
use crate::utils::url::Url;

/// 跟随重定向的最大次数
pub const MAX_REDIRECTS: usize = 10;

pub struct Session {
    client: Client,
}

impl Session {
    pub fn new(options: &UnpackOptions) -> Result<Session, UnpackError> {
        let mut builder = Client::builder().redirect(Policy::limited(MAX_REDIRECTS));

        if let Some(timeout) = options.timeout {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        if let Some(user_agent) = &options.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }

        let client = builder
            .build()
            .map_err(|err| UnpackError::Config(format!("cannot create HTTP client: {err}")))?;

        Ok(Session { client })
    }

    /// 取回一个资源
    ///
    /// 返回内容、重定向之后的最终 URL 以及响应声明的媒体类型（可能为空）。
    /// 非 2xx 状态与传输错误都返回 [`UnpackError::Fetch`]。
    pub fn retrieve_asset(&self, url: &Url) -> Result<(Vec<u8>, Url, String), UnpackError> {
        let fetch_error = |reason: String| UnpackError::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url.as_str())
            .send()
            .map_err(|err| fetch_error(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP status {status}")));
        }

        let final_url = response.url().clone();
        let media_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| parse_content_type(value).0)
            .unwrap_or_default();

        let data = response
            .bytes()
            .map_err(|err| fetch_error(err.to_string()))?
            .to_vec();

        debug!("Fetched {} ({} bytes, {})", final_url, data.len(), media_type);

        Ok((data, final_url, media_type))
    }
}
