//! 页面抓取器 - 基础设施层
//!
//! 持有唯一的 HTTP 连接池，只暴露"按 URL 取回 HTML"的能力

use crate::config::Config;
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, USER_AGENT};
use std::time::Duration;
use tracing::{debug, warn};

/// 页面抓取能力
///
/// 实现方负责重试与礼貌延迟；返回错误即表示"页面不可用"。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// 基于 reqwest 的抓取器
///
/// 职责：
/// - 持有共享的连接池，多个站点任务通过 `Arc` 共用
/// - 对网络错误、429、5xx 做指数退避重试
/// - 每次成功后固定等待一段礼貌延迟
pub struct HttpPageFetcher {
    client: reqwest::Client,
    user_agent: String,
    retry_times: u32,
    politeness_delay: Duration,
    backoff_base: Duration,
}

impl HttpPageFetcher {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("Listing-Monitor/2.2"));
        headers.insert(USER_AGENT, user_agent);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("zh-TW,zh;q=0.9,en;q=0.8"),
        );
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(FetchError::ClientBuild)?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
            retry_times: config.fetch_retry_times,
            politeness_delay: Duration::from_millis(config.politeness_delay_ms),
            backoff_base: Duration::from_millis(config.fetch_backoff_ms),
        })
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let parsed =
            url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|source| FetchError::RequestFailed {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|source| FetchError::RequestFailed {
                url: url.to_string(),
                source,
            })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let attempts = self.retry_times + 1;

        for attempt in 1..=attempts {
            match self.fetch_once(url).await {
                Ok(body) => {
                    debug!("抓取成功: {} ({} 字节)", url, body.len());
                    tokio::time::sleep(self.politeness_delay).await;
                    return Ok(body);
                }
                Err(e) if e.is_transient() && attempt < attempts => {
                    let backoff = self.backoff_base * 2u32.pow(attempt - 1);
                    warn!(
                        "抓取失败 (第 {}/{} 次): {}，{:?} 后重试",
                        attempt, attempts, e, backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) if e.is_transient() => {
                    return Err(FetchError::RetriesExhausted {
                        url: url.to_string(),
                        attempts,
                        last_error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Err(FetchError::RetriesExhausted {
            url: url.to_string(),
            attempts,
            last_error: "未发起请求".to_string(),
        })
    }
}
