//! 详情页补充流程 - 流程层
//!
//! 对每条新记录：解析详情链接 → 抓取（失败重试）→ 解析时间/地点/主办单位

use std::time::Duration;

use tracing::{debug, error, info, warn};
use url::Url;

use crate::infrastructure::PageFetcher;
use crate::models::{DetailRecord, ListRecord};
use crate::services::extract_detail;
use crate::workflow::site_ctx::SiteCtx;

/// 详情页补充流程
///
/// 补充是"全有或全无"：重试耗尽或详情页没有标题时丢弃该条记录。
pub struct DetailFlow<'a> {
    fetcher: &'a dyn PageFetcher,
    max_retries: u32,
    retry_delay: Duration,
}

impl<'a> DetailFlow<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            fetcher,
            max_retries: max_retries.max(1),
            retry_delay,
        }
    }

    pub async fn run(&self, site_url: &str, item: &ListRecord, ctx: &SiteCtx) -> Option<DetailRecord> {
        let Some(link) = item.link.as_deref().filter(|l| !l.trim().is_empty()) else {
            debug!("{} 条目 '{}' 没有详情链接", ctx, item.title);
            return None;
        };

        let detail_url = match resolve_link(site_url, link) {
            Some(url) => url,
            None => {
                warn!("{} 无法解析详情链接: {}", ctx, link);
                return None;
            }
        };
        info!("{} 抓取详情页: {}", ctx, detail_url);

        for attempt in 1..=self.max_retries {
            match self.fetcher.fetch(&detail_url).await {
                Ok(body) => {
                    let fetched_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
                    return extract_detail(&body, item, &fetched_at);
                }
                Err(e) => {
                    warn!(
                        "{} 详情页抓取失败: {} (尝试 {}/{})",
                        ctx, e, attempt, self.max_retries
                    );
                    if attempt < self.max_retries {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        error!("{} ❌ 详情页抓取彻底失败，已达最大重试次数: {}", ctx, detail_url);
        None
    }
}

/// 相对链接按站点 URL 补全
fn resolve_link(site_url: &str, link: &str) -> Option<String> {
    let link = link.trim();
    match Url::parse(site_url) {
        Ok(base) => base.join(link).ok().map(String::from),
        Err(_) => Url::parse(link).ok().map(String::from),
    }
}
