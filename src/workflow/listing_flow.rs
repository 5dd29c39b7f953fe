//! 列表页抓取流程 - 流程层
//!
//! 流程顺序：
//! 1. 抓取第一页 → 分页分析
//! 2. 生成分页 URL → 逐页抓取（页间固定延迟）→ 行提取
//! 3. 跨页去重
//!
//! 关闭自动分页或只有一页时，直接解析第一页。

use std::time::Duration;

use tracing::{info, warn};

use crate::error::FetchError;
use crate::infrastructure::PageFetcher;
use crate::models::{ListRecord, SiteConfig};
use crate::services::{analyze_pagination, deduplicate, generate_page_urls, RowExtractor};
use crate::workflow::site_ctx::SiteCtx;

/// 列表页抓取流程
///
/// - 页面按页码升序串行抓取
/// - 单页失败只让该页贡献 0 条记录
/// - 第一页失败视为整个站点失败
pub struct ListingFlow<'a> {
    fetcher: &'a dyn PageFetcher,
    page_delay: Duration,
}

impl<'a> ListingFlow<'a> {
    pub fn new(fetcher: &'a dyn PageFetcher, page_delay: Duration) -> Self {
        Self {
            fetcher,
            page_delay,
        }
    }

    pub async fn run(&self, site: &SiteConfig, ctx: &SiteCtx) -> Result<Vec<ListRecord>, FetchError> {
        let extractor = RowExtractor::new(site.max_items, site.table_mode);

        let first_page = self.fetcher.fetch(&site.url).await?;

        if !site.auto_pagination {
            info!("{} 单页抓取模式", ctx);
            let records = extractor.extract(&first_page, &site.container_selector);
            return Ok(deduplicate(records));
        }

        let pagination = analyze_pagination(&first_page);
        let total_pages = pagination.total_pages.min(site.max_pages.max(1));
        info!(
            "{} 检测到 {} 页 (最多抓取 {} 页)",
            ctx, pagination.total_pages, site.max_pages
        );

        if total_pages == 1 {
            info!("{} 只有一页，使用单页解析", ctx);
            let records = extractor.extract(&first_page, &site.container_selector);
            return Ok(deduplicate(records));
        }

        let page_urls = generate_page_urls(
            &site.url,
            total_pages,
            &pagination.page_param,
            site.page_param_override(),
            site.first_page_policy(),
        )?;

        let mut all_records = Vec::new();
        for (i, page_url) in page_urls.iter().enumerate() {
            let page_no = i + 1;
            info!("{} 抓取第 {}/{} 页: {}", ctx, page_no, page_urls.len(), page_url);

            let body = if page_url == &site.url {
                Ok(first_page.clone())
            } else {
                self.fetcher.fetch(page_url).await
            };

            match body {
                Ok(body) => {
                    let records = extractor.extract(&body, &site.container_selector);
                    info!("{} 第 {} 页解析到 {} 条", ctx, page_no, records.len());
                    all_records.extend(records);
                }
                Err(e) => warn!("{} ⚠️ 第 {} 页抓取失败: {}", ctx, page_no, e),
            }

            if page_no < page_urls.len() {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        let unique = deduplicate(all_records);
        info!("{} 共 {} 条不重复记录", ctx, unique.len());
        Ok(unique)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::page_fetcher::MockPageFetcher;
    use mockall::predicate::eq;

    fn row(nid: &str, title: &str) -> String {
        format!(r#"<tr><td><a href="d.aspx?nid={nid}">{title}</a></td><td>2024-05-01</td></tr>"#)
    }

    fn page(rows: &[String], pager: &str) -> String {
        format!("<table>{}</table>{}", rows.concat(), pager)
    }

    #[tokio::test]
    async fn test_multi_page_aggregates_and_dedups() {
        let pager = r#"<div class="pagination"><a href="list.aspx?pg=2&spid=S">2</a><a href="list.aspx?pg=3&spid=S">3</a></div>"#;
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch()
            .with(eq("https://site/list.aspx?spid=S"))
            .times(1)
            .returning(move |_| Ok(page(&[row("A1", "Event A"), row("B2", "Event B")], pager)));
        fetcher
            .expect_fetch()
            .with(eq("https://site/list.aspx?pg=2&spid=S"))
            .times(1)
            .returning(|_| Ok(page(&[row("B2", "Event B"), row("C3", "Event C")], "")));
        fetcher
            .expect_fetch()
            .with(eq("https://site/list.aspx?pg=3&spid=S"))
            .times(1)
            .returning(|_| {
                Err(FetchError::BadStatus {
                    url: "https://site/list.aspx?pg=3&spid=S".into(),
                    status: 503,
                })
            });

        let site = SiteConfig::new("s", "https://site/list.aspx?spid=S", "tr", "s.json");
        let flow = ListingFlow::new(&fetcher, Duration::ZERO);
        let records = flow.run(&site, &SiteCtx::new("s", 1)).await.unwrap();

        let nids: Vec<&str> = records.iter().filter_map(|r| r.nid.as_deref()).collect();
        assert_eq!(nids, vec!["A1", "B2", "C3"]);
    }

    #[tokio::test]
    async fn test_max_pages_caps_pagination() {
        let pager = r#"<a href="list.aspx?pg=9&spid=S">9</a>"#;
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch()
            .with(eq("https://site/list.aspx?spid=S"))
            .times(1)
            .returning(move |_| Ok(page(&[row("A1", "Event A")], pager)));
        fetcher
            .expect_fetch()
            .with(eq("https://site/list.aspx?pg=2&spid=S"))
            .times(1)
            .returning(|_| Ok(page(&[row("B2", "Event B")], "")));

        let mut site = SiteConfig::new("s", "https://site/list.aspx?spid=S", "tr", "s.json");
        site.max_pages = 2;
        let flow = ListingFlow::new(&fetcher, Duration::ZERO);
        let records = flow.run(&site, &SiteCtx::new("s", 1)).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_single_page_mode_ignores_pager() {
        let pager = r#"<a href="list.aspx?pg=5">5</a>"#;
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(move |_| Ok(page(&[row("A1", "Event A")], pager)));

        let mut site = SiteConfig::new("s", "https://site/list.aspx", "tr", "s.json");
        site.auto_pagination = false;
        let flow = ListingFlow::new(&fetcher, Duration::ZERO);
        let records = flow.run(&site, &SiteCtx::new("s", 1)).await.unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_first_page_failure_is_error() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch().returning(|url| {
            Err(FetchError::RetriesExhausted {
                url: url.to_string(),
                attempts: 4,
                last_error: "timeout".into(),
            })
        });

        let site = SiteConfig::new("s", "https://site/list.aspx", "tr", "s.json");
        let flow = ListingFlow::new(&fetcher, Duration::ZERO);
        assert!(flow.run(&site, &SiteCtx::new("s", 1)).await.is_err());
    }
}
