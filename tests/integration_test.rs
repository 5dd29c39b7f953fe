use async_trait::async_trait;
use listing_monitor::{App, Config, FetchError, JsonTableStore, PageFetcher, RecordStore, SiteConfig};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

const LIST_URL: &str = "https://events.test/List.aspx?spid=S1";
const PAGE_2_URL: &str = "https://events.test/List.aspx?pg=2&spid=S1";

/// 内存中的站点：URL → HTML，未登记的 URL 返回 404
struct FakeSite {
    pages: HashMap<String, String>,
    requests: Mutex<Vec<String>>,
}

impl FakeSite {
    fn new(pages: Vec<(&str, String)>) -> Self {
        Self {
            pages: pages.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn requests_for(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }
}

#[async_trait]
impl PageFetcher for FakeSite {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::BadStatus {
                url: url.to_string(),
                status: 404,
            })
    }
}

fn row(nid: &str, title: &str, date: &str) -> String {
    format!(r#"<tr><td><a href="Detail.aspx?nid={nid}">{title}</a></td><td>{date}</td></tr>"#)
}

fn list_page(rows: &[String], pager: &str) -> String {
    format!(
        r#"<html><body>
        <table id="list"><tr><th>活動</th><th>日期</th></tr>{}</table>
        {}
        </body></html>"#,
        rows.concat(),
        pager
    )
}

fn detail_page(time: &str, organizer: &str) -> String {
    format!(
        r#"<div class="clsDtlDes">
            <p>時間：{time}</p>
            <p>地點：守謙國際會議中心</p>
            <p>主辦單位：{organizer}</p>
        </div>"#
    )
}

fn detail_url(nid: &str) -> String {
    format!("https://events.test/Detail.aspx?nid={nid}")
}

/// 两页列表（B2 在两页都出现）加三个详情页
fn standard_site() -> Vec<(&'static str, String)> {
    vec![
        (
            LIST_URL,
            list_page(
                &[
                    row("A1", "Teaching Forum", "2024-05-01"),
                    row("B2", "Research Day", "2024-05-02"),
                ],
                r#"<div class="pagination"><a href="List.aspx?pg=2&spid=S1">2</a></div>"#,
            ),
        ),
        (
            PAGE_2_URL,
            list_page(
                &[
                    row("B2", "Research Day", "2024-05-02"),
                    row("C3", "Library Tour", "2024-04-20"),
                ],
                "",
            ),
        ),
    ]
}

fn with_details(mut pages: Vec<(&'static str, String)>, details: &[(&str, &str, &str)]) -> FakeSite {
    let mut owned: Vec<(String, String)> = pages
        .drain(..)
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    for (nid, time, organizer) in details {
        owned.push((detail_url(nid), detail_page(time, organizer)));
    }
    FakeSite {
        pages: owned.into_iter().collect(),
        requests: Mutex::new(Vec::new()),
    }
}

fn config(data_dir: &Path) -> Config {
    Config {
        data_dir: data_dir.to_path_buf(),
        output_log_file: data_dir.join("monitor.log"),
        page_delay_ms: 0,
        detail_max_retries: 2,
        detail_retry_delay_ms: 0,
        ..Config::default()
    }
}

fn site() -> SiteConfig {
    SiteConfig::new("events", LIST_URL, "#list tr", "events.json")
}

#[tokio::test]
async fn test_second_run_finds_nothing_new() {
    let dir = tempfile::tempdir().unwrap();
    let fake = Arc::new(with_details(
        standard_site(),
        &[
            ("A1", "2024/06/01 ~ 2024/06/03", "教發中心"),
            ("B2", "2024/05/20", "研究發展處"),
            ("C3", "2024年4月25日", "圖書館"),
        ],
    ));
    let app = App::with_fetcher(config(dir.path()), vec![site()], fake.clone());

    let first = app.run().await.unwrap();
    assert_eq!(first.success, 1);
    let mut titles: Vec<&str> = first.new_records.iter().map(|r| r.title.as_str()).collect();
    titles.sort();
    assert_eq!(titles, vec!["Library Tour", "Research Day", "Teaching Forum"]);

    let second = app.run().await.unwrap();
    assert!(second.new_records.is_empty());

    // 每个详情页只在第一次运行时抓取
    assert_eq!(fake.requests_for(&detail_url("B2")), 1);

    let stored = JsonTableStore::new(dir.path().join("events.json")).load().await.unwrap();
    assert_eq!(stored.len(), 3);

    // 按起日升序
    let starts: Vec<Option<&str>> = stored.iter().map(|r| r.start_date.as_deref()).collect();
    assert_eq!(
        starts,
        vec![Some("2024-04-25"), Some("2024-05-20"), Some("2024-06-01")]
    );

    let forum = stored.iter().find(|r| r.title == "Teaching Forum").unwrap();
    assert_eq!(forum.end_date.as_deref(), Some("2024-06-03"));
    assert_eq!(forum.date.as_deref(), Some("2024-05-01"));
    assert_eq!(forum.location.as_deref(), Some("守謙國際會議中心"));
}

#[tokio::test]
async fn test_organizer_allow_list_filters_saved_records() {
    let dir = tempfile::tempdir().unwrap();
    let fake = Arc::new(with_details(
        standard_site(),
        &[
            ("A1", "2024/06/01", "教發中心"),
            ("B2", "2024/06/02", "研究發展處"),
            ("C3", "2024/06/03", "教發中心"),
        ],
    ));
    let mut site = site();
    site.organizer_allow_list = Some(vec!["教發中心".to_string()]);

    let app = App::with_fetcher(config(dir.path()), vec![site], fake);
    let summary = app.run().await.unwrap();

    assert_eq!(summary.new_records.len(), 2);
    assert!(summary
        .new_records
        .iter()
        .all(|r| r.organizer.as_deref() == Some("教發中心")));
}

#[tokio::test]
async fn test_failed_detail_is_dropped_and_retried_next_run() {
    let dir = tempfile::tempdir().unwrap();
    let fake = Arc::new(with_details(
        standard_site(),
        &[("A1", "2024/06/01", "教發中心"), ("B2", "2024/06/02", "教發中心")],
    ));
    let app = App::with_fetcher(config(dir.path()), vec![site()], fake.clone());

    let first = app.run().await.unwrap();
    assert_eq!(first.new_records.len(), 2);
    assert!(first.new_records.iter().all(|r| r.title != "Library Tour"));
    assert_eq!(fake.requests_for(&detail_url("C3")), 2);

    let second = app.run().await.unwrap();
    assert!(second.new_records.is_empty());
    assert_eq!(fake.requests_for(&detail_url("C3")), 4);
}

#[tokio::test]
async fn test_single_page_listing_without_pagination() {
    let dir = tempfile::tempdir().unwrap();
    let fake = Arc::new(FakeSite::new(vec![
        (
            "https://plain.test/news",
            r#"<ul>
                <li class="news-item"><h3>Spring Open House</h3><a href="/news/1?id=0A">more</a><span class="date">2024-03-01</span></li>
                <li class="news-item"><h3>Summer Camp Signup</h3><a href="/news/2?id=0B">more</a><span class="date">2024-06-10</span></li>
            </ul>"#
                .to_string(),
        ),
        ("https://plain.test/news/1?id=0A", "<p>時間：2024-03-05</p>".to_string()),
        ("https://plain.test/news/2?id=0B", "<p>時間：2024-06-15</p>".to_string()),
    ]));
    let mut site = SiteConfig::new("plain", "https://plain.test/news", "li.news-item", "../plain.json");
    site.auto_pagination = false;

    let app = App::with_fetcher(config(dir.path()), vec![site], fake);
    let summary = app.run().await.unwrap();
    assert_eq!(summary.new_records.len(), 2);

    // 记录文件被限制在数据目录内
    assert!(dir.path().join("plain.json").is_file());
}

#[tokio::test]
async fn test_capped_title_is_not_rediscovered() {
    let dir = tempfile::tempdir().unwrap();
    // 截断到 100 个字符时恰好停在空格上
    let long_title = format!("{} {}", "a".repeat(99), "b".repeat(20));
    let fake = Arc::new(FakeSite::new(vec![
        (
            "https://long.test/news",
            format!(
                r#"<ul><li class="news-item"><h3>{}</h3><a href="/news/9?id=0C">more</a><span class="date">2024-08-01</span></li></ul>"#,
                long_title
            ),
        ),
        ("https://long.test/news/9?id=0C", "<p>時間：2024-08-02</p>".to_string()),
    ]));
    let mut site = SiteConfig::new("long", "https://long.test/news", "li.news-item", "long.json");
    site.auto_pagination = false;

    let app = App::with_fetcher(config(dir.path()), vec![site], fake.clone());
    assert_eq!(app.run().await.unwrap().new_records.len(), 1);
    assert!(app.run().await.unwrap().new_records.is_empty());
    assert_eq!(fake.requests_for("https://long.test/news/9?id=0C"), 1);
}
