/// 分页分析
///
/// 从已抓取的第一页推断总页数、当前页、页码参数名与基础 URL。纯函数，不做 I/O。
use crate::models::PaginationInfo;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, info};

/// 分页容器的常见写法，按顺序取第一个命中的
const PAGINATION_CONTAINERS: [&str; 16] = [
    ".pagination",
    ".pager",
    "[class*=\"page\"]",
    "[class*=\"pagination\"]",
    "ul.pagination",
    ".page-numbers",
    "#pagination",
    "nav.pagination",
    ".paging",
    "div.pager",
    ".pagination-info",
    "[id*=\"page\"]",
    ".pager li",
    "ul.page",
    ".pages",
    "[class*=\"nav\"]",
];

const CURRENT_PAGE_MARKERS: [&str; 4] = [".active", ".current", "[aria-current=\"page\"]", ".on"];

static CONTAINER_SELECTORS: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    PAGINATION_CONTAINERS
        .iter()
        .filter_map(|raw| Selector::parse(raw).ok().map(|s| (*raw, s)))
        .collect()
});
static CURRENT_SELECTORS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    CURRENT_PAGE_MARKERS
        .iter()
        .filter_map(|raw| Selector::parse(raw).ok())
        .collect()
});
static LINK_WITH_HREF: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static CANONICAL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"link[rel~="canonical"]"#).unwrap());
static OG_URL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[property="og:url"]"#).unwrap());

static PAGE_PARAM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b(pg|page)=(\d+)").unwrap());
static TEXT_TOTALS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"共?\s*(\d+)\s*[頁页]",
        r"(\d+)\s*/\s*(\d+)\s*[頁页]",
        r"(?i)total\s*:?\s*(\d+)",
        r"(?i)page\s+(\d+)\s+of\s+(\d+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});
static LAST_PAGE_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)最後|最后|last|尾頁|尾页|more|\d+$").unwrap());
static NEXT_PAGE_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)下一頁|下一页|next").unwrap());

/// 分析页面的分页信息
pub fn analyze_pagination(body: &str) -> PaginationInfo {
    let doc = Html::parse_document(body);

    let mut info = PaginationInfo::default();
    let container = CONTAINER_SELECTORS
        .iter()
        .find_map(|(raw, selector)| doc.select(selector).next().map(|el| (*raw, el)));
    if let Some((raw, _)) = container {
        debug!("找到分页容器: {}", raw);
        info.pagination_selector = Some(raw.to_string());
    }

    // 1. 链接中的页码参数
    let mut max_page = 1u32;
    for link in doc.select(&LINK_WITH_HREF) {
        let href = link.value().attr("href").unwrap_or("");
        for caps in PAGE_PARAM.captures_iter(href) {
            if let Ok(n) = caps[2].parse::<u32>() {
                if n > max_page {
                    max_page = n;
                    info.page_param = caps[1].to_string();
                }
            }
        }
    }

    // 2. 分页容器文字
    if let Some((_, element)) = container {
        let text: String = element.text().collect();
        for pattern in TEXT_TOTALS.iter() {
            for caps in pattern.captures_iter(&text) {
                for n in caps.iter().skip(1).flatten() {
                    if let Ok(n) = n.as_str().parse::<u32>() {
                        max_page = max_page.max(n);
                    }
                }
            }
        }
    }

    // 3. "最后一页" 类链接
    let mut has_next = false;
    for anchor in doc.select(&ANCHOR) {
        let text: String = anchor.text().collect();
        let text = text.trim();
        if LAST_PAGE_HINT.is_match(text) && !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(n) = text.parse::<u32>() {
                max_page = max_page.max(n);
            }
        }
        if NEXT_PAGE_HINT.is_match(text) {
            has_next = true;
        }
    }

    // 4. 只有 "下一页"
    if max_page == 1 && has_next {
        max_page = 2;
    }

    info.total_pages = max_page.max(1);
    info.current_page = current_page(&doc);
    info.base_url = base_url(&doc);

    info!(
        "分页信息: 共 {} 页, 当前第 {} 页, 参数 '{}'",
        info.total_pages, info.current_page, info.page_param
    );
    info
}

fn canonical_href(doc: &Html) -> Option<String> {
    doc.select(&CANONICAL)
        .filter_map(|el| el.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .map(str::to_string)
}

fn og_url(doc: &Html) -> Option<String> {
    doc.select(&OG_URL)
        .filter_map(|el| el.value().attr("content"))
        .map(str::trim)
        .find(|content| !content.is_empty())
        .map(str::to_string)
}

fn current_page(doc: &Html) -> u32 {
    let from_url = [canonical_href(doc), og_url(doc)]
        .into_iter()
        .flatten()
        .find_map(|url| {
            PAGE_PARAM
                .captures(&url)
                .and_then(|caps| caps[2].parse::<u32>().ok())
        });
    if let Some(page) = from_url {
        return page.max(1);
    }

    for selector in CURRENT_SELECTORS.iter() {
        if let Some(el) = doc.select(selector).next() {
            let text: String = el.text().collect();
            if let Ok(page) = text.trim().parse::<u32>() {
                return page.max(1);
            }
        }
    }
    1
}

fn base_url(doc: &Html) -> String {
    canonical_href(doc)
        .or_else(|| og_url(doc))
        .or_else(|| {
            doc.select(&LINK_WITH_HREF)
                .filter_map(|el| el.value().attr("href"))
                .next()
                .map(str::to_string)
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highest_pg_link_sets_total() {
        let info = analyze_pagination(
            r#"<body><a href="list.aspx?pg=2&spid=X">2</a><a href="list.aspx?pg=5&spid=X">5</a></body>"#,
        );
        assert_eq!(info.total_pages, 5);
        assert_eq!(info.page_param, "pg");
        assert_eq!(info.base_url, "list.aspx?pg=2&spid=X");
    }

    #[test]
    fn test_single_pg_link() {
        let info = analyze_pagination(r#"<a href="list.aspx?pg=5">末</a>"#);
        assert_eq!(info.total_pages, 5);
    }

    #[test]
    fn test_container_text_total() {
        let info = analyze_pagination(r#"<div class="pagination">共 3 頁</div>"#);
        assert_eq!(info.total_pages, 3);
        assert_eq!(info.pagination_selector.as_deref(), Some(".pagination"));
    }

    #[test]
    fn test_page_x_of_y_and_page_param_name() {
        let info = analyze_pagination(
            r#"<div class="pager">Page 1 of 4</div><a href="/list?page=3">3</a>"#,
        );
        assert_eq!(info.total_pages, 4);
        assert_eq!(info.page_param, "page");
    }

    #[test]
    fn test_next_only_means_two_pages() {
        let info = analyze_pagination(r#"<a href="javascript:void(0)">下一頁</a>"#);
        assert_eq!(info.total_pages, 2);
    }

    #[test]
    fn test_no_signals_defaults_to_single_page() {
        let info = analyze_pagination("<p>nothing here</p>");
        assert_eq!(info, PaginationInfo::default());
    }

    #[test]
    fn test_current_page_sources() {
        let info = analyze_pagination(
            r#"<head><link rel="canonical" href="https://site/x.aspx?pg=3&spid=A"></head>"#,
        );
        assert_eq!(info.current_page, 3);
        assert_eq!(info.base_url, "https://site/x.aspx?pg=3&spid=A");

        let info = analyze_pagination(r#"<ul><li class="active">4</li></ul>"#);
        assert_eq!(info.current_page, 4);
    }
}
