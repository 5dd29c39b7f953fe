/// 详情页解析
///
/// 在详情容器中找时间、地点、主办单位三个段落。时间先按区间解析（`~`、`-`、`至`），
/// 否则在文字中模糊查找单个日期；都失败时保留列表页日期。
use crate::models::{DetailRecord, ListRecord};
use crate::services::field_detector::stripped_text;
use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, warn};

static DETAIL_CONTAINER: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"div.clsDtlDes, [class*="DtlDes"]"#).unwrap());
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
static DATE_PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p#DtlDt").unwrap());

static TIME_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^時\s*間\s*：").unwrap());
static TIME_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"時\s*間\s*：|(?i:time\s*:)").unwrap());
static LOCATION_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^地\s*點\s*：").unwrap());
static LOCATION_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)地\s*點\s*：?|Location\s*:|Venue\s*:").unwrap());
static ORGANIZER_LABEL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^主辦單位\s*：").unwrap());
static ORGANIZER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)主辦單位\s*：?|Organizer\s*:").unwrap());

static DATE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4}[/-]\d{1,2}[/-]\d{1,2})\s*[-~～至]\s*(\d{4}[/-]\d{1,2}[/-]\d{1,2})").unwrap()
});
static YMD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})[/.-](\d{1,2})[/.-](\d{1,2})").unwrap());
static YMD_CJK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日?").unwrap());
static MDY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})").unwrap());

/// 解析详情页，补充主办单位、地点与起讫日期
///
/// 标题取自列表记录；标题为空时返回 `None`。
pub fn extract_detail(body: &str, item: &ListRecord, fetched_at: &str) -> Option<DetailRecord> {
    let mut record = DetailRecord::from_list(item, fetched_at);
    if !record.is_valid() {
        warn!("无效条目（缺少活动名称）: {:?}", item.link);
        return None;
    }

    let doc = Html::parse_document(body);
    let container = doc.select(&DETAIL_CONTAINER).next();
    if container.is_none() {
        debug!("未找到详情容器，解析整个页面");
    }
    let root = container.unwrap_or_else(|| doc.root_element());

    let time_text = find_labeled(&root, &TIME_LABEL)
        .or_else(|| doc.select(&DATE_PARAGRAPH).next().map(|p| stripped_text(&p)));
    if let Some(text) = time_text {
        let text = TIME_PREFIX.replace_all(&text, "").trim().to_string();
        match parse_date_range(&text) {
            Some((start, end)) => {
                record.start_date = Some(start);
                record.end_date = Some(end);
                debug!("时间: 起日={:?}, 迄日={:?}", record.start_date, record.end_date);
            }
            None => warn!("无法从 '{}' 提取日期，保留列表日期", text),
        }
    }

    record.location = find_labeled(&root, &LOCATION_LABEL)
        .map(|text| LOCATION_PREFIX.replace_all(&text, "").trim().to_string())
        .filter(|s| !s.is_empty());
    record.organizer = find_labeled(&root, &ORGANIZER_LABEL)
        .map(|text| ORGANIZER_PREFIX.replace_all(&text, "").trim().to_string())
        .filter(|s| !s.is_empty());

    Some(record)
}

/// 第一个文字匹配标签的段落
fn find_labeled(root: &ElementRef<'_>, label: &Regex) -> Option<String> {
    root.select(&PARAGRAPH)
        .map(|p| stripped_text(&p))
        .find(|text| label.is_match(text))
}

/// 解析日期区间；没有区间时退化为单个日期（起讫相同）
pub fn parse_date_range(text: &str) -> Option<(String, String)> {
    if let Some(caps) = DATE_RANGE.captures(text) {
        let start = parse_date(&caps[1]);
        let end = parse_date(&caps[2]);
        if let (Some(start), Some(end)) = (start, end) {
            return Some((format_date(start), format_date(end)));
        }
    }

    let single = fuzzy_date(text)?;
    let date = format_date(single);
    Some((date.clone(), date))
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    YMD.captures(text).and_then(|c| date_from(&c, 1, 2, 3))
}

/// 在周围文字中查找单个日期：年-月-日、年月日、月/日/年
fn fuzzy_date(text: &str) -> Option<NaiveDate> {
    parse_date(text)
        .or_else(|| YMD_CJK.captures(text).and_then(|c| date_from(&c, 1, 2, 3)))
        .or_else(|| MDY.captures(text).and_then(|c| date_from(&c, 3, 1, 2)))
}

fn date_from(caps: &regex::Captures<'_>, y: usize, m: usize, d: usize) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(
        caps[y].parse().ok()?,
        caps[m].parse().ok()?,
        caps[d].parse().ok()?,
    )
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(date: Option<&str>) -> ListRecord {
        ListRecord {
            title: "Event X".into(),
            link: Some("detail.aspx?nid=AB12".into()),
            date: date.map(str::to_string),
            nid: Some("AB12".into()),
            hash: None,
        }
    }

    #[test]
    fn test_date_range_example() {
        assert_eq!(
            parse_date_range("2024/06/01 ~ 2024/06/03"),
            Some(("2024-06-01".to_string(), "2024-06-03".to_string()))
        );
        assert_eq!(
            parse_date_range("2024-6-1至2024-6-3"),
            Some(("2024-06-01".to_string(), "2024-06-03".to_string()))
        );
    }

    #[test]
    fn test_fuzzy_single_date() {
        let single = |s: &str| parse_date_range(s).map(|(a, _)| a);
        assert_eq!(single("2024年6月5日(三) 14:00"), Some("2024-06-05".into()));
        assert_eq!(single("週三 2024/06/05 下午"), Some("2024-06-05".into()));
        assert_eq!(single("on 6/5/2024"), Some("2024-06-05".into()));
        assert_eq!(single("待定"), None);
    }

    #[test]
    fn test_full_detail_page() {
        let html = r#"<div class="clsDtlDes">
            <p>時間：2024/06/01 ~ 2024/06/03</p>
            <p>地點：<span>I501</span></p>
            <p>主辦單位：教師教學發展中心</p>
        </div>"#;
        let record = extract_detail(html, &item(Some("2024-05-01")), "2024-05-20 08:00:00").unwrap();

        assert_eq!(record.title, "Event X");
        assert_eq!(record.date.as_deref(), Some("2024-05-01"));
        assert_eq!(record.start_date.as_deref(), Some("2024-06-01"));
        assert_eq!(record.end_date.as_deref(), Some("2024-06-03"));
        assert_eq!(record.location.as_deref(), Some("I501"));
        assert_eq!(record.organizer.as_deref(), Some("教師教學發展中心"));
        assert_eq!(record.fetched_at, "2024-05-20 08:00:00");
    }

    #[test]
    fn test_unparseable_time_keeps_listing_date() {
        let html = r#"<p id="DtlDt">時間：另行通知</p>"#;
        let record = extract_detail(html, &item(Some("2024-05-01")), "t").unwrap();
        assert_eq!(record.start_date.as_deref(), Some("2024-05-01"));
        assert_eq!(record.end_date.as_deref(), Some("2024-05-01"));
        assert!(record.location.is_none());
    }

    #[test]
    fn test_blank_title_abandons_item() {
        let mut blank = item(None);
        blank.title = "  ".into();
        assert!(extract_detail("<p>時間：2024/06/01</p>", &blank, "t").is_none());
    }
}
