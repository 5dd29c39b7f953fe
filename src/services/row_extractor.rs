/// 列表行提取
///
/// 两种模式：
/// - 表格模式：只处理 `<tr>`，第一格取标题/链接/nid，日期取隐藏 span 或第二格
/// - 一般模式：用第一个容器探测字段，再对所有容器套用同一组选择器
use crate::models::ListRecord;
use crate::services::field_detector::{
    detect_fields, stripped_text, DetectedFields, Field, FieldPatternTable, FieldSelector,
    STANDARD_PATTERNS,
};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td, th").unwrap());
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static HIDDEN_SPAN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"span[class*="hidden"]"#).unwrap());

static TABLE_NID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"nid=([A-Fa-f0-9]+)").unwrap());
static LINK_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bn?id=([A-Fa-f0-9]+)").unwrap());
static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap());
static LEADING_ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap());

const TABLE_TAGS: [&str; 5] = ["tbody", "table", "tr", "td", "th"];
const TEXT_CAP: usize = 100;

/// 行提取器
pub struct RowExtractor {
    max_items: usize,
    table_mode: bool,
    patterns: &'static FieldPatternTable,
}

impl RowExtractor {
    /// `table_mode` 为显式开关；关闭时仍会根据选择器自动判断
    pub fn new(max_items: usize, table_mode: bool) -> Self {
        Self {
            max_items,
            table_mode,
            patterns: &STANDARD_PATTERNS,
        }
    }

    /// 显式开关或选择器中的类型选择器包含表格标签
    pub fn is_table_mode(&self, container_selector: &str) -> bool {
        self.table_mode || selector_has_table_tag(container_selector)
    }

    /// 从页面中提取记录
    ///
    /// 返回的每条记录都有非空标题和内容哈希，数量不超过 `max_items`。
    pub fn extract(&self, body: &str, container_selector: &str) -> Vec<ListRecord> {
        let selector = match Selector::parse(container_selector) {
            Ok(s) => s,
            Err(e) => {
                warn!("容器选择器 '{}' 无法解析: {}", container_selector, e);
                return Vec::new();
            }
        };

        let doc = Html::parse_document(body);
        let containers: Vec<ElementRef> = doc.select(&selector).collect();
        if containers.is_empty() {
            warn!("容器选择器 '{}' 未找到元素", container_selector);
            return Vec::new();
        }

        let table_mode = self.is_table_mode(container_selector);
        info!(
            "使用{}: {} (找到 {} 个容器)",
            if table_mode { "表格模式" } else { "一般模式" },
            container_selector,
            containers.len()
        );

        let records = if table_mode {
            containers.iter().filter_map(extract_table_row).collect()
        } else {
            self.extract_general(&containers)
        };

        let mut valid: Vec<ListRecord> = records
            .into_iter()
            .filter(ListRecord::is_valid)
            .map(ListRecord::with_content_hash)
            .collect();
        valid.truncate(self.max_items);

        debug!("提取统计: {}", ExtractionStats::from_records(&valid));
        valid
    }

    fn extract_general(&self, containers: &[ElementRef<'_>]) -> Vec<ListRecord> {
        let Some(sample) = containers.first() else {
            return Vec::new();
        };
        let detected = detect_fields(sample, self.patterns);
        info!("自动探测字段: {}", detected);

        containers
            .iter()
            .filter_map(|c| extract_general_row(c, &detected))
            .collect()
    }
}

/// 把选择器拆成复合选择器，取每段开头的类型名
fn selector_has_table_tag(selector: &str) -> bool {
    selector
        .split(|c: char| c.is_whitespace() || matches!(c, '>' | '+' | '~' | ','))
        .map(|compound| {
            compound
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
                .collect::<String>()
                .to_ascii_lowercase()
        })
        .any(|name| TABLE_TAGS.contains(&name.as_str()))
}

fn extract_table_row(row: &ElementRef<'_>) -> Option<ListRecord> {
    if row.value().name() != "tr" {
        return None;
    }

    let cells: Vec<ElementRef> = row.select(&CELL).collect();
    let first = cells.first()?;
    let mut record = ListRecord::default();

    if let Some(anchor) = first.select(&ANCHOR).next() {
        record.title = stripped_text(&anchor);
        let href = anchor.value().attr("href").unwrap_or("").trim();
        if !href.is_empty() {
            record.nid = TABLE_NID.captures(href).map(|c| c[1].to_string());
            record.link = Some(href.to_string());
        }
    }

    if let Some(span) = first.select(&HIDDEN_SPAN).next() {
        let text = stripped_text(&span).replace(',', "");
        record.date = ISO_DATE.find(&text).map(|m| m.as_str().to_string());
    }

    if record.date.is_none() {
        if let Some(second) = cells.get(1) {
            let text = stripped_text(second);
            record.date = LEADING_ISO_DATE.find(&text).map(|m| m.as_str().to_string());
        }
    }

    if record.title.is_empty() {
        return None;
    }
    debug!("表格行: {}", truncate_chars(&record.title, 50));
    Some(record)
}

fn extract_general_row(container: &ElementRef<'_>, detected: &DetectedFields) -> Option<ListRecord> {
    let mut record = ListRecord::default();

    for (field, selector) in detected.entries() {
        match selector {
            FieldSelector::Wildcard => {
                record.title = truncate_chars(&stripped_text(container), TEXT_CAP);
            }
            FieldSelector::Css { selector, .. } => {
                let Some(element) = container.select(selector).next() else {
                    continue;
                };
                match field {
                    Field::Link => {
                        let href = element.value().attr("href").unwrap_or("").trim();
                        if !href.is_empty() {
                            record.nid = LINK_ID.captures(href).map(|c| c[1].to_string());
                            record.link = Some(href.to_string());
                        }
                    }
                    Field::Date => {
                        let text = stripped_text(&element);
                        record.date = ISO_DATE.find(&text).map(|m| m.as_str().to_string());
                    }
                    Field::Title => {
                        record.title = truncate_chars(&stripped_text(&element), TEXT_CAP);
                    }
                }
            }
        }
    }

    if !record.has_any_field() {
        record.title = truncate_chars(&stripped_text(container), TEXT_CAP);
    }

    if record.title.is_empty() {
        None
    } else {
        Some(record)
    }
}

/// 截断后去掉末尾空白，保证与存储后的标题一致
fn truncate_chars(text: &str, max: usize) -> String {
    let truncated: String = text.chars().take(max).collect();
    truncated.trim_end().to_string()
}

/// 提取统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionStats {
    pub total: usize,
    /// 各字段非空计数
    pub field_counts: HashMap<&'static str, usize>,
    /// 不同 (标题, 日期) 的数量
    pub unique_items: usize,
    pub avg_fields_per_item: f64,
}

impl ExtractionStats {
    pub fn from_records(records: &[ListRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let mut field_counts: HashMap<&'static str, usize> = HashMap::new();
        for record in records {
            let fields = [
                ("title", !record.title.is_empty()),
                ("link", record.link.is_some()),
                ("date", record.date.is_some()),
                ("nid", record.nid.is_some()),
            ];
            for (name, present) in fields {
                if present {
                    *field_counts.entry(name).or_default() += 1;
                }
            }
        }

        let unique_items = records
            .iter()
            .map(ListRecord::cross_run_key)
            .collect::<HashSet<_>>()
            .len();
        let populated: usize = field_counts.values().sum();

        Self {
            total: records.len(),
            field_counts,
            unique_items,
            avg_fields_per_item: populated as f64 / records.len() as f64,
        }
    }
}

impl fmt::Display for ExtractionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<_> = self.field_counts.iter().collect();
        counts.sort();
        write!(
            f,
            "共 {} 条, 不重复 {} 条, 平均字段 {:.1}, 字段计数 {:?}",
            self.total, self.unique_items, self.avg_fields_per_item, counts
        )
    }
}
