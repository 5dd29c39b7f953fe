/// 字段探测
///
/// 在一个样本容器内，按固定优先级（标题、链接、日期）为每个字段找到第一个
/// 通过校验的选择器。探测结果对整页所有容器复用。
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::fmt;
use std::sync::LazyLock;

static DATE_YMD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}[/-]\d{1,2}[/-]\d{1,2}").unwrap());
static DATE_DMY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}[/-]\d{1,2}[/-]\d{4}").unwrap());

/// 内置字段规则表，进程内只构建一次
pub static STANDARD_PATTERNS: LazyLock<FieldPatternTable> =
    LazyLock::new(FieldPatternTable::standard);

/// 可探测的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Link,
    Date,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Link => "link",
            Field::Date => "date",
        }
    }
}

/// 元素校验器
///
/// 新的站点差异通过新增规则表条目来适配，而不是修改探测流程。
pub trait ElementValidator: Send + Sync {
    /// `text` 为元素去空白后的文本
    fn validate(&self, element: &ElementRef<'_>, text: &str) -> bool;
}

/// 文本长度超过给定字符数
pub struct LongerThan(pub usize);

impl ElementValidator for LongerThan {
    fn validate(&self, _element: &ElementRef<'_>, text: &str) -> bool {
        text.chars().count() > self.0
    }
}

/// `<a>` 元素且 `href` 非空
pub struct AnchorWithHref;

impl ElementValidator for AnchorWithHref {
    fn validate(&self, element: &ElementRef<'_>, _text: &str) -> bool {
        element.value().name() == "a"
            && element
                .value()
                .attr("href")
                .is_some_and(|href| !href.trim().is_empty())
    }
}

/// 文本中含有日期
pub struct ContainsDate;

impl ElementValidator for ContainsDate {
    fn validate(&self, _element: &ElementRef<'_>, text: &str) -> bool {
        DATE_YMD.is_match(text) || DATE_DMY.is_match(text)
    }
}

/// 单个字段的候选选择器组与校验器
pub struct FieldPattern {
    pub field: Field,
    pub selector_groups: Vec<Vec<(String, Selector)>>,
    pub validator: Box<dyn ElementValidator>,
}

impl FieldPattern {
    /// 非法选择器直接跳过
    pub fn new(field: Field, groups: &[&[&str]], validator: Box<dyn ElementValidator>) -> Self {
        let selector_groups = groups
            .iter()
            .map(|group| {
                group
                    .iter()
                    .filter_map(|raw| {
                        Selector::parse(raw)
                            .ok()
                            .map(|selector| (raw.to_string(), selector))
                    })
                    .collect()
            })
            .collect();
        Self {
            field,
            selector_groups,
            validator,
        }
    }
}

/// 有序的字段规则表，顺序即探测优先级
pub struct FieldPatternTable {
    patterns: Vec<FieldPattern>,
}

impl FieldPatternTable {
    pub fn new(patterns: Vec<FieldPattern>) -> Self {
        Self { patterns }
    }

    /// 内置规则：标题、链接、日期
    pub fn standard() -> Self {
        Self::new(vec![
            FieldPattern::new(
                Field::Title,
                &[
                    &["h1", "h2", "h3", "h4", "h5"],
                    &[
                        ".title",
                        ".headline",
                        ".name",
                        "[class*=\"title\"]",
                        "[class*=\"head\"]",
                        "[class*=\"news\"]",
                    ],
                    &["a", "strong", "[id*=\"title\"]", "[id*=\"news\"]"],
                ],
                Box::new(LongerThan(5)),
            ),
            FieldPattern::new(
                Field::Link,
                &[&["a[href]", "a", "[href]"]],
                Box::new(AnchorWithHref),
            ),
            FieldPattern::new(
                Field::Date,
                &[&[
                    "time",
                    ".date",
                    ".published",
                    ".time",
                    "[class*=\"date\"]",
                    "[class*=\"time\"]",
                    "[class*=\"publish\"]",
                ]],
                Box::new(ContainsDate),
            ),
        ])
    }

    pub fn patterns(&self) -> &[FieldPattern] {
        &self.patterns
    }
}

/// 字段对应的选择器
#[derive(Debug, Clone)]
pub enum FieldSelector {
    /// 整个容器
    Wildcard,
    Css { raw: String, selector: Selector },
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSelector::Wildcard => write!(f, "*"),
            FieldSelector::Css { raw, .. } => write!(f, "{}", raw),
        }
    }
}

/// 探测结果，按探测顺序排列
#[derive(Debug, Clone)]
pub struct DetectedFields {
    entries: Vec<(Field, FieldSelector)>,
}

impl DetectedFields {
    pub fn wildcard() -> Self {
        Self {
            entries: vec![(Field::Title, FieldSelector::Wildcard)],
        }
    }

    pub fn entries(&self) -> &[(Field, FieldSelector)] {
        &self.entries
    }

    pub fn get(&self, field: Field) -> Option<&FieldSelector> {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, s)| s)
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.entries.as_slice(), [(Field::Title, FieldSelector::Wildcard)])
    }
}

impl fmt::Display for DetectedFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .entries
            .iter()
            .map(|(field, selector)| format!("{}: {}", field.name(), selector))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

/// 元素去空白后的文本（各文本节点分别去空白后拼接）
pub fn stripped_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// 在样本容器中探测字段
pub fn detect_fields(container: &ElementRef<'_>, table: &FieldPatternTable) -> DetectedFields {
    let mut entries = Vec::new();

    for pattern in table.patterns() {
        if let Some(selector) = detect_one(container, pattern) {
            entries.push((pattern.field, selector));
        }
    }

    if entries.is_empty() {
        DetectedFields::wildcard()
    } else {
        DetectedFields { entries }
    }
}

fn detect_one(container: &ElementRef<'_>, pattern: &FieldPattern) -> Option<FieldSelector> {
    for group in &pattern.selector_groups {
        for (raw, selector) in group {
            for element in container.select(selector) {
                let text = stripped_text(&element);
                if text.chars().count() >= 2 && pattern.validator.validate(&element, &text) {
                    return Some(FieldSelector::Css {
                        raw: raw.clone(),
                        selector: selector.clone(),
                    });
                }
            }
        }
    }
    None
}
