use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// 列表页上的一条记录
///
/// 空字符串与缺失等价；`title` 为空的记录视为无效，在去重之前就被丢弃。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRecord {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// 链接查询参数中的站内标识
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nid: Option<String>,
    /// 内容哈希，`nid` 缺失时作为页内标识
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl ListRecord {
    /// 标题去空白后非空
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// 是否至少有一个非空字段
    pub fn has_any_field(&self) -> bool {
        !self.title.is_empty()
            || [&self.link, &self.date, &self.nid]
                .iter()
                .any(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
    }

    /// 原始记录内容的 SHA-256
    pub fn content_hash(&self) -> String {
        let normalized = format!(
            "{}|{}|{}",
            self.title,
            self.link.as_deref().unwrap_or(""),
            self.date.as_deref().unwrap_or("")
        );
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// 填充 `hash` 字段
    pub fn with_content_hash(mut self) -> Self {
        self.hash = Some(self.content_hash());
        self
    }

    /// 跨运行去重键：(标题, 日期)
    pub fn cross_run_key(&self) -> CrossRunKey {
        CrossRunKey::new(&self.title, self.date.as_deref())
    }
}

/// 跨运行去重键
///
/// 标题去掉首尾空白后精确匹配；标点差异会被当作不同活动。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrossRunKey {
    pub title: String,
    pub date: String,
}

impl CrossRunKey {
    pub fn new(title: &str, date: Option<&str>) -> Self {
        Self {
            title: title.trim().to_string(),
            date: date.unwrap_or("").to_string(),
        }
    }
}

/// 详情页补充后的记录，最终写入记录文件
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailRecord {
    pub title: String,
    pub link: Option<String>,
    /// 列表页上的日期，跨运行去重键的一部分
    pub date: Option<String>,
    pub organizer: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub fetched_at: String,
}

impl DetailRecord {
    /// 以列表记录为基础创建，起讫日期先沿用列表日期
    pub fn from_list(item: &ListRecord, fetched_at: impl Into<String>) -> Self {
        Self {
            title: item.title.trim().to_string(),
            link: item.link.clone(),
            date: item.date.clone(),
            organizer: None,
            location: None,
            start_date: item.date.clone(),
            end_date: item.date.clone(),
            fetched_at: fetched_at.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty()
    }

    pub fn cross_run_key(&self) -> CrossRunKey {
        CrossRunKey::new(&self.title, self.date.as_deref())
    }
}

/// 记录文件的列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Title,
    Organizer,
    Location,
    StartDate,
    EndDate,
    FetchedAt,
    ListDate,
    Link,
}

impl Column {
    /// 默认列顺序
    pub const DEFAULT_ORDER: [Column; 8] = [
        Column::Title,
        Column::Organizer,
        Column::Location,
        Column::StartDate,
        Column::EndDate,
        Column::FetchedAt,
        Column::ListDate,
        Column::Link,
    ];

    /// 表头名称
    pub fn header(self) -> &'static str {
        match self {
            Column::Title => "活動名稱",
            Column::Organizer => "主辦單位",
            Column::Location => "地點",
            Column::StartDate => "起日",
            Column::EndDate => "迄日",
            Column::FetchedAt => "抓取時間",
            Column::ListDate => "發布日期",
            Column::Link => "連結",
        }
    }

    /// 从表头解析列
    pub fn from_header(header: &str) -> Option<Self> {
        Self::DEFAULT_ORDER
            .into_iter()
            .find(|c| c.header() == header.trim())
    }

    /// 读取记录中该列的值
    pub fn get(self, record: &DetailRecord) -> Option<&str> {
        match self {
            Column::Title => Some(record.title.as_str()),
            Column::Organizer => record.organizer.as_deref(),
            Column::Location => record.location.as_deref(),
            Column::StartDate => record.start_date.as_deref(),
            Column::EndDate => record.end_date.as_deref(),
            Column::FetchedAt => Some(record.fetched_at.as_str()),
            Column::ListDate => record.date.as_deref(),
            Column::Link => record.link.as_deref(),
        }
    }

    /// 写入记录中该列的值
    pub fn set(self, record: &mut DetailRecord, value: Option<String>) {
        match self {
            Column::Title => record.title = value.unwrap_or_default(),
            Column::Organizer => record.organizer = value,
            Column::Location => record.location = value,
            Column::StartDate => record.start_date = value,
            Column::EndDate => record.end_date = value,
            Column::FetchedAt => record.fetched_at = value.unwrap_or_default(),
            Column::ListDate => record.date = value,
            Column::Link => record.link = value,
        }
    }
}
