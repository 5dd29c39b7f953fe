use serde::Deserialize;

/// 单个站点的监控配置
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub url: String,
    /// 每条记录对应的容器选择器
    pub container_selector: String,
    /// 记录文件名（只取文件名部分，落在数据目录下）
    pub store_file: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub table_mode: bool,
    #[serde(default = "default_true")]
    pub auto_pagination: bool,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default)]
    pub pagination: Option<PaginationOverride>,
    /// 主办单位白名单，设置后覆盖内置名单并对本站点生效
    #[serde(default)]
    pub organizer_allow_list: Option<Vec<String>>,
}

/// 站点级分页覆盖
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationOverride {
    #[serde(default)]
    pub page_param: Option<String>,
    #[serde(default)]
    pub first_page: FirstPagePolicy,
}

/// 第 1 页是否携带页码参数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirstPagePolicy {
    /// 第 1 页只保留 spid
    #[default]
    Omit,
    /// 第 1 页显式带上 `{page_param}=1`
    Explicit,
}

/// 站点配置文件
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorFile {
    #[serde(default)]
    pub sites: Vec<SiteConfig>,
    #[serde(default)]
    pub settings: Option<FileSettings>,
    #[serde(default)]
    pub headers: Option<FileHeaders>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileSettings {
    pub max_concurrent_sites: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileHeaders {
    #[serde(alias = "User-Agent")]
    pub user_agent: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_max_pages() -> u32 {
    10
}

fn default_max_items() -> usize {
    100
}

impl SiteConfig {
    /// 用于测试与示例的最小配置
    pub fn new(name: &str, url: &str, container_selector: &str, store_file: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            container_selector: container_selector.to_string(),
            store_file: store_file.to_string(),
            enabled: true,
            table_mode: false,
            auto_pagination: true,
            max_pages: default_max_pages(),
            max_items: default_max_items(),
            pagination: None,
            organizer_allow_list: None,
        }
    }

    pub fn page_param_override(&self) -> Option<&str> {
        self.pagination.as_ref().and_then(|p| p.page_param.as_deref())
    }

    pub fn first_page_policy(&self) -> FirstPagePolicy {
        self.pagination
            .as_ref()
            .map(|p| p.first_page)
            .unwrap_or_default()
    }
}
