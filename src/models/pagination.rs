/// 分页分析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationInfo {
    /// 总页数，至少为 1
    pub total_pages: u32,
    /// 当前页码，至少为 1
    pub current_page: u32,
    /// 携带页码的查询参数名
    pub page_param: String,
    /// 规范化后的基础 URL，可能为空
    pub base_url: String,
    /// 命中的分页容器选择器
    pub pagination_selector: Option<String>,
}

impl Default for PaginationInfo {
    fn default() -> Self {
        Self {
            total_pages: 1,
            current_page: 1,
            page_param: "pg".to_string(),
            base_url: String::new(),
            pagination_selector: None,
        }
    }
}
