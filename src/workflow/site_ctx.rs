//! 站点处理上下文
//!
//! 封装"我正在处理第几个站点、叫什么"这一信息

use std::fmt::Display;

/// 站点处理上下文
#[derive(Debug, Clone)]
pub struct SiteCtx {
    /// 站点名称
    pub site_name: String,

    /// 站点序号（从1开始，仅用于日志显示）
    pub site_index: usize,
}

impl SiteCtx {
    pub fn new(site_name: impl Into<String>, site_index: usize) -> Self {
        Self {
            site_name: site_name.into(),
            site_index,
        }
    }
}

impl Display for SiteCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[站点 {}#{}]", self.site_name, self.site_index)
    }
}
