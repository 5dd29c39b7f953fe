//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责站点调度和流水线编排，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量站点处理器
//! - 管理应用生命周期（初始化、运行）
//! - 控制并发数量（Semaphore）
//! - 持有共享的 HTTP 抓取器
//! - 输出全局统计信息
//!
//! ### `site_processor` - 单个站点处理器
//! - robots.txt 检查与记录文件路径限制
//! - 列表 → 新数据检测 → 详情 → 过滤 → 保存
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<SiteConfig>)
//!     ↓
//! site_processor (处理单个站点)
//!     ↓
//! workflow::{ListingFlow, DetailFlow}
//!     ↓
//! services (能力层：字段探测 / 行提取 / 分页 / 去重 / 详情解析)
//!     ↓
//! infrastructure (基础设施：PageFetcher / RecordStore)
//! ```

pub mod batch_processor;
pub mod site_processor;

// 重新导出主要类型
pub use batch_processor::{App, RunSummary};
pub use site_processor::{process_site, run_pipeline};
