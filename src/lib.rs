//! # Listing Monitor
//!
//! 监控分页列表网页、只把新出现的记录写入表格文件的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（HTTP 连接池、记录文件），只暴露能力
//! - `PageFetcher` / `HttpPageFetcher` - 按 URL 取回 HTML，带重试与礼貌延迟
//! - `RecordStore` / `JsonTableStore` - 读取、合并保存、统计
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 纯函数，不做 I/O
//! - 字段探测、行提取、分页分析、分页 URL 生成
//! - 跨页去重、新数据检测、详情页解析、主办单位过滤、robots.txt 规则
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个站点的列表"与"一条新记录的详情"的处理流程
//! - `SiteCtx` - 上下文封装（站点名 + 序号）
//! - `ListingFlow` / `DetailFlow`
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 多站点并行，管理资源和并发
//! - `orchestrator/site_processor` - 单个站点的完整流水线

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, PipelineSettings};
pub use error::{AppError, AppResult, ConfigError, FetchError, StoreError};
pub use infrastructure::{HttpPageFetcher, JsonTableStore, PageFetcher, RecordStore};
pub use models::{Column, DetailRecord, ListRecord, PaginationInfo, SiteConfig};
pub use orchestrator::{process_site, App, RunSummary};
pub use workflow::{DetailFlow, ListingFlow, SiteCtx};
