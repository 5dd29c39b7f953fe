//! 批量站点处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责所有站点的并行处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：加载站点配置、应用文件中的覆盖项、创建共享抓取器
//! 2. **并发控制**：使用 Semaphore 限制同时处理的站点数量
//! 3. **故障隔离**：单个站点失败只让该站点结果为空
//! 4. **全局统计**：所有任务结束后汇总结果
//!
//! ## 设计特点
//!
//! - **资源所有者**：唯一持有 HTTP 连接池（`Arc` 共享给各站点任务）
//! - **向下委托**：委托 site_processor 处理单个站点

use crate::config::Config;
use crate::infrastructure::{HttpPageFetcher, PageFetcher};
use crate::models::{load_monitor_file, DetailRecord, SiteConfig};
use crate::orchestrator::site_processor;
use crate::utils::logging::{log_sites_loaded, log_startup, print_final_stats};
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    sites: Vec<SiteConfig>,
    fetcher: Arc<dyn PageFetcher>,
}

/// 一次运行的汇总结果
#[derive(Debug, Default)]
pub struct RunSummary {
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    /// 本次新增并已保存的记录
    pub new_records: Vec<DetailRecord>,
}

impl App {
    /// 初始化应用
    ///
    /// 站点文件中的 `[settings]` / `[headers]` 覆盖环境变量中的同名配置。
    pub async fn initialize(mut config: Config) -> Result<Self> {
        let file = load_monitor_file(&config.sites_config)
            .await
            .context("站点配置加载失败")?;

        if let Some(max) = file.settings.as_ref().and_then(|s| s.max_concurrent_sites) {
            config.max_concurrent_sites = max;
        }
        match file.headers.as_ref().and_then(|h| h.user_agent.clone()) {
            Some(user_agent) => config.user_agent = user_agent,
            None => info!("配置文件中没有 User-Agent，使用: {}", config.user_agent),
        }

        tokio::fs::create_dir_all(&config.data_dir)
            .await
            .with_context(|| format!("无法创建数据目录: {}", config.data_dir.display()))?;

        let fetcher = Arc::new(HttpPageFetcher::new(&config)?);
        Ok(Self::with_fetcher(config, file.sites, fetcher))
    }

    /// 使用给定的抓取器创建应用
    pub fn with_fetcher(config: Config, sites: Vec<SiteConfig>, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self {
            config,
            sites,
            fetcher,
        }
    }

    /// 运行一轮监控
    pub async fn run(&self) -> Result<RunSummary> {
        let max_concurrent = self.config.max_concurrent_sites.max(1);
        log_startup(max_concurrent, &self.config.data_dir);

        let enabled: Vec<SiteConfig> = self.sites.iter().filter(|s| s.enabled).cloned().collect();
        log_sites_loaded(enabled.len(), self.sites.len(), max_concurrent);

        if enabled.is_empty() {
            warn!("⚠️ 没有任何启用的站点，程序结束");
            return Ok(RunSummary::default());
        }

        let summary = self.process_all_sites(enabled, max_concurrent).await?;

        print_final_stats(
            summary.success,
            summary.failed,
            summary.total,
            summary.new_records.len(),
            &self.config.output_log_file,
        );
        Ok(summary)
    }

    /// 并行处理所有站点
    async fn process_all_sites(&self, sites: Vec<SiteConfig>, max_concurrent: usize) -> Result<RunSummary> {
        let semaphore = Arc::new(Semaphore::new(max_concurrent));
        let settings = self.config.pipeline_settings();
        let mut handles = Vec::with_capacity(sites.len());

        for (idx, site) in sites.into_iter().enumerate() {
            let site_index = idx + 1;
            let permit = semaphore.clone().acquire_owned().await?;
            let fetcher = Arc::clone(&self.fetcher);
            let settings = settings.clone();
            let site_name = site.name.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                site_processor::process_site(&site, site_index, fetcher.as_ref(), &settings).await
            });
            handles.push((site_index, site_name, handle));
        }

        let mut summary = RunSummary {
            total: handles.len(),
            ..Default::default()
        };

        for (site_index, site_name, handle) in handles {
            match handle.await {
                Ok(Ok(records)) => {
                    info!("[站点 {}#{}] 处理完成，新增 {} 条", site_name, site_index, records.len());
                    summary.success += 1;
                    summary.new_records.extend(records);
                }
                Ok(Err(e)) => {
                    error!("[站点 {}#{}] ❌ 处理过程中发生错误: {:#}", site_name, site_index, e);
                    summary.failed += 1;
                }
                Err(e) => {
                    error!("[站点 {}#{}] 任务执行失败: {}", site_name, site_index, e);
                    summary.failed += 1;
                }
            }
        }

        Ok(summary)
    }
}
