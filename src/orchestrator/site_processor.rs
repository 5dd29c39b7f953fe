//! 单个站点处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块负责一个站点的完整流水线，是站点级别的编排器。
//!
//! ## 核心功能
//!
//! 1. **robots.txt 检查**：被禁止时跳过；robots.txt 本身取不到时继续
//! 2. **路径限制**：记录文件只取文件名，落在数据目录下
//! 3. **列表抓取**：分页或单页，跨页去重
//! 4. **新数据检测**：与已存储记录按 (标题, 日期) 比对
//! 5. **详情补充**：只对新记录抓取详情页
//! 6. **主办单位过滤与保存**
//!
//! 站点内各阶段严格串行；任何阶段出错都只影响本站点。

use crate::config::PipelineSettings;
use crate::error::{AppError, FetchError};
use crate::infrastructure::{JsonTableStore, PageFetcher, RecordStore};
use crate::models::{Column, DetailRecord, SiteConfig};
use crate::services::robots::{robots_url, RobotsRules};
use crate::services::{detect_new_records, filter_by_organizer};
use crate::workflow::{DetailFlow, ListingFlow, SiteCtx};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 处理单个站点
///
/// # 参数
/// - `site`: 站点配置
/// - `site_index`: 站点序号（用于日志）
/// - `fetcher`: 共享的页面抓取器
/// - `settings`: 流水线参数
///
/// # 返回
/// 返回本次新增并已保存的记录
pub async fn process_site(
    site: &SiteConfig,
    site_index: usize,
    fetcher: &dyn PageFetcher,
    settings: &PipelineSettings,
) -> Result<Vec<DetailRecord>> {
    let ctx = SiteCtx::new(&site.name, site_index);

    if !site.enabled {
        info!("{} 跳过已停用的站点", ctx);
        return Ok(Vec::new());
    }

    log_site_start(&ctx, site);

    let path = store_path(&settings.data_dir, site)?;
    let store = JsonTableStore::new(path);

    run_pipeline(site, &ctx, fetcher, &store, settings).await
}

/// 记录文件路径：只取配置中的文件名，放到数据目录下
pub fn store_path(data_dir: &Path, site: &SiteConfig) -> Result<PathBuf, AppError> {
    let file_name = Path::new(site.store_file.trim())
        .file_name()
        .filter(|name| !name.is_empty())
        .ok_or_else(|| {
            AppError::invalid_site(
                &site.name,
                format!("不安全或无效的记录文件路径: '{}'", site.store_file),
            )
        })?;
    Ok(data_dir.join(file_name))
}

/// 站点流水线：robots → 列表 → 新数据检测 → 详情 → 过滤 → 保存
pub async fn run_pipeline(
    site: &SiteConfig,
    ctx: &SiteCtx,
    fetcher: &dyn PageFetcher,
    store: &dyn RecordStore,
    settings: &PipelineSettings,
) -> Result<Vec<DetailRecord>> {
    // ========== robots.txt ==========
    if !robots_allows(site, ctx, fetcher, &settings.user_agent).await {
        warn!("{} robots.txt 禁止抓取此 URL，已跳过", ctx);
        return Ok(Vec::new());
    }

    // ========== 列表页 ==========
    let listing = ListingFlow::new(fetcher, settings.page_delay)
        .run(site, ctx)
        .await
        .with_context(|| format!("{} 列表页抓取失败", ctx))?;

    if listing.is_empty() {
        info!("{} 列表页未找到任何数据", ctx);
        return Ok(Vec::new());
    }
    info!("{} 从列表页解析到 {} 条记录", ctx, listing.len());

    // ========== 新数据检测 ==========
    let existing = store
        .load()
        .await
        .with_context(|| format!("{} 读取已存储记录失败", ctx))?;
    let new_items = detect_new_records(listing, &existing);

    if new_items.is_empty() {
        info!("{} 没有发现新数据", ctx);
        return Ok(Vec::new());
    }
    info!("{} 发现 {} 条新数据，开始抓取详情页...", ctx, new_items.len());

    // ========== 详情页 ==========
    let detail_flow = DetailFlow::new(
        fetcher,
        settings.detail_max_retries,
        settings.detail_retry_delay,
    );
    let mut detailed = Vec::with_capacity(new_items.len());
    for (i, item) in new_items.iter().enumerate() {
        debug!(
            "{} 处理新条目 {}/{}: {}",
            ctx,
            i + 1,
            new_items.len(),
            crate::utils::logging::truncate_text(&item.title, 50)
        );
        if let Some(record) = detail_flow.run(&site.url, item, ctx).await {
            detailed.push(record);
        }
    }
    info!("{} 成功抓取 {} 条详情", ctx, detailed.len());

    // ========== 过滤与保存 ==========
    let filtered = filter_by_organizer(detailed, site);
    if filtered.is_empty() {
        info!("{} 过滤后没有符合条件的新数据", ctx);
        return Ok(Vec::new());
    }

    let summary = store
        .save(&filtered, &Column::DEFAULT_ORDER)
        .await
        .with_context(|| format!("{} 保存记录失败", ctx))?;
    let stats = store
        .stats()
        .await
        .with_context(|| format!("{} 读取存储统计失败", ctx))?;
    info!(
        "{} ✓ 保存完成: 新增 {} 条，文件共 {} 条 (最近抓取 {})",
        ctx,
        summary.added,
        stats.total_records,
        stats.last_fetched_at.as_deref().unwrap_or("-")
    );

    Ok(filtered)
}

/// robots.txt 取不到时允许抓取；401/403 视为全部禁止
async fn robots_allows(
    site: &SiteConfig,
    ctx: &SiteCtx,
    fetcher: &dyn PageFetcher,
    user_agent: &str,
) -> bool {
    let Some(url) = robots_url(&site.url) else {
        warn!("{} 无法构造 robots.txt 地址，继续抓取", ctx);
        return true;
    };

    match fetcher.fetch(&url).await {
        Ok(body) => {
            let allowed = RobotsRules::parse(&body).is_allowed(user_agent, &site.url);
            if allowed {
                info!("{} robots.txt 检查通过", ctx);
            }
            allowed
        }
        Err(FetchError::BadStatus {
            status: status @ (401 | 403),
            ..
        }) => {
            warn!("{} robots.txt 返回 {}，视为全部禁止", ctx, status);
            false
        }
        Err(e) => {
            warn!("{} 检查 robots.txt 失败: {}，继续抓取", ctx, e);
            true
        }
    }
}

fn log_site_start(ctx: &SiteCtx, site: &SiteConfig) {
    info!("\n{}", "=".repeat(60));
    info!("{} 🌐 开始检查: {}", ctx, site.url);
    info!("{}", "=".repeat(60));
}
