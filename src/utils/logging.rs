/// 日志工具模块
///
/// 初始化 tracing（标准输出 + 日志文件），以及格式化输出的辅助函数
use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// 初始化日志
///
/// 默认级别为 info（`verbose` 时为 debug），可用 `RUST_LOG` 覆盖。
/// 日志同时写到标准输出和 `log_file`，文件开头先写入标题。
pub fn init(log_file: &Path, verbose: bool) -> Result<()> {
    init_log_file(log_file)?;

    let file = OpenOptions::new()
        .append(true)
        .open(log_file)
        .with_context(|| format!("无法打开日志文件: {}", log_file.display()))?;

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("日志系统已初始化")?;

    Ok(())
}

/// 初始化日志文件
///
/// 创建所在目录并写入标题（覆盖旧文件）
pub fn init_log_file(log_file_path: &Path) -> Result<()> {
    if let Some(parent) = log_file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("无法创建日志目录: {}", parent.display()))?;
    }

    let log_header = format!(
        "{}\n网页监控日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path.display()))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(max_concurrent: usize, data_dir: &Path) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 多站点并行监控模式");
    info!("📊 最大并发数: {}", max_concurrent);
    info!("📁 数据目录: {}", data_dir.display());
    info!("{}", "=".repeat(60));
}

/// 记录站点加载信息
pub fn log_sites_loaded(enabled: usize, total: usize, max_concurrent: usize) {
    info!("✓ 共 {} 个站点，启用 {} 个", total, enabled);
    info!("📋 最多同时处理 {} 个站点\n", max_concurrent);
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功站点数
/// - `failed`: 失败站点数
/// - `total`: 站点总数
/// - `new_records`: 新增记录数
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(
    success: usize,
    failed: usize,
    total: usize,
    new_records: usize,
    log_file_path: &Path,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部站点处理完成");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("🆕 新增记录: {}", new_records);
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path.display());
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
