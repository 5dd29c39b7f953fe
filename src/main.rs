use anyhow::Result;
use listing_monitor::utils::logging;
use listing_monitor::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(&config.output_log_file, config.verbose_logging)?;

    // 初始化并运行应用
    let app = match App::initialize(config).await {
        Ok(app) => app,
        Err(e) => {
            tracing::error!("配置加载失败，程序结束: {:#}", e);
            return Err(e);
        }
    };
    app.run().await?;

    Ok(())
}
