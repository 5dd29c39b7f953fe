use std::path::PathBuf;
use std::time::Duration;

/// 程序配置
///
/// 进程级参数来自环境变量；站点列表来自 TOML 文件（见 `models::loaders`），
/// 文件中的 `[settings]` / `[headers]` 会覆盖这里的同名值。
#[derive(Clone, Debug)]
pub struct Config {
    /// 站点配置文件路径
    pub sites_config: PathBuf,
    /// 数据目录，所有记录文件都落在这里
    pub data_dir: PathBuf,
    /// 输出日志文件
    pub output_log_file: PathBuf,
    /// 同时处理的站点数量
    pub max_concurrent_sites: usize,
    /// HTTP User-Agent
    pub user_agent: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 瞬时错误的重试次数
    pub fetch_retry_times: u32,
    /// 重试退避的基数（毫秒），第 n 次重试前等待 基数 × 2^(n-1)
    pub fetch_backoff_ms: u64,
    /// 每次成功抓取后的礼貌延迟（毫秒）
    pub politeness_delay_ms: u64,
    /// 分页之间的固定延迟（毫秒）
    pub page_delay_ms: u64,
    /// 详情页最大尝试次数
    pub detail_max_retries: u32,
    /// 详情页失败后的等待时间（毫秒）
    pub detail_retry_delay_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sites_config: PathBuf::from("config.toml"),
            data_dir: PathBuf::from("data"),
            output_log_file: PathBuf::from("data/monitor.log"),
            max_concurrent_sites: 5,
            user_agent: "Listing-Monitor/2.2 (+https://example.invalid/contact)".to_string(),
            request_timeout_secs: 10,
            fetch_retry_times: 3,
            fetch_backoff_ms: 1000,
            politeness_delay_ms: 1000,
            page_delay_ms: 1000,
            detail_max_retries: 3,
            detail_retry_delay_ms: 2000,
            verbose_logging: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            sites_config: std::env::var("SITES_CONFIG").map(PathBuf::from).unwrap_or(default.sites_config),
            data_dir: std::env::var("DATA_DIR").map(PathBuf::from).unwrap_or(default.data_dir),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").map(PathBuf::from).unwrap_or(default.output_log_file),
            max_concurrent_sites: std::env::var("MAX_CONCURRENT_SITES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_sites),
            user_agent: std::env::var("USER_AGENT").unwrap_or(default.user_agent),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            fetch_retry_times: std::env::var("FETCH_RETRY_TIMES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.fetch_retry_times),
            fetch_backoff_ms: std::env::var("FETCH_BACKOFF_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.fetch_backoff_ms),
            politeness_delay_ms: std::env::var("POLITENESS_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.politeness_delay_ms),
            page_delay_ms: std::env::var("PAGE_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.page_delay_ms),
            detail_max_retries: std::env::var("DETAIL_MAX_RETRIES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.detail_max_retries),
            detail_retry_delay_ms: std::env::var("DETAIL_RETRY_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.detail_retry_delay_ms),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    /// 站点流水线需要的时间参数
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            page_delay: Duration::from_millis(self.page_delay_ms),
            detail_max_retries: self.detail_max_retries.max(1),
            detail_retry_delay: Duration::from_millis(self.detail_retry_delay_ms),
            data_dir: self.data_dir.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

/// 单个站点流水线的运行参数
#[derive(Clone, Debug)]
pub struct PipelineSettings {
    /// 分页之间的延迟
    pub page_delay: Duration,
    /// 详情页最大尝试次数（至少 1）
    pub detail_max_retries: u32,
    /// 详情页失败后的等待
    pub detail_retry_delay: Duration,
    /// 数据目录
    pub data_dir: PathBuf,
    /// 检查 robots.txt 时使用的 User-Agent
    pub user_agent: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Config::default().pipeline_settings()
    }
}
