use std::path::PathBuf;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 页面抓取错误
    #[error("抓取错误: {0}")]
    Fetch(#[from] FetchError),
    /// 记录存储错误
    #[error("存储错误: {0}")]
    Store(#[from] StoreError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 页面抓取错误
///
/// 抓取器在重试耗尽后才把错误交给核心，核心把它当作"页面不可用"。
#[derive(Debug, Error)]
pub enum FetchError {
    /// 构建 HTTP 客户端失败
    #[error("无法构建 HTTP 客户端: {0}")]
    ClientBuild(#[source] reqwest::Error),
    /// URL 无效
    #[error("无效的 URL: {0}")]
    InvalidUrl(String),
    /// 网络请求失败
    #[error("请求失败 ({url}): {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// 服务器返回非成功状态码
    #[error("HTTP 状态码 {status} ({url})")]
    BadStatus { url: String, status: u16 },
    /// 重试次数耗尽
    #[error("已重试 {attempts} 次仍失败 ({url}): {last_error}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },
}

impl FetchError {
    /// 是否属于可重试的瞬时错误（网络错误、429、5xx）
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::RequestFailed { .. } => true,
            FetchError::BadStatus { status, .. } => {
                *status == 429 || (500..=599).contains(status)
            }
            _ => false,
        }
    }
}

/// 记录存储错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 读取文件失败
    #[error("读取文件失败 ({}): {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({}): {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 文件内容无法解析
    #[error("表格文件格式错误 ({}): {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// 序列化失败
    #[error("序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件不存在
    #[error("找不到配置文件: {}", path.display())]
    NotFound { path: PathBuf },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({}): {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({}): {source}", path.display())]
    TomlParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// 没有配置任何站点
    #[error("配置文件中没有 'sites' 配置: {}", path.display())]
    NoSites { path: PathBuf },
    /// 站点字段无效
    #[error("站点 '{site}' 配置无效: {reason}")]
    InvalidSite { site: String, reason: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建站点配置错误
    pub fn invalid_site(site: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Config(ConfigError::InvalidSite {
            site: site.into(),
            reason: reason.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_statuses() {
        let status = |s| FetchError::BadStatus {
            url: "https://example.com".to_string(),
            status: s,
        };
        assert!(status(429).is_transient());
        assert!(status(503).is_transient());
        assert!(!status(404).is_transient());
        assert!(!FetchError::InvalidUrl("x".into()).is_transient());
    }

    #[test]
    fn test_config_error_wraps_into_app_error() {
        let err: AppError = ConfigError::NoSites {
            path: PathBuf::from("config.toml"),
        }
        .into();
        assert!(err.to_string().contains("sites"));
    }
}
