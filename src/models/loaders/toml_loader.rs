use crate::error::{AppError, AppResult, ConfigError};
use crate::models::site::MonitorFile;
use std::path::Path;
use tokio::fs;

/// 从 TOML 文件加载站点配置
///
/// 文件缺失、无法解析或没有任何站点都视为配置错误；
/// 站点的必填字段（name/url/container_selector/store_file）不能为空。
pub async fn load_monitor_file(path: &Path) -> AppResult<MonitorFile> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    let content = fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;

    let file: MonitorFile =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_path_buf(),
            source,
        })?;

    if file.sites.is_empty() {
        return Err(ConfigError::NoSites {
            path: path.to_path_buf(),
        }
        .into());
    }

    for (index, site) in file.sites.iter().enumerate() {
        let label = if site.name.trim().is_empty() {
            format!("#{}", index + 1)
        } else {
            site.name.clone()
        };
        let required = [
            ("name", &site.name),
            ("url", &site.url),
            ("container_selector", &site.container_selector),
            ("store_file", &site.store_file),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(AppError::invalid_site(label, format!("缺少必填字段 '{}'", field)));
        }
    }

    let enabled = file.sites.iter().filter(|s| s.enabled).count();
    tracing::info!(
        "已加载站点配置: {} (共 {} 个站点，启用 {} 个)",
        path.display(),
        file.sites.len(),
        enabled
    );
    for site in &file.sites {
        tracing::debug!(
            "  {} [{}] {}",
            if site.enabled { "✓" } else { "✗" },
            site.name,
            site.url
        );
    }

    Ok(file)
}
