//! 记录存储 - 基础设施层
//!
//! 每个站点一个表格文件（JSON：表头 + 数据行），只暴露读取、合并保存与统计

use crate::error::StoreError;
use crate::models::{Column, CrossRunKey, DetailRecord};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use tokio::fs;
use tracing::{debug, info};

const SHEET_NAME: &str = "監控資料";

/// 进程内按文件路径串行化写入
static FILE_LOCKS: LazyLock<std::sync::Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>> =
    LazyLock::new(Default::default);

fn file_lock(path: &Path) -> Arc<tokio::sync::Mutex<()>> {
    let mut locks = FILE_LOCKS.lock().unwrap_or_else(|e| e.into_inner());
    locks.entry(path.to_path_buf()).or_default().clone()
}

/// 保存结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    /// 之前不存在的记录数
    pub added: usize,
    /// 保存后的总记录数
    pub total: usize,
}

/// 存储统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub total_records: usize,
    pub last_fetched_at: Option<String>,
}

/// 记录存储能力
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 读取全部已存储记录；文件不存在时返回空列表
    async fn load(&self) -> Result<Vec<DetailRecord>, StoreError>;

    /// 与已有记录合并后写回
    ///
    /// 按 (标题, 日期) 去重保留最新的一条，按起日升序排列（缺失或无法解析的排在最后），
    /// 列按 `columns` 的顺序写出。
    async fn save(
        &self,
        records: &[DetailRecord],
        columns: &[Column],
    ) -> Result<SaveSummary, StoreError>;

    async fn stats(&self) -> Result<StoreStats, StoreError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct TableFile {
    sheet: String,
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

/// JSON 表格文件存储
pub struct JsonTableStore {
    path: PathBuf,
}

impl JsonTableStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read_table(&self) -> Result<Vec<DetailRecord>, StoreError> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|source| StoreError::ReadFailed {
                path: self.path.clone(),
                source,
            })?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let table: TableFile =
            serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        Ok(rows_to_records(&table))
    }

    async fn write_table(&self, table: &TableFile) -> Result<(), StoreError> {
        let write_failed = |source| StoreError::WriteFailed {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(write_failed)?;
        }

        let json = serde_json::to_string_pretty(table)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).await.map_err(write_failed)?;
        fs::rename(&tmp, &self.path).await.map_err(write_failed)?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonTableStore {
    async fn load(&self) -> Result<Vec<DetailRecord>, StoreError> {
        let records = self.read_table().await?;
        debug!("读取 {} 条已存储记录: {}", records.len(), self.path.display());
        Ok(records)
    }

    async fn save(
        &self,
        records: &[DetailRecord],
        columns: &[Column],
    ) -> Result<SaveSummary, StoreError> {
        let lock = file_lock(&self.path);
        let _guard = lock.lock().await;

        let existing = self.read_table().await?;
        let known: HashSet<CrossRunKey> = existing.iter().map(DetailRecord::cross_run_key).collect();
        let added = records
            .iter()
            .map(DetailRecord::cross_run_key)
            .collect::<HashSet<_>>()
            .difference(&known)
            .count();

        let merged = merge_records(existing, records);
        let table = records_to_rows(&merged, columns);
        self.write_table(&table).await?;

        info!(
            "已保存 {} ({} 条新增, 共 {} 条)",
            self.path.display(),
            added,
            merged.len()
        );
        Ok(SaveSummary {
            added,
            total: merged.len(),
        })
    }

    async fn stats(&self) -> Result<StoreStats, StoreError> {
        let records = self.read_table().await?;
        Ok(StoreStats {
            total_records: records.len(),
            last_fetched_at: records
                .iter()
                .map(|r| r.fetched_at.as_str())
                .filter(|s| !s.is_empty())
                .max()
                .map(str::to_string),
        })
    }
}

/// 合并：同键保留后出现的一条，再按起日排序
fn merge_records(existing: Vec<DetailRecord>, fresh: &[DetailRecord]) -> Vec<DetailRecord> {
    let mut seen = HashSet::new();
    let mut merged: Vec<DetailRecord> = existing
        .into_iter()
        .chain(fresh.iter().cloned())
        .filter(DetailRecord::is_valid)
        .rev()
        .filter(|r| seen.insert(r.cross_run_key()))
        .collect();
    merged.reverse();

    merged.sort_by_key(|r| {
        let start = r
            .start_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok());
        (start.is_none(), start)
    });
    merged
}

fn records_to_rows(records: &[DetailRecord], columns: &[Column]) -> TableFile {
    TableFile {
        sheet: SHEET_NAME.to_string(),
        columns: columns.iter().map(|c| c.header().to_string()).collect(),
        rows: records
            .iter()
            .map(|r| {
                columns
                    .iter()
                    .map(|c| c.get(r).filter(|v| !v.is_empty()).map(str::to_string))
                    .collect()
            })
            .collect(),
    }
}

fn rows_to_records(table: &TableFile) -> Vec<DetailRecord> {
    let columns: Vec<Option<Column>> = table
        .columns
        .iter()
        .map(|h| Column::from_header(h))
        .collect();
    let has_list_date = columns.contains(&Some(Column::ListDate));

    table
        .rows
        .iter()
        .map(|row| {
            let mut record = DetailRecord::default();
            for (column, cell) in columns.iter().zip(row) {
                if let Some(column) = column {
                    let value = cell.as_deref().map(str::trim).filter(|v| !v.is_empty());
                    column.set(&mut record, value.map(str::to_string));
                }
            }
            if !has_list_date {
                record.date = record.start_date.clone();
            }
            record
        })
        .filter(DetailRecord::is_valid)
        .collect()
}
