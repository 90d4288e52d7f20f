use crate::errors::{NotifierError, Result};
use crate::models::schedule::ScheduleRecord;
use crate::store::RecordStore;
use arrow::ipc::writer::FileWriter;
use arrow_array::{Array, ArrayRef, RecordBatch, StringArray};
use arrow_ipc::reader::FileReader;
use arrow_schema::{DataType, Field, Schema};
use async_trait::async_trait;
use log::{debug, info};
use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// 表文件中的列，顺序固定
pub const COLUMNS: [&str; 14] = [
    "company_name",
    "detail_url",
    "chart_url",
    "release_url",
    "stock_release_date",
    "code",
    "stock_count",
    "provisional_condition",
    "release_price",
    "book_building_date_range",
    "initial_price",
    "rise_rate",
    "secretary",
    "business_description",
];

fn column_values(record: &ScheduleRecord) -> [&str; 14] {
    [
        &record.company_name,
        &record.detail_url,
        &record.chart_url,
        &record.release_url,
        &record.stock_release_date,
        &record.code,
        &record.stock_count,
        &record.provisional_condition,
        &record.release_price,
        &record.book_building_date_range,
        &record.initial_price,
        &record.rise_rate,
        &record.secretary,
        &record.business_description,
    ]
}

fn arrow_err(e: impl std::fmt::Display) -> NotifierError {
    NotifierError::ArrowError(e.to_string())
}

pub fn schema() -> Schema {
    Schema::new(
        COLUMNS
            .iter()
            .map(|name| Field::new(*name, DataType::Utf8, false))
            .collect::<Vec<_>>(),
    )
}

/// 将日程记录转换为 Arrow 记录批次
pub fn records_to_batch(records: &[ScheduleRecord]) -> Result<RecordBatch> {
    let rows: Vec<[&str; 14]> = records.iter().map(column_values).collect();
    let columns: Vec<ArrayRef> = (0..COLUMNS.len())
        .map(|i| Arc::new(StringArray::from(rows.iter().map(|r| r[i]).collect::<Vec<&str>>())) as ArrayRef)
        .collect();

    RecordBatch::try_new(Arc::new(schema()), columns).map_err(arrow_err)
}

/// 从 Arrow 文件读取日程记录
pub fn read_records_from_arrow(path: &Path) -> Result<Vec<ScheduleRecord>> {
    let file = File::open(path).map_err(|e| NotifierError::StoreError(format!("{}: {}", path.display(), e)))?;
    let reader = FileReader::try_new(file, None).map_err(arrow_err)?;

    let mut result = Vec::new();
    for batch in reader {
        let batch = batch.map_err(arrow_err)?;

        let mut arrays = Vec::with_capacity(COLUMNS.len());
        for name in COLUMNS {
            let array = batch
                .column_by_name(name)
                .and_then(|a| a.as_any().downcast_ref::<StringArray>())
                .ok_or_else(|| NotifierError::ArrowError(format!("Missing or invalid column {}", name)))?;
            arrays.push(array);
        }

        for i in 0..batch.num_rows() {
            let value = |col: usize| {
                let array = arrays[col];
                if array.is_null(i) {
                    String::new()
                } else {
                    array.value(i).to_string()
                }
            };
            result.push(ScheduleRecord {
                company_name: value(0),
                detail_url: value(1),
                chart_url: value(2),
                release_url: value(3),
                stock_release_date: value(4),
                code: value(5),
                stock_count: value(6),
                provisional_condition: value(7),
                release_price: value(8),
                book_building_date_range: value(9),
                initial_price: value(10),
                rise_rate: value(11),
                secretary: value(12),
                business_description: value(13),
            });
        }
    }

    Ok(result)
}

/// 将记录写入 Arrow 文件，先写临时文件再替换
pub fn save_records_to_arrow(records: &[ScheduleRecord], path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| NotifierError::StoreError(format!("{}: {}", dir.display(), e)))?;
    }

    let batch = records_to_batch(records)?;
    let tmp_path = path.with_extension("arrow.tmp");
    let file = File::create(&tmp_path)
        .map_err(|e| NotifierError::StoreError(format!("{}: {}", tmp_path.display(), e)))?;

    let mut writer = FileWriter::try_new(file, &batch.schema()).map_err(arrow_err)?;
    writer.write(&batch).map_err(arrow_err)?;
    writer.finish().map_err(arrow_err)?;

    fs::rename(&tmp_path, path).map_err(|e| NotifierError::StoreError(format!("{}: {}", path.display(), e)))?;
    debug!("Saved {} records to {}", records.len(), path.display());
    Ok(())
}

struct TableState {
    records: Vec<ScheduleRecord>,
    code_index: HashMap<String, usize>,
}

impl TableState {
    fn new(records: Vec<ScheduleRecord>) -> Self {
        let mut state = Self {
            records,
            code_index: HashMap::new(),
        };
        state.rebuild_index();
        state
    }

    fn rebuild_index(&mut self) {
        self.code_index.clear();
        for (i, record) in self.records.iter().enumerate() {
            self.code_index.insert(record.code.clone(), i);
        }
    }
}

/// 以 Arrow IPC 文件保存的记录表，每张表一个文件
pub struct ArrowStore {
    path: PathBuf,
    state: Mutex<TableState>,
}

impl ArrowStore {
    /// 表文件路径：<data_dir>/<region>/<table>.arrow
    pub fn table_path(data_dir: &str, region: &str, table: &str) -> PathBuf {
        PathBuf::from(data_dir).join(region).join(format!("{}.arrow", table))
    }

    pub fn open_table(data_dir: &str, region: &str, table: &str) -> Result<Self> {
        Self::open(Self::table_path(data_dir, region, table))
    }

    pub fn open(path: PathBuf) -> Result<Self> {
        let records = if path.exists() {
            info!("Loading existing records from {}", path.display());
            read_records_from_arrow(&path)?
        } else {
            info!("No table file at {}, starting empty", path.display());
            Vec::new()
        };

        Ok(Self {
            path,
            state: Mutex::new(TableState::new(records)),
        })
    }

    /// 创建空表文件，已存在时保留原文件
    pub fn create_empty(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        save_records_to_arrow(&[], path)?;
        Ok(true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, TableState>> {
        self.state
            .lock()
            .map_err(|e| NotifierError::StoreError(e.to_string()))
    }
}

#[async_trait]
impl RecordStore for ArrowStore {
    async fn find(&self, code: &str) -> Result<Vec<ScheduleRecord>> {
        let state = self.lock()?;
        Ok(state.records.iter().filter(|r| r.code == code).cloned().collect())
    }

    // 每次写入都重写整个表文件，已处理的记录在运行中途失败时也不会丢失
    async fn upsert(&self, record: &ScheduleRecord) -> Result<()> {
        let mut state = self.lock()?;
        let existing = state.code_index.get(&record.code).copied();
        let previous = match existing {
            Some(idx) => Some(std::mem::replace(&mut state.records[idx], record.clone())),
            None => {
                state.records.push(record.clone());
                None
            }
        };

        if let Err(e) = save_records_to_arrow(&state.records, &self.path) {
            // 写入失败时恢复内存中的表
            match (existing, previous) {
                (Some(idx), Some(previous)) => state.records[idx] = previous,
                _ => {
                    state.records.pop();
                }
            }
            return Err(e);
        }

        if existing.is_none() {
            let idx = state.records.len() - 1;
            state.code_index.insert(record.code.clone(), idx);
        }
        Ok(())
    }

    async fn all(&self) -> Result<Vec<ScheduleRecord>> {
        Ok(self.lock()?.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(code: &str, name: &str) -> ScheduleRecord {
        ScheduleRecord {
            code: code.to_string(),
            company_name: name.to_string(),
            business_description: "事業内容".to_string(),
            book_building_date_range: "03/15 - 03/20".to_string(),
            ..ScheduleRecord::default()
        }
    }

    #[tokio::test]
    async fn upserts_persist_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_str().unwrap();

        let store = ArrowStore::open_table(data_dir, "tokyo", "ipo").unwrap();
        store.upsert(&record("1234", "First")).await.unwrap();
        store.upsert(&record("5678", "Second")).await.unwrap();
        store.upsert(&record("1234", "First Renamed")).await.unwrap();
        assert!(store.path().ends_with("tokyo/ipo.arrow"));

        let reopened = ArrowStore::open_table(data_dir, "tokyo", "ipo").unwrap();
        let all = reopened.all().await.unwrap();
        assert_eq!(all.len(), 2);
        let found = reopened.find("1234").await.unwrap();
        assert_eq!(found, vec![record("1234", "First Renamed")]);
    }

    #[tokio::test]
    async fn failed_write_leaves_table_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ipo.arrow");
        let store = ArrowStore::open(path.clone()).unwrap();
        store.upsert(&record("1234", "First")).await.unwrap();

        // 表文件位置被非空目录占据，重命名必然失败
        fs::remove_file(&path).unwrap();
        fs::create_dir_all(path.join("blocker")).unwrap();

        let err = store.upsert(&record("5678", "Second")).await.unwrap_err();
        assert!(matches!(err, NotifierError::StoreError(_)));
        assert!(store.find("5678").await.unwrap().is_empty());

        let err = store.upsert(&record("1234", "Renamed")).await.unwrap_err();
        assert!(matches!(err, NotifierError::StoreError(_)));
        assert_eq!(store.find("1234").await.unwrap(), vec![record("1234", "First")]);
        assert_eq!(store.all().await.unwrap().len(), 1);
    }

    #[test]
    fn create_empty_writes_readable_table_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("region").join("table.arrow");

        assert!(ArrowStore::create_empty(&path).unwrap());
        assert!(!ArrowStore::create_empty(&path).unwrap());
        assert!(read_records_from_arrow(&path).unwrap().is_empty());
    }
}
