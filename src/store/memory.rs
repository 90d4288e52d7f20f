use crate::errors::{NotifierError, Result};
use crate::models::schedule::ScheduleRecord;
use crate::store::RecordStore;
use async_trait::async_trait;
use std::sync::Mutex;

/// 仅保存在内存中的存储，用于试运行和测试
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<ScheduleRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ScheduleRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find(&self, code: &str) -> Result<Vec<ScheduleRecord>> {
        let records = self.records.lock().map_err(|e| NotifierError::StoreError(e.to_string()))?;
        Ok(records.iter().filter(|r| r.code == code).cloned().collect())
    }

    async fn upsert(&self, record: &ScheduleRecord) -> Result<()> {
        let mut records = self.records.lock().map_err(|e| NotifierError::StoreError(e.to_string()))?;
        match records.iter_mut().find(|r| r.code == record.code) {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        Ok(())
    }

    async fn all(&self) -> Result<Vec<ScheduleRecord>> {
        let records = self.records.lock().map_err(|e| NotifierError::StoreError(e.to_string()))?;
        Ok(records.clone())
    }
}
