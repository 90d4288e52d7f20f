pub mod arrow_store;
pub mod memory;

pub use arrow_store::ArrowStore;
pub use memory::MemoryStore;

use crate::errors::Result;
use crate::models::schedule::ScheduleRecord;
use async_trait::async_trait;

/// 日程记录的持久化存储，以 code 为键
#[async_trait]
pub trait RecordStore {
    /// 查找 code 相同的已有记录
    async fn find(&self, code: &str) -> Result<Vec<ScheduleRecord>>;

    /// 插入或覆盖记录
    async fn upsert(&self, record: &ScheduleRecord) -> Result<()>;

    /// 全部已存记录
    async fn all(&self) -> Result<Vec<ScheduleRecord>>;
}
