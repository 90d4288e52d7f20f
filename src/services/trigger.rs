use crate::errors::Result;
use crate::models::schedule::ScheduleRecord;
use crate::notify::{NotificationKind, Notifier};
use crate::store::RecordStore;
use crate::util::{parse_month_day, MonthDay};
use log::{debug, info};
use serde::Serialize;
use std::sync::Arc;

/// 一次运行的统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub records: usize,
    pub new_listings: usize,
    pub milestone_notifications: usize,
    pub encoding_fallbacks: usize,
}

fn is_due(text: &str, tomorrow: MonthDay) -> bool {
    parse_month_day(text) == Some(tomorrow)
}

/// 记录中日期为明天的里程碑，顺序固定
pub fn milestones_due(record: &ScheduleRecord, tomorrow: MonthDay) -> Vec<NotificationKind> {
    let mut due = Vec::new();

    if !record.provisional_condition.is_empty() && is_due(&record.provisional_condition, tomorrow) {
        due.push(NotificationKind::ProvisionalConditionTomorrow);
    }

    let range: Vec<&str> = record.book_building_date_range.split('-').collect();
    if let [start, _] = range[..] {
        if is_due(start.trim(), tomorrow) {
            due.push(NotificationKind::BookBuildingStartsTomorrow);
        }
    }

    if !record.release_price.is_empty() && is_due(&record.release_price, tomorrow) {
        due.push(NotificationKind::ReleasePriceTomorrow);
    }

    if !record.stock_release_date.is_empty() && is_due(&record.stock_release_date, tomorrow) {
        due.push(NotificationKind::StockReleaseTomorrow);
    }

    due
}

/// 对比存储中的记录并发送通知，每条记录都会写回存储
pub struct TriggerEvaluator {
    store: Arc<dyn RecordStore + Send + Sync>,
    notifier: Arc<dyn Notifier + Send + Sync>,
}

impl TriggerEvaluator {
    pub fn new(store: Arc<dyn RecordStore + Send + Sync>, notifier: Arc<dyn Notifier + Send + Sync>) -> Self {
        Self { store, notifier }
    }

    /// 按页面顺序处理记录，任何存储或通知错误立即中止
    pub async fn evaluate(&self, records: &[ScheduleRecord], tomorrow: MonthDay) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        info!("Evaluating {} records against tomorrow {}", records.len(), tomorrow);

        for record in records {
            let existing = self.store.find(&record.code).await?;
            if existing.is_empty() {
                info!("New listing: {} ({})", record.company_name, record.code);
                self.notifier
                    .send(NotificationKind::NewListing.title(), record)
                    .await?;
                summary.new_listings += 1;
            }

            // 无论是否为新记录都写入，必须在存在性检查之后
            self.store.upsert(record).await?;
            debug!("Upserted {}", record.code);

            for kind in milestones_due(record, tomorrow) {
                info!("{:?} for {} ({})", kind, record.company_name, record.code);
                self.notifier.send(kind.title(), record).await?;
                summary.milestone_notifications += 1;
            }

            summary.records += 1;
        }

        Ok(summary)
    }
}
