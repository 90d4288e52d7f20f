pub mod slack;

pub use slack::SlackNotifier;

use crate::errors::Result;
use crate::models::schedule::ScheduleRecord;
use async_trait::async_trait;
use log::info;

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    NewListing,
    ProvisionalConditionTomorrow,
    BookBuildingStartsTomorrow,
    ReleasePriceTomorrow,
    StockReleaseTomorrow,
}

impl NotificationKind {
    pub fn title(&self) -> &'static str {
        match self {
            NotificationKind::NewListing => ":hatching_chick: < 新規IPO情報が公開されましたよ！",
            NotificationKind::ProvisionalConditionTomorrow => ":hatching_chick: < 明日、仮条件が公開されますよ！",
            NotificationKind::BookBuildingStartsTomorrow => ":hatching_chick: < 明日、ブックビルが開始されます！",
            NotificationKind::ReleasePriceTomorrow => ":hatching_chick: < 明日、公開価格が発表されます！",
            NotificationKind::StockReleaseTomorrow => ":hatching_chick: < 明日、株式公開予定の企業があります！",
        }
    }
}

/// 通知渠道
#[async_trait]
pub trait Notifier {
    async fn send(&self, title: &str, record: &ScheduleRecord) -> Result<()>;
}

/// 通知正文，列出记录的主要字段和链接
pub fn render_message(record: &ScheduleRecord) -> String {
    format!(
        "企業名   : {}\n\
         コード   : {}\n\
         仮条件   : {}\n\
         公開価格 : {}\n\
         ＢＢ期間 : {}\n\
         公開日   : {}\n\
         公開株数 : {}\n\
         主幹事   : {}\n\
         事業内容 : {}\n\
         \n\
         IPO詳細 : {}\n\
         株価詳細: {}\n\
         開示情報: {}",
        record.company_name,
        record.code,
        record.provisional_condition,
        record.release_price,
        record.book_building_date_range,
        record.stock_release_date,
        record.stock_count,
        record.secretary,
        record.business_description,
        record.detail_url,
        record.chart_url,
        record.release_url,
    )
}

/// 只写日志的通知渠道，用于试运行
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, title: &str, record: &ScheduleRecord) -> Result<()> {
        info!("[dry-run] {}\n{}", title, render_message(record));
        Ok(())
    }
}
