// 公开导出的模块，供外部使用
pub mod errors;
pub mod extract;
pub mod models;
pub mod notify;
pub mod services;
pub mod store;

pub mod config;
pub mod scrapers;
pub mod util;

// 重新导出常用类型，方便使用
pub use config::Config;
pub use errors::{EncodingWarning, NotifierError, Result};
pub use models::schedule::ScheduleRecord;
pub use services::notify_service::NotifyService;
pub use services::trigger::{RunSummary, TriggerEvaluator};
