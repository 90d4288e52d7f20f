use crate::config::Config;
use crate::errors::{NotifierError, Result};
use crate::extract::{Assembly, RecordAssembler, TextNormalizer};
use crate::notify::Notifier;
use crate::scrapers::base::PageSource;
use crate::services::trigger::{RunSummary, TriggerEvaluator};
use crate::store::RecordStore;
use crate::util;
use chrono::{DateTime, Utc};
use log::{debug, info, log_enabled, Level};
use reqwest::Url;
use std::sync::Arc;

/// 一次完整运行：抓取、提取、对比、通知、写入
pub struct NotifyService {
    source: Arc<dyn PageSource + Send + Sync>,
    assembler: RecordAssembler,
    evaluator: TriggerEvaluator,
}

impl NotifyService {
    pub fn new(
        config: &Config,
        source: Arc<dyn PageSource + Send + Sync>,
        store: Arc<dyn RecordStore + Send + Sync>,
        notifier: Arc<dyn Notifier + Send + Sync>,
    ) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| NotifierError::ConfigError(format!("invalid base url {}: {}", config.base_url, e)))?;

        Ok(Self {
            source,
            assembler: RecordAssembler::new(base_url, TextNormalizer::euc_jp())?,
            evaluator: TriggerEvaluator::new(store, notifier),
        })
    }

    /// 抓取页面并组装记录
    pub async fn collect(&self) -> Result<Assembly> {
        let page = self.source.fetch_page().await?;
        let assembly = self.assembler.assemble_page(&page)?;

        if log_enabled!(Level::Debug) {
            debug!("Records:\n{}", serde_json::to_string_pretty(&assembly.records)?);
        }
        Ok(assembly)
    }

    pub async fn run(&self) -> Result<RunSummary> {
        self.run_at(Utc::now()).await
    }

    /// 以给定时刻计算“明天”并执行一次运行
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<RunSummary> {
        info!("Run started for {}", self.source.source_name());
        let assembly = self.collect().await?;
        self.evaluate(&assembly, now).await
    }

    /// 对已组装的记录执行对比与通知
    pub async fn evaluate(&self, assembly: &Assembly, now: DateTime<Utc>) -> Result<RunSummary> {
        let tomorrow = util::tomorrow_from(now, util::source_offset());
        let mut summary = self.evaluator.evaluate(&assembly.records, tomorrow).await?;
        summary.encoding_fallbacks = assembly.warnings.len();

        info!(
            "Run finished: {} records, {} new listings, {} milestone notifications, {} encoding fallbacks",
            summary.records, summary.new_listings, summary.milestone_notifications, summary.encoding_fallbacks
        );
        Ok(summary)
    }
}
