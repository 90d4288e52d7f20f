use crate::config::Config;
use crate::errors::{NotifierError, Result};
use crate::scrapers::base::PageSource;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::{Client, Url};
use std::time::Duration;

/// 东京 IPO 日程页面抓取器
pub struct TokyoIpoScraper {
    client: Client,
    url: Url,
}

impl TokyoIpoScraper {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NotifierError::FetchError(e.to_string()))?;

        Ok(Self {
            client,
            url: config.schedule_url()?,
        })
    }
}

#[async_trait]
impl PageSource for TokyoIpoScraper {
    fn source_name(&self) -> String {
        self.url.to_string()
    }

    async fn fetch_page(&self) -> Result<Vec<u8>> {
        info!("Fetching IPO schedule from {}", self.url);

        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| NotifierError::FetchError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(NotifierError::FetchError(format!("{} returned {}", self.url, status)));
        }

        // 页面为 EUC-JP，这里只保留原始字节
        let bytes = response
            .bytes()
            .await
            .map_err(|e| NotifierError::FetchError(e.to_string()))?;
        debug!("Received {} bytes", bytes.len());

        Ok(bytes.to_vec())
    }
}
