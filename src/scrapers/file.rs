use crate::errors::{NotifierError, Result};
use crate::scrapers::base::PageSource;
use async_trait::async_trait;
use log::info;
use std::path::PathBuf;

/// 从本地保存的页面读取，用于调试
pub struct FilePageSource {
    path: PathBuf,
}

impl FilePageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PageSource for FilePageSource {
    fn source_name(&self) -> String {
        self.path.display().to_string()
    }

    async fn fetch_page(&self) -> Result<Vec<u8>> {
        info!("Reading IPO schedule from {}", self.path.display());
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| NotifierError::FetchError(format!("{}: {}", self.path.display(), e)))
    }
}
