use crate::errors::Result;
use async_trait::async_trait;

/// IPO 日程页面来源
#[async_trait]
pub trait PageSource {
    /// 来源描述，用于日志
    fn source_name(&self) -> String;

    /// 获取页面原始字节，解码由提取阶段负责
    async fn fetch_page(&self) -> Result<Vec<u8>>;
}
