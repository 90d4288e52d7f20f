use crate::errors::{NotifierError, Result};
use reqwest::Url;

pub const DEFAULT_BASE_URL: &str = "http://www.tokyoipo.com";
pub const SCHEDULE_PATH: &str = "ipo/schedule.php";

pub const ENV_STORE_TABLE: &str = "IPO_STORE_TABLE";
pub const ENV_STORE_REGION: &str = "IPO_STORE_REGION";
pub const ENV_SLACK_CHANNEL: &str = "SLACK_CHANNEL";
pub const ENV_SLACK_USER_NAME: &str = "SLACK_USER_NAME";
pub const ENV_SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";
pub const ENV_DATA_DIR: &str = "IPO_DATA_DIR";
pub const ENV_BASE_URL: &str = "IPO_BASE_URL";

/// 运行配置，启动时构建一次，之后只读
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub data_dir: String,
    pub store_table: String,
    pub store_region: String,
    pub slack_channel: String,
    pub slack_user_name: String,
    pub slack_webhook_url: String,
}

impl Config {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            data_dir: "data".to_string(),
            store_table: String::new(),
            store_region: String::new(),
            slack_channel: String::new(),
            slack_user_name: String::new(),
            slack_webhook_url: String::new(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    pub fn with_data_dir(mut self, dir: &str) -> Self {
        self.data_dir = dir.to_string();
        self
    }

    pub fn with_store(mut self, table: &str, region: &str) -> Self {
        self.store_table = table.to_string();
        self.store_region = region.to_string();
        self
    }

    pub fn with_slack(mut self, channel: &str, user_name: &str, webhook_url: &str) -> Self {
        self.slack_channel = channel.to_string();
        self.slack_user_name = user_name.to_string();
        self.slack_webhook_url = webhook_url.to_string();
        self
    }

    /// 从进程环境变量读取配置
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// 试运行只需要可选项
    pub fn dry_run_from_env() -> Result<Self> {
        Self::dry_run_from_lookup(env_lookup)
    }

    /// 只访问表文件时只需要表名和区域
    pub fn store_from_env() -> Result<Self> {
        Self::store_from_lookup(env_lookup)
    }

    /// 使用给定的查找函数读取配置，缺少必需项时返回 ConfigError
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Config::new()
            .with_store(&required(&lookup, ENV_STORE_TABLE)?, &required(&lookup, ENV_STORE_REGION)?)
            .with_slack(
                &required(&lookup, ENV_SLACK_CHANNEL)?,
                &required(&lookup, ENV_SLACK_USER_NAME)?,
                &required(&lookup, ENV_SLACK_WEBHOOK_URL)?,
            )
            .with_optional(&lookup);

        config.validate()?;
        Ok(config)
    }

    pub fn dry_run_from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Config::new().with_optional(&lookup);
        config.schedule_url()?;
        Ok(config)
    }

    pub fn store_from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Config::new()
            .with_store(&required(&lookup, ENV_STORE_TABLE)?, &required(&lookup, ENV_STORE_REGION)?)
            .with_optional(&lookup);

        config.validate_store()?;
        Ok(config)
    }

    fn with_optional<F>(mut self, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            self = self.with_data_dir(&dir);
        }
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            self = self.with_base_url(&url);
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.validate_store()?;
        let fields = [
            ("slack_channel", &self.slack_channel),
            ("slack_user_name", &self.slack_user_name),
            ("slack_webhook_url", &self.slack_webhook_url),
        ];
        for (name, value) in fields {
            non_empty(name, value)?;
        }

        Url::parse(&self.slack_webhook_url)
            .map_err(|e| NotifierError::ConfigError(format!("invalid webhook url: {}", e)))?;
        self.schedule_url()?;
        Ok(())
    }

    fn validate_store(&self) -> Result<()> {
        non_empty("store_table", &self.store_table)?;
        non_empty("store_region", &self.store_region)?;
        non_empty("data_dir", &self.data_dir)
    }

    /// IPO 日程页面地址
    pub fn schedule_url(&self) -> Result<Url> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| NotifierError::ConfigError(format!("invalid base url {}: {}", self.base_url, e)))?;
        base.join(SCHEDULE_PATH)
            .map_err(|e| NotifierError::ConfigError(format!("invalid schedule url: {}", e)))
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| NotifierError::ConfigError(format!("missing required variable {}", key)))
}

fn non_empty(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(NotifierError::ConfigError(format!("{} must not be empty", name)));
    }
    Ok(())
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
