use crate::config::Config;
use crate::errors::{NotifierError, Result};
use crate::models::schedule::ScheduleRecord;
use crate::notify::{render_message, Notifier};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
pub struct SlackPayload {
    pub channel: String,
    pub username: String,
    pub blocks: Vec<Block>,
    pub text: String,
    pub mrkdwn: bool,
}

#[derive(Debug, Serialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: BlockText,
}

#[derive(Debug, Serialize)]
pub struct BlockText {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl Block {
    fn markdown(text: String) -> Self {
        Self {
            kind: "section".to_string(),
            text: BlockText {
                kind: "mrkdwn".to_string(),
                text,
            },
        }
    }
}

/// Slack Incoming Webhook 通知
pub struct SlackNotifier {
    client: Client,
    webhook_url: String,
    channel: String,
    user_name: String,
}

impl SlackNotifier {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| NotifierError::NotificationError(e.to_string()))?;

        Ok(Self {
            client,
            webhook_url: config.slack_webhook_url.clone(),
            channel: config.slack_channel.clone(),
            user_name: config.slack_user_name.clone(),
        })
    }

    pub fn payload(&self, title: &str, record: &ScheduleRecord) -> SlackPayload {
        SlackPayload {
            channel: self.channel.clone(),
            username: self.user_name.clone(),
            blocks: vec![
                Block::markdown(title.to_string()),
                Block::markdown(format!("```\n{}```", render_message(record))),
            ],
            text: title.to_string(),
            mrkdwn: true,
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn send(&self, title: &str, record: &ScheduleRecord) -> Result<()> {
        let payload = self.payload(title, record);

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifierError::NotificationError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NotifierError::NotificationError(e.to_string()))?;
        debug!("Slack response {}: {}", status, body);

        if !status.is_success() {
            return Err(NotifierError::NotificationError(format!(
                "webhook returned {}: {}",
                status, body
            )));
        }

        info!("Sent \"{}\" for {} ({})", title, record.company_name, record.code);
        Ok(())
    }
}
