//! Notification channels for the composed report.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;

use crate::config::NotifyConfig;
use crate::utils::error::{Error, Result};

/// Delivers one message. Delivery is attempted once.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Posts to Slack's `chat.postMessage`.
#[derive(Clone)]
pub struct SlackNotifier {
    client: reqwest::Client,
    api_url: String,
    channel: String,
    token: String,
}

impl SlackNotifier {
    pub fn new(config: &NotifyConfig, timeout: Duration) -> Result<Self> {
        let token = config
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::ConfigError("Slack token missing; set SLACK_BOT_TOKEN".to_string()))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            channel: config.channel.clone(),
            token,
        })
    }
}

impl fmt::Debug for SlackNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackNotifier")
            .field("api_url", &self.api_url)
            .field("channel", &self.channel)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Slack answers HTTP 200 with `"ok": false` for most API errors.
fn check_slack_response(body: &Value) -> Result<()> {
    if body.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(());
    }
    let reason = body.get("error").and_then(Value::as_str).unwrap_or("unknown error");
    Err(Error::NotifyError(format!("Slack API error: {}", reason)))
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        let resp = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&json!({ "channel": self.channel, "text": message }))
            .send()
            .await
            .map_err(|e| Error::NotifyError(format!("Slack request failed: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::NotifyError(format!("Slack http {}: {}", status, body)));
        }
        let body: Value = resp
            .json()
            .await
            .map_err(|e| Error::NotifyError(format!("Slack response decode failed: {}", e)))?;
        check_slack_response(&body)?;
        log::debug!("Slack message sent to {}", self.channel);
        Ok(())
    }
}

/// Prints the message to stdout; used for dry runs.
#[derive(Clone, Copy, Default)]
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        println!("{}", message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_slack_response_check() {
        assert!(check_slack_response(&json!({"ok": true, "ts": "1"})).is_ok());
        let err = check_slack_response(&json!({"ok": false, "error": "channel_not_found"})).unwrap_err();
        assert_eq!(err.to_string(), "Notification error: Slack API error: channel_not_found");
        assert!(check_slack_response(&json!({})).is_err());
    }

    #[test]
    fn test_slack_requires_token() {
        let mut config = NotifyConfig::default();
        assert_matches!(SlackNotifier::new(&config, Duration::from_secs(5)), Err(Error::ConfigError(_)));
        config.token = Some("  ".to_string());
        assert_matches!(SlackNotifier::new(&config, Duration::from_secs(5)), Err(Error::ConfigError(_)));
        config.token = Some("xoxb-secret".to_string());
        let notifier = SlackNotifier::new(&config, Duration::from_secs(5)).unwrap();
        let shown = format!("{:?}", notifier);
        assert!(shown.contains("#general"));
        assert!(!shown.contains("xoxb-secret"));
    }

    #[tokio::test]
    async fn test_stdout_notifier_succeeds() {
        assert!(StdoutNotifier.notify("hello").await.is_ok());
    }
}
