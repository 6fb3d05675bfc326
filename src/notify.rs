use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::info;

use crate::config::NotifyConfig;

/// Outbound notification capability. Callers treat delivery as
/// fire-and-forget; a failure here must never fail the triggering request.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn limit_exceeded(
        &self,
        email: &str,
        total_calories: f64,
        limit: f64,
    ) -> anyhow::Result<()>;
}

/// Posts mail jobs to an HTTP relay.
#[derive(Clone)]
pub struct MailRelay {
    http: Client,
    endpoint: String,
    from: String,
}

impl MailRelay {
    pub fn new(http: Client, config: &NotifyConfig) -> Self {
        Self {
            http,
            endpoint: config.relay_url.clone(),
            from: config.from.clone(),
        }
    }
}

#[async_trait]
impl Notifier for MailRelay {
    async fn limit_exceeded(
        &self,
        email: &str,
        total_calories: f64,
        limit: f64,
    ) -> anyhow::Result<()> {
        let body = json!({
            "from": self.from,
            "to": email,
            "subject": "Daily Calorie Limit Exceeded",
            "html": format!(
                "<p>Your daily calorie intake ({total_calories} kcal) has exceeded \
                 your set limit of {limit} kcal.</p>"
            ),
        });

        self.http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .context("mail relay request")?
            .error_for_status()
            .context("mail relay status")?;

        info!(to = %email, "limit notification sent");
        Ok(())
    }
}
