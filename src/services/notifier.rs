// src/services/notifier.rs

//! Announcement sinks.
//!
//! The pipeline hands each new event to a [`Notifier`] as one pre-rendered
//! string, already cut to [`Notifier::max_length`]. Delivery failures are
//! reported back; retrying is left to the sink.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{Config, NotifierKind};
use crate::utils::http::create_client;

/// Trait for announcement sinks.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Maximum announcement length in graphemes.
    fn max_length(&self) -> usize;

    /// Deliver one announcement.
    async fn notify(&self, text: &str) -> Result<()>;
}

/// Notifier that writes announcements to the log.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    max_length: usize,
}

impl LogNotifier {
    pub fn new(max_length: usize) -> Self {
        Self { max_length }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn max_length(&self) -> usize {
        self.max_length
    }

    async fn notify(&self, text: &str) -> Result<()> {
        log::info!("ANNOUNCE {}", text);
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookBody<'a> {
    text: &'a str,
}

/// Notifier that POSTs announcements as JSON to a webhook.
///
/// Credentials are sent verbatim as request headers.
pub struct WebhookNotifier {
    client: Client,
    url: String,
    credentials: BTreeMap<String, String>,
    max_length: usize,
}

impl WebhookNotifier {
    pub fn new(
        client: Client,
        url: impl Into<String>,
        credentials: BTreeMap<String, String>,
        max_length: usize,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            credentials,
            max_length,
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn max_length(&self) -> usize {
        self.max_length
    }

    async fn notify(&self, text: &str) -> Result<()> {
        let mut request = self.client.post(&self.url).json(&WebhookBody { text });
        for (name, value) in &self.credentials {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().await.map_err(AppError::notify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::notify(format!(
                "webhook {} answered {}",
                self.url, status
            )));
        }
        log::debug!("Webhook accepted announcement ({})", status);
        Ok(())
    }
}

/// Build the notifier selected in configuration.
pub fn build_notifier(config: &Config) -> Result<Arc<dyn Notifier>> {
    let max_length = config.announcement.max_length;
    match config.notifier.kind {
        NotifierKind::Log => Ok(Arc::new(LogNotifier::new(max_length))),
        NotifierKind::Webhook => {
            let url = config
                .notifier
                .webhook_url
                .clone()
                .ok_or_else(|| AppError::config("notifier.webhook_url is not set"))?;
            let client = create_client(&config.feed)?;
            Ok(Arc::new(WebhookNotifier::new(
                client,
                url,
                config.notifier.credentials.clone(),
                max_length,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_webhook_posts_text_with_credentials() {
        let mut server = mockito::Server::new_async().await;
        let hook = server
            .mock("POST", "/hook")
            .match_header("authorization", "Bearer secret")
            .match_body(Matcher::Json(serde_json::json!({"text": "SISMO. 4.8"})))
            .with_status(204)
            .create_async()
            .await;

        let mut credentials = BTreeMap::new();
        credentials.insert("Authorization".to_string(), "Bearer secret".to_string());
        let notifier = WebhookNotifier::new(
            Client::new(),
            format!("{}/hook", server.url()),
            credentials,
            280,
        );

        notifier.notify("SISMO. 4.8").await.unwrap();
        hook.assert_async().await;
    }

    #[tokio::test]
    async fn test_webhook_rejection_is_notify_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/hook")
            .with_status(401)
            .create_async()
            .await;

        let notifier = WebhookNotifier::new(
            Client::new(),
            format!("{}/hook", server.url()),
            BTreeMap::new(),
            280,
        );

        let err = notifier.notify("SISMO").await.unwrap_err();
        assert!(matches!(err, AppError::Notify(_)));
    }

    #[tokio::test]
    async fn test_log_notifier_accepts() {
        let notifier = LogNotifier::new(140);
        assert_eq!(notifier.max_length(), 140);
        notifier.notify("SISMO").await.unwrap();
    }

    #[test]
    fn test_build_notifier_requires_webhook_url() {
        let mut config = Config::default();
        config.notifier.kind = NotifierKind::Webhook;
        assert!(build_notifier(&config).is_err());

        config.notifier.webhook_url = Some("https://hooks.example.com/q".into());
        let notifier = build_notifier(&config).unwrap();
        assert_eq!(notifier.max_length(), 280);
    }
}
