// src/services/feed.rs

//! Feed retrieval service.
//!
//! Tries each candidate source in order and returns the first payload that
//! decodes as JSON.

use reqwest::Client;

use crate::error::{AppError, FetchAttempt, Result};
use crate::models::FeedConfig;
use crate::utils::http::create_client;

/// Service for retrieving raw feed payloads.
pub struct FeedClient {
    client: Client,
    urls: Vec<String>,
}

impl FeedClient {
    /// Create a feed client from configuration.
    pub fn new(config: &FeedConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
            urls: config.urls.clone(),
        })
    }

    /// Create a feed client with an existing HTTP client.
    pub fn with_client(client: Client, urls: Vec<String>) -> Self {
        Self { client, urls }
    }

    /// Configured candidate URLs.
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Fetch from the configured candidate URLs.
    pub async fn fetch_default(&self) -> Result<String> {
        self.fetch(&self.urls).await
    }

    /// Fetch the first payload that downloads and decodes as JSON.
    pub async fn fetch(&self, urls: &[String]) -> Result<String> {
        let mut attempts = Vec::new();

        for url in urls {
            match self.fetch_one(url).await {
                Ok(body) => {
                    log::debug!("Fetched {} bytes from {}", body.len(), url);
                    return Ok(body);
                }
                Err(error) => {
                    log::warn!("Feed source {} failed: {}", url, error);
                    attempts.push(FetchAttempt {
                        url: url.clone(),
                        reason: error.to_string(),
                    });
                }
            }
        }

        Err(AppError::Fetch { attempts })
    }

    /// Fetch a single source and check that the body is JSON.
    async fn fetch_one(&self, url: &str) -> Result<String> {
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        serde_json::from_str::<serde_json::Value>(&body)?;
        Ok(body)
    }
}
