//! ntfy push notifications
//!
//! Each user owns a topic (stored next to the user record). A message is a
//! plain UTF-8 POST body to `<base_url>/<topic>`. Topics are fixed at
//! registration, so each user's topic is read from the store once and then
//! served from memory.

use anyhow::Context;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::Notifier;
use crate::config::NtfyConfig;
use crate::error::{Result, WatchError};
use crate::store::UserStore;
use crate::types::UserId;

pub struct NtfyNotifier {
    base_url: Url,
    http_client: reqwest::Client,
    store: Arc<dyn UserStore>,
    topics: RwLock<HashMap<UserId, Option<String>>>,
}

impl NtfyNotifier {
    /// Create a notifier that resolves topics through `store`
    pub fn new(config: &NtfyConfig, store: Arc<dyn UserStore>) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid ntfy base URL: {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("ntfy base URL cannot carry a topic path: {}", config.base_url);
        }
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url,
            http_client,
            store,
            topics: RwLock::new(HashMap::new()),
        })
    }

    /// The user's topic, `None` if they have none
    fn topic_for(&self, user: &UserId) -> Result<Option<String>> {
        if let Some(topic) = self.topics.read().ok().and_then(|t| t.get(user).cloned()) {
            return Ok(topic);
        }

        let record = self
            .store
            .user(user)?
            .ok_or_else(|| WatchError::UnknownUser(user.clone()))?;
        let topic = record.ntfy_topic.filter(|t| !t.is_empty());
        if let Ok(mut topics) = self.topics.write() {
            topics.insert(user.clone(), topic.clone());
        }
        Ok(topic)
    }

    /// Publish URL for a topic
    pub fn topic_url(&self, topic: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(topic);
        }
        url
    }
}

#[async_trait]
impl Notifier for NtfyNotifier {
    async fn send(&self, user: &UserId, message: &str) -> Result<()> {
        let Some(topic) = self.topic_for(user)? else {
            debug!("User {} has no ntfy topic, skipping notification", user);
            return Ok(());
        };

        let failed = |reason: String| WatchError::NotificationDeliveryFailed {
            user: user.clone(),
            reason,
        };

        let response = self
            .http_client
            .post(self.topic_url(&topic))
            .body(message.as_bytes().to_vec())
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failed(format!("ntfy returned {}", response.status())));
        }

        debug!("Delivered notification to topic {}", topic);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "ntfy"
    }
}
