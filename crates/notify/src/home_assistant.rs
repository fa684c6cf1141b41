//! Home Assistant REST API notifier.
//!
//! Delivers mobile push notifications by calling a Home Assistant notify
//! service (`POST /api/services/notify/<service>`) with a long-lived access
//! token. Without a token the notifier is inert: sends fail with a config
//! error and connection checks report false.

use std::time::Duration;

use crate::traits::{Notification, Notifier, NotifyError};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);
const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HomeAssistantNotifier {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HomeAssistantNotifier {
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }

    /// Split `notify.mobile_app_x` into the service-call domain and name.
    /// A bare service name defaults to the `notify` domain.
    fn split_service(notify_service: &str) -> (&str, &str) {
        match notify_service.split_once('.') {
            Some((domain, service)) => (domain, service),
            None => ("notify", notify_service),
        }
    }

    fn token(&self) -> Result<&str, NotifyError> {
        self.token
            .as_deref()
            .ok_or_else(|| NotifyError::Config("HA_TOKEN not configured".to_string()))
    }

    fn payload(notification: &Notification) -> serde_json::Value {
        let mut body = serde_json::json!({
            "title": notification.title,
            "message": notification.message,
        });

        let mut data = match &notification.data {
            serde_json::Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        if !notification.actions.is_empty() {
            data.insert(
                "actions".to_string(),
                serde_json::json!(notification.actions),
            );
        }
        if !data.is_empty() {
            body["data"] = serde_json::Value::Object(data);
        }
        body
    }
}

#[async_trait::async_trait]
impl Notifier for HomeAssistantNotifier {
    async fn send(
        &self,
        notify_service: &str,
        notification: &Notification,
    ) -> Result<(), NotifyError> {
        let token = self.token()?;
        let (domain, service) = Self::split_service(notify_service);
        let url = format!("{}/api/services/{}/{}", self.base_url, domain, service);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&Self::payload(notification))
            .timeout(SEND_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(
                service = notify_service,
                %status,
                body = %body,
                "Home Assistant notify call failed"
            );
            return Err(NotifyError::Api {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(
            service = notify_service,
            title = %notification.title,
            "Notification delivered"
        );
        Ok(())
    }

    async fn check_connection(&self) -> bool {
        let token = match self.token() {
            Ok(t) => t,
            Err(_) => return false,
        };
        let url = format!("{}/api/", self.base_url);
        match self
            .client
            .get(&url)
            .bearer_auth(token)
            .timeout(CHECK_TIMEOUT)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(status = %response.status(), "Home Assistant API probe rejected");
                false
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Could not reach Home Assistant");
                false
            }
        }
    }

    fn channel_name(&self) -> &str {
        "home_assistant"
    }
}
