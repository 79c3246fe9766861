//! Notification delivery to a Mattermost-compatible incoming webhook.
//!
//! The [`Notifier`] trait is the seam between routing and transport;
//! [`WebhookNotifier`] is the HTTP implementation. One notification is
//! one POST, awaited before the next.

use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::router::{Notification, Target};

/// Errors returned when a notification cannot be delivered.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// HTTP transport failure.
    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The webhook answered with a non-success status.
    #[error("webhook returned non-success status {status}: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Sanitized, truncated response body.
        body: String,
    },
}

/// Something that can deliver a notification.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if delivery failed.
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// JSON body accepted by the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookPayload<'a> {
    /// Message text.
    pub text: &'a str,
    /// `@user` for direct messages or a channel name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    /// Icon URL overriding the webhook default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<&'a str>,
    /// Display name overriding the webhook default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<&'a str>,
}

/// Map a target to the payload `channel` field.
pub fn channel_for(target: &Target) -> Option<String> {
    match target {
        Target::User(user) => Some(format!("@{user}")),
        Target::Channel(name) => Some(name.clone()),
        Target::Default => None,
    }
}

/// Posts notifications to an incoming webhook URL.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    icon: Option<String>,
    username: Option<String>,
}

impl WebhookNotifier {
    /// Create a notifier for `url` with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        url: impl Into<String>,
        icon: Option<String>,
        username: Option<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("callbell/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            icon,
            username,
        })
    }

    /// Build the JSON body for a notification.
    pub fn payload<'a>(&'a self, notification: &'a Notification) -> WebhookPayload<'a> {
        WebhookPayload {
            text: &notification.text,
            channel: channel_for(&notification.target),
            icon: self.icon.as_deref(),
            username: self.username.as_deref(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        let payload = self.payload(notification);
        let response = self.client.post(&self.url).json(&payload).send().await?;
        check_http_response(response).await?;
        debug!(channel = ?payload.channel, "notification delivered");
        Ok(())
    }
}

/// Accept any 2xx response; turn anything else into [`NotifyError::HttpStatus`].
///
/// # Errors
///
/// Returns `NotifyError::Request` on transport failure, `NotifyError::HttpStatus` on non-2xx.
pub async fn check_http_response(response: reqwest::Response) -> Result<(), NotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(NotifyError::HttpStatus {
        status: status.as_u16(),
        body: sanitize_http_error_body(&body),
    })
}

/// Collapse whitespace, mask webhook keys, and cap the length of an error body.
fn sanitize_http_error_body(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut sanitized = collapsed;
    for pattern in [r"hooks/[A-Za-z0-9]{16,}", r"token=[A-Za-z0-9_\-]{8,}"] {
        if let Ok(regex) = Regex::new(pattern) {
            sanitized = regex.replace_all(&sanitized, "[REDACTED]").into_owned();
        }
    }

    const MAX_ERROR_BODY_CHARS: usize = 256;
    if sanitized.chars().count() > MAX_ERROR_BODY_CHARS {
        let shortened = sanitized
            .chars()
            .take(MAX_ERROR_BODY_CHARS)
            .collect::<String>();
        return format!("{shortened}...[truncated]");
    }

    sanitized
}
