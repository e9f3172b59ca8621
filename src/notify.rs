//! # notify — Notification Sender
//!
//! Pushes one plain-text message to the single configured recipient through
//! the LINE Messaging API. Fire-and-forget: callers log failures and move on.

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use crate::config::NotifyConfig;
use crate::error::NotifyError;

/// LINE rejects text messages longer than this.
const MAX_TEXT_CHARS: usize = 5000;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

pub struct LinePushNotifier {
    client:  reqwest::Client,
    api_url: String,
    token:   String,
    user_id: String,
}

impl LinePushNotifier {
    pub fn new(client: reqwest::Client, config: &NotifyConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token:   config.access_token.clone(),
            user_id: config.user_id.clone(),
        }
    }
}

#[derive(Serialize)]
struct PushRequest<'a> {
    to:       &'a str,
    messages: Vec<TextMessage<'a>>,
}

#[derive(Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    text: &'a str,
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[async_trait]
impl Notifier for LinePushNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/v2/bot/message/push", self.api_url);
        let body = PushRequest {
            to:       &self.user_id,
            messages: vec![TextMessage {
                kind: "text",
                text: truncate_chars(text, MAX_TEXT_CHARS),
            }],
        };

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, body });
        }

        info!(chars = text.chars().count(), "📨 Notification delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: String) -> NotifyConfig {
        NotifyConfig {
            api_url:      url,
            access_token: "line-token".into(),
            user_id:      "U123".into(),
        }
    }

    #[tokio::test]
    async fn pushes_text_to_configured_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/bot/message/push"))
            .and(header("authorization", "Bearer line-token"))
            .and(body_json(json!({
                "to": "U123",
                "messages": [{ "type": "text", "text": "[Scheduled] hello" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = LinePushNotifier::new(reqwest::Client::new(), &config(server.uri()));
        notifier.send("[Scheduled] hello").await.unwrap();
    }

    #[tokio::test]
    async fn rejection_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid token"))
            .mount(&server)
            .await;

        let notifier = LinePushNotifier::new(reqwest::Client::new(), &config(server.uri()));
        let err = notifier.send("x").await.unwrap_err();

        assert!(matches!(err, NotifyError::Rejected { status: 401, .. }));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("トヨタ自動車", 3), "トヨタ");
        assert_eq!(truncate_chars("short", 10), "short");
    }
}
