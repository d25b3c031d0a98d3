use async_trait::async_trait;
use log::{error, info, warn};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Telegram token or chat id not configured")]
    MissingCredentials,
    /// Carries no request URL, which would contain the bot token.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    #[error("unexpected response {status}: {body}")]
    Status { status: StatusCode, body: String },
}

#[async_trait]
pub trait Notifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError>;
}

pub struct TelegramNotifier {
    client: Client,
    base_api_url: String,
    token: Option<String>,
    chat_id: Option<String>,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(
        base_api_url: String,
        token: Option<String>,
        chat_id: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::new(),
            base_api_url,
            token,
            chat_id,
            timeout,
        }
    }

    async fn send(&self, token: &str, chat_id: &str, message: &str) -> Result<(), NotifyError> {
        let base_url = self.base_api_url.trim_end_matches('/');
        let url = format!("{base_url}/bot{token}/sendMessage");
        let response = self
            .client
            .post(&url)
            .form(&[("chat_id", chat_id), ("text", message)])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.without_url()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Status { status, body });
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<(), NotifyError> {
        let (Some(token), Some(chat_id)) = (self.token.as_deref(), self.chat_id.as_deref()) else {
            warn!("{}", NotifyError::MissingCredentials);
            return Err(NotifyError::MissingCredentials);
        };

        match self.send(token, chat_id, message).await {
            Ok(()) => {
                info!("Notification sent to chat {chat_id}");
                Ok(())
            }
            Err(e) => {
                error!("Error sending Telegram message: {e}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, mock};

    fn notifier(token: Option<&str>, chat_id: Option<&str>) -> TelegramNotifier {
        TelegramNotifier::new(
            mockito::server_url(),
            token.map(str::to_string),
            chat_id.map(str::to_string),
            Duration::from_secs(10),
        )
    }

    #[tokio::test]
    async fn test_notify_posts_form() {
        let m = mock("POST", "/bot111:ok/sendMessage")
            .match_header(
                "content-type",
                "application/x-www-form-urlencoded",
            )
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("chat_id=42".into()),
                Matcher::Regex("text=Price".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .expect(1)
            .create();

        let result = notifier(Some("111:ok"), Some("42"))
            .notify("Price dropped")
            .await;

        assert!(result.is_ok());
        m.assert();
    }

    #[tokio::test]
    async fn test_notify_non_200_is_reported() {
        let m = mock("POST", "/bot222:bad/sendMessage")
            .with_status(400)
            .with_body(r#"{"ok":false,"description":"Bad Request: chat not found"}"#)
            .expect(1)
            .create();

        let result = notifier(Some("222:bad"), Some("42")).notify("hello").await;

        match result {
            Err(NotifyError::Status { status, body }) => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert!(body.contains("chat not found"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        m.assert();
    }

    #[tokio::test]
    async fn test_notify_without_credentials_is_a_no_op() {
        let m = mock("POST", "/bot333:unused/sendMessage")
            .with_status(200)
            .expect(0)
            .create();

        let result = notifier(Some("333:unused"), None).notify("hello").await;
        assert!(matches!(result, Err(NotifyError::MissingCredentials)));

        let result = notifier(None, Some("42")).notify("hello").await;
        assert!(matches!(result, Err(NotifyError::MissingCredentials)));

        m.assert();
    }

    #[tokio::test]
    async fn test_notify_transport_error() {
        let notifier = TelegramNotifier::new(
            "http://127.0.0.1:9".to_string(),
            Some("444:down".to_string()),
            Some("42".to_string()),
            Duration::from_secs(1),
        );

        let result = notifier.notify("hello").await;
        assert!(matches!(result, Err(NotifyError::Transport(_))));
    }

    #[tokio::test]
    async fn test_transport_error_hides_token() {
        let notifier = TelegramNotifier::new(
            "http://127.0.0.1:9".to_string(),
            Some("SECRET123:tok".to_string()),
            Some("42".to_string()),
            Duration::from_secs(1),
        );

        let error = notifier.notify("hello").await.expect_err("connection refused");
        let text = error.to_string();
        assert!(!text.contains("SECRET123"), "token leaked: {text}");
        assert!(!format!("{error:?}").contains("SECRET123"));
    }
}
