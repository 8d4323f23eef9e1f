use axum::async_trait;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail api request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("mail api returned status {status}")]
    Api { status: u16 },
}

#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send_verification(&self, to: &str, verify_url: &str) -> anyhow::Result<()>;
}

/// Mail delivery through a JSON HTTP provider API.
#[derive(Clone)]
pub struct HttpMailer {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(api_url: &str, api_key: &str, from: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            from: from.to_string(),
        }
    }

    fn message_body(&self, to: &str, verify_url: &str) -> serde_json::Value {
        json!({
            "from": self.from,
            "to": to,
            "subject": "Verify your email address",
            "text": format!(
                "Welcome! Please confirm your email address by opening this link: {}",
                verify_url
            ),
        })
    }
}

#[async_trait]
impl MailSender for HttpMailer {
    async fn send_verification(&self, to: &str, verify_url: &str) -> anyhow::Result<()> {
        let resp = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&self.message_body(to, verify_url))
            .send()
            .await
            .map_err(MailError::Request)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(MailError::Api {
                status: status.as_u16(),
            }
            .into());
        }
        debug!(%to, "verification mail accepted by provider");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_body_carries_recipient_and_link() {
        let mailer = HttpMailer::new("https://mail.local/send", "key", "no-reply@rolodex.app");
        let body = mailer.message_body("user@example.com", "http://localhost:8080/auth/verify?token=abc");
        assert_eq!(body["from"], "no-reply@rolodex.app");
        assert_eq!(body["to"], "user@example.com");
        assert!(body["text"]
            .as_str()
            .unwrap()
            .contains("/auth/verify?token=abc"));
    }

    #[test]
    fn api_error_displays_status() {
        let err = MailError::Api { status: 502 };
        assert!(err.to_string().contains("502"));
    }
}
