//! Email provider trait and error types

use super::{EmailMessage, EmailSendResult};
use async_trait::async_trait;
use thiserror::Error;

/// Email provider error types
#[derive(Error, Debug)]
pub enum EmailProviderError {
    #[error("Email provider not configured")]
    NotConfigured,

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Trait for email providers
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Send an email message
    async fn send(&self, message: &EmailMessage) -> Result<EmailSendResult, EmailProviderError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::EmailAddress;

    #[tokio::test]
    async fn test_mock_email_provider() {
        let mut mock = MockEmailProvider::new();

        mock.expect_provider_name().returning(|| "mock");
        mock.expect_send()
            .returning(|_| Ok(EmailSendResult::success(Some("msg-123".to_string()))));

        assert_eq!(mock.provider_name(), "mock");

        let message = EmailMessage::new(EmailAddress::new("test@example.com"), "Test", "<p>Hi</p>");
        let result = mock.send(&message).await.unwrap();
        assert!(result.success);
    }
}
