//! Email side effects wired up as domain event handlers
//!
//! These run only inside the dispatcher loop, never synchronously from the
//! authentication or resolution paths.

use super::dispatcher::{EventHandler, HandlerRegistry};
use crate::domain::{DomainEvent, EventKind};
use crate::email::{EmailAddress, EmailMessage, EmailProvider};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Sends a welcome email once a user is registered or activated.
pub struct WelcomeEmailHandler {
    provider: Arc<dyn EmailProvider>,
}

impl WelcomeEmailHandler {
    pub fn new(provider: Arc<dyn EmailProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl EventHandler for WelcomeEmailHandler {
    fn name(&self) -> &'static str {
        "welcome_email"
    }

    async fn handle(&self, event: &DomainEvent) -> Result<()> {
        let (email, first_name) = match event {
            DomainEvent::UserRegistered { email, first_name, .. }
            | DomainEvent::UserActivated { email, first_name, .. } => (email, first_name),
            _ => return Ok(()),
        };

        let message = EmailMessage::new(
            EmailAddress::with_name(email.clone(), first_name.clone()),
            "Welcome",
            format!(
                "<p>Hi {},</p><p>Your account is ready. You can sign in now.</p>",
                first_name
            ),
        )
        .with_text_body(format!(
            "Hi {},\n\nYour account is ready. You can sign in now.\n",
            first_name
        ));

        let result = self
            .provider
            .send(&message)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("welcome email failed: {}", e)))?;
        info!(to = %email, message_id = ?result.message_id, "Welcome email sent");
        Ok(())
    }
}

/// Sends the activation notice for users awaiting activation.
pub struct ActivationEmailHandler {
    provider: Arc<dyn EmailProvider>,
    activation_base_url: String,
}

impl ActivationEmailHandler {
    pub fn new(provider: Arc<dyn EmailProvider>, activation_base_url: impl Into<String>) -> Self {
        Self {
            provider,
            activation_base_url: activation_base_url.into(),
        }
    }
}

#[async_trait]
impl EventHandler for ActivationEmailHandler {
    fn name(&self) -> &'static str {
        "activation_email"
    }

    async fn handle(&self, event: &DomainEvent) -> Result<()> {
        let (user_id, email, first_name) = match event {
            DomainEvent::UserPendingActivation { user_id, email, first_name, .. } => {
                (user_id, email, first_name)
            }
            _ => return Ok(()),
        };

        let link = format!("{}/activate/{}", self.activation_base_url, user_id);
        let message = EmailMessage::new(
            EmailAddress::with_name(email.clone(), first_name.clone()),
            "Activate your account",
            format!(
                "<p>Hi {},</p><p><a href=\"{}\">Activate your account</a> to get started.</p>",
                first_name, link
            ),
        )
        .with_text_body(format!(
            "Hi {},\n\nActivate your account: {}\n",
            first_name, link
        ));

        let result = self
            .provider
            .send(&message)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("activation email failed: {}", e)))?;
        info!(to = %email, message_id = ?result.message_id, "Activation email sent");
        Ok(())
    }
}

/// Wire the standard email handlers into a registry.
pub fn register_email_handlers(
    registry: &mut HandlerRegistry,
    provider: Arc<dyn EmailProvider>,
    activation_base_url: &str,
) {
    let welcome = Arc::new(WelcomeEmailHandler::new(provider.clone()));
    registry.register(EventKind::UserRegistered, welcome.clone());
    registry.register(EventKind::UserActivated, welcome);
    registry.register(
        EventKind::UserPendingActivation,
        Arc::new(ActivationEmailHandler::new(provider, activation_base_url)),
    );
}
