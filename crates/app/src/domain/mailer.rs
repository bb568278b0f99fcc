//! Outbound mail.

use std::fmt;

use async_trait::async_trait;
use mockall::automock;
use thiserror::Error;
use tracing::info;

use crate::domain::users::records::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    UserWelcome,
}

impl Template {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UserWelcome => "user_welcome",
        }
    }
}

/// A message ready for delivery.
#[derive(Clone, PartialEq, Eq)]
pub struct Message {
    pub recipient: String,
    pub template: Template,
    pub user: UserId,

    /// Plaintext activation token for the template body.
    pub activation_token: String,
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("recipient", &self.recipient)
            .field("template", &self.template)
            .field("user", &self.user)
            .field("activation_token", &"**redacted**")
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("mail delivery failed: {0}")]
    Delivery(String),
}

#[automock]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &Message) -> Result<(), MailerError>;
}

/// Records delivery intent in the log instead of talking to a mail server.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &Message) -> Result<(), MailerError> {
        info!(
            recipient = %message.recipient,
            template = message.template.name(),
            user = %message.user,
            "mail handed off for delivery"
        );

        Ok(())
    }
}
