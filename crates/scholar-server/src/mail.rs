//! Outbound mail.
//!
//! The server only ever sends one kind of message, the password-reset link.
//! Delivery is behind [`Mailer`] so deployments can plug in SMTP or an HTTP
//! relay; the default [`LogMailer`] writes the message to the log.

/// A message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
  pub to:      String,
  pub subject: String,
  pub body:    String,
}

pub trait Mailer: Send + Sync {
  fn send(&self, message: Message) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
#[error("mail delivery failed: {0}")]
pub struct MailError(pub String);

/// Logs messages instead of sending them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

impl Mailer for LogMailer {
  fn send(&self, message: Message) -> Result<(), MailError> {
    tracing::info!(
      to = %message.to,
      subject = %message.subject,
      body = %message.body,
      "outbound mail"
    );
    Ok(())
  }
}

/// Build the reset message for `to` pointing at `base_url`.
pub fn reset_message(to: &str, base_url: &str, token: &str) -> Message {
  let link = format!(
    "{}/reset-password?token={token}",
    base_url.trim_end_matches('/')
  );
  Message {
    to:      to.to_owned(),
    subject: "Reset your scholar portal password".to_owned(),
    body:    format!(
      "A password reset was requested for this account.\n\n\
       Open {link} to choose a new password. If you did not ask for this, \
       ignore this message."
    ),
  }
}
