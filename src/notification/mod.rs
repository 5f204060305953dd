//! Email notification templates and delivery.
//!
//! A [`Template`] maps a model to the three things a mailer needs: who the
//! message goes to, its subject, and the data the body is rendered from.
//! [`render`] turns a template and a model into an [`EmailMessage`], which an
//! [`EmailSender`] delivers.
//!
//! The default sender is [`LogEmailSender`], which logs the message and
//! returns `Ok(())`.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

mod task_update_opened;
mod user_password_forgot;

pub use task_update_opened::{Task, TaskUpdateOpened, TaskUserModel};
pub use user_password_forgot::{PasswordForgotModel, UserPasswordForgot};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    pub to_email: String,
    pub template: String,
    pub subject: String,
    pub payload_json: String,
}

/// Maps a model to recipient, subject and body data for one kind of email.
pub trait Template {
    type Model;

    /// Template identifier, e.g. `task.update.opened`.
    fn name(&self) -> &'static str;

    fn subject(&self) -> &'static str;

    fn recipient(&self, model: &Self::Model) -> String;

    /// Data handed to the body renderer.
    ///
    /// # Errors
    /// Returns an error if the model cannot be serialized.
    fn data(&self, model: &Self::Model) -> Result<serde_json::Value>;
}

/// Build the message for a template and model.
///
/// # Errors
/// Returns an error if the template data cannot be serialized.
pub fn render<T: Template>(template: &T, model: &T::Model) -> Result<EmailMessage> {
    let data = template.data(model)?;
    let payload_json = serde_json::to_string(&data)
        .with_context(|| format!("failed to serialize {} payload", template.name()))?;

    Ok(EmailMessage {
        to_email: template.recipient(model),
        template: template.name().to_string(),
        subject: template.subject().to_string(),
        payload_json,
    })
}

/// Serialize a value into template data.
pub(crate) fn to_data<S: Serialize>(value: &S) -> Result<serde_json::Value> {
    serde_json::to_value(value).context("failed to serialize template data")
}

/// Email delivery abstraction.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error to report it as failed.
    ///
    /// # Errors
    /// Returns an error if delivery fails.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            template = %message.template,
            subject = %message.subject,
            payload = %message.payload_json,
            "email send stub"
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{EmailMessage, EmailSender};
    use anyhow::{bail, Result};
    use std::sync::Mutex;

    /// Sender that records messages, or fails every delivery.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSender {
        pub(crate) sent: Mutex<Vec<EmailMessage>>,
        pub(crate) fail: bool,
    }

    impl RecordingSender {
        pub(crate) fn failing() -> Self {
            Self {
                sent: Mutex::default(),
                fail: true,
            }
        }

        pub(crate) fn messages(&self) -> Vec<EmailMessage> {
            self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
        }
    }

    impl EmailSender for RecordingSender {
        fn send(&self, message: &EmailMessage) -> Result<()> {
            if self.fail {
                bail!("smtp unavailable");
            }
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(message.clone());
            }
            Ok(())
        }
    }
}
