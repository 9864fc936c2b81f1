//! Log-only notifier, used when SMTP is not configured.

use async_trait::async_trait;
use dailyspend_core::notifier::{Notifier, NotifyError, OutgoingMessage};

/// Writes each notification to the log instead of sending it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), NotifyError> {
        tracing::info!(
            recipients = ?message.recipients,
            subject = %message.subject,
            body = %message.body,
            "Notification (log only, SMTP not configured)"
        );
        Ok(())
    }
}
