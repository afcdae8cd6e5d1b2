//! Notification Abstractions
//!
//! The catalog announces newly created albums through a host-provided mail
//! transport. Delivery is best effort: callers log failures and move on.

use async_trait::async_trait;
use tracing::info;

use crate::error::Result;

/// Outbound mail transport
///
/// Implementations typically wrap an SMTP relay or a transactional mail API.
/// The core never retries a failed send.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::notification::Mailer;
///
/// async fn announce(mailer: &dyn Mailer) {
///     mailer.send("New album 42", "Created").await.ok();
/// }
/// ```
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send a message with the given subject and HTML body
    async fn send(&self, subject: &str, body: &str) -> Result<()>;
}

/// Mailer that only writes messages to the log
///
/// Used when no mail transport is configured.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, subject: &str, body: &str) -> Result<()> {
        info!(subject, body, "Mail dispatched to log");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_never_fails() {
        let mailer = LogMailer;
        mailer.send("New album 1", "<strong>Test</strong>").await.unwrap();
    }
}
