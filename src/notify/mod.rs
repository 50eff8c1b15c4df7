//! Notification delivery
//!
//! Supported transports:
//! - ntfy: plain-text push to a per-user topic

pub mod ntfy;

pub use ntfy::NtfyNotifier;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::UserId;

/// Delivers alert text to a user.
///
/// Delivery is fire-and-forget from the monitor's point of view: an error
/// is logged by the caller and never stops a polling pass.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a message to the user's channel
    async fn send(&self, user: &UserId, message: &str) -> Result<()>;

    /// Transport name, for logs
    fn name(&self) -> &'static str;
}
