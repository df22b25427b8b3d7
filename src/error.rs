//! Error handling types for ghostwire
//!
//! Nothing in this crate lets an error cross into host editor code: these
//! types are produced internally and resolved (usually by logging) at the
//! boundary where the host calls back into us.

use std::sync::PoisonError;
use thiserror::Error;

/// Error type for ghost-text operations
#[derive(Debug, Error)]
pub enum GhostError {
    /// Configuration error
    #[error("Invalid configuration: {message}")]
    Config { message: String },

    /// The injected script URL carried no extension id
    #[error("Missing extension id in script URL: {src}")]
    MissingExtensionId { src: String },

    /// The injected script URL could not be parsed
    #[error("Invalid script URL: {0}")]
    ScriptUrl(#[from] url::ParseError),

    /// The outbound message channel is gone
    #[error("Message channel closed: {channel}")]
    ChannelClosed { channel: String },

    /// No scheduler is available to defer work onto
    #[error("Scheduler unavailable: {message}")]
    Scheduler { message: String },

    /// Message (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ghost-text operations
pub type GhostResult<T> = Result<T, GhostError>;

/// Helper trait to recover from poisoned locks instead of failing.
pub trait LockResultExt<T> {
    /// Convert a PoisonError into the inner guard, logging the recovery.
    ///
    /// The context parameter identifies which operation triggered lock recovery.
    fn recover_poison(self, context: &str) -> T;
}

impl<T> LockResultExt<T> for Result<T, PoisonError<T>> {
    fn recover_poison(self, context: &str) -> T {
        match self {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!(
                    target: "ghostwire::lock_recovery",
                    "Recovered from poisoned lock in {}",
                    context
                );
                poisoned.into_inner()
            }
        }
    }
}

impl GhostError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        GhostError::Config {
            message: message.into(),
        }
    }

    /// Create a missing extension id error
    pub fn missing_extension_id(src: impl Into<String>) -> Self {
        GhostError::MissingExtensionId { src: src.into() }
    }

    /// Create a channel closed error
    pub fn channel_closed(channel: impl Into<String>) -> Self {
        GhostError::ChannelClosed {
            channel: channel.into(),
        }
    }

    /// Create a scheduler error
    pub fn scheduler(message: impl Into<String>) -> Self {
        GhostError::Scheduler {
            message: message.into(),
        }
    }
}
