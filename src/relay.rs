//! Transport relay between the page context and the extension runtime.
//!
//! Delivery is fire-and-forget. [`Relay::send`] never reports failure: a lost
//! acceptance or diagnostic event must not affect editing. Ingress filtering
//! lives in [`ContentRelay`], which forwards only same-context messages that
//! carry the ghost-text type tag.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::error::{GhostError, GhostResult, LockResultExt};
use crate::platform::IdeIdentity;

/// Type tag carried by every event originating from the injected script.
pub const GHOST_TEXT_TAG: &str = "FROM_GHOST_TEXT";

/// Messages crossing the page/extension boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RelayMessage {
    /// Handshake sent as soon as the injected script starts.
    #[serde(rename = "success")]
    Success,
    /// Sent by the content script once the page script has been injected.
    #[serde(rename = "scriptInjected")]
    ScriptInjected,
    #[serde(rename = "FROM_GHOST_TEXT")]
    GhostText(GhostEvent),
}

/// Events raised by the provider inside the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum GhostEvent {
    /// Registration against the host library completed.
    Activated {
        #[serde(flatten)]
        ide: IdeIdentity,
    },
    /// The user accepted a ghost-text suggestion.
    CompletionAccepted {
        #[serde(rename = "completionId")]
        completion_id: Option<String>,
        #[serde(flatten)]
        ide: IdeIdentity,
    },
}

/// A serialized message plus its optional addressee.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Extension id the message is addressed to, when not broadcast.
    pub recipient: Option<String>,
    pub payload: Value,
}

/// The underlying channel. Implementations may fail; [`Relay`] hides that.
pub trait MessageChannel: Send + Sync {
    fn post(&self, envelope: Envelope) -> GhostResult<()>;
}

/// Outbound event sink with no delivery guarantee.
#[derive(Clone)]
pub struct Relay {
    channel: Arc<dyn MessageChannel>,
    recipient: Option<String>,
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("recipient", &self.recipient)
            .finish_non_exhaustive()
    }
}

impl Relay {
    pub fn new(channel: Arc<dyn MessageChannel>) -> Self {
        Self {
            channel,
            recipient: None,
        }
    }

    /// A relay whose messages are all addressed to `recipient`.
    pub fn addressed_to(&self, recipient: impl Into<String>) -> Self {
        Self {
            channel: Arc::clone(&self.channel),
            recipient: Some(recipient.into()),
        }
    }

    /// Send and forget. Failures are logged at debug level and dropped.
    pub fn send(&self, message: &RelayMessage) {
        if let Err(err) = self.try_send(message) {
            log::debug!(target: "ghostwire::relay", "Dropped outbound message: {}", err);
        }
    }

    /// Send, reporting failure to the caller.
    pub fn try_send(&self, message: &RelayMessage) -> GhostResult<()> {
        let payload = serde_json::to_value(message)?;
        self.post_raw(payload)
    }

    fn post_raw(&self, payload: Value) -> GhostResult<()> {
        self.channel.post(Envelope {
            recipient: self.recipient.clone(),
            payload,
        })
    }
}

/// Declared origin of an inbound window message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource {
    /// Posted by a script running in this same window.
    SameWindow,
    /// Posted by another frame or window.
    Foreign,
}

/// A message observed by the content script's window listener.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowMessage {
    pub source: MessageSource,
    pub data: Value,
}

/// Content-script side of the relay: reports injection and forwards
/// ghost-text events to the extension runtime.
#[derive(Debug, Clone)]
pub struct ContentRelay {
    runtime: Relay,
}

impl ContentRelay {
    pub fn new(runtime: Relay) -> Self {
        Self { runtime }
    }

    pub fn notify_script_injected(&self) {
        self.runtime.send(&RelayMessage::ScriptInjected);
    }

    /// Forward `message` if it passes the origin and type filter.
    ///
    /// Returns whether the message was forwarded. Rejected messages are not an
    /// error; they belong to someone else.
    pub fn handle_window_message(&self, message: &WindowMessage) -> bool {
        if !is_ghost_text_message(message) {
            return false;
        }
        if let Err(err) = self.runtime.post_raw(message.data.clone()) {
            log::debug!(target: "ghostwire::relay", "Dropped forwarded message: {}", err);
        }
        true
    }
}

fn is_ghost_text_message(message: &WindowMessage) -> bool {
    message.source == MessageSource::SameWindow
        && message.data.get("type").and_then(Value::as_str) == Some(GHOST_TEXT_TAG)
}

/// Channel backed by a tokio unbounded queue.
#[derive(Debug, Clone)]
pub struct UnboundedChannel {
    sender: mpsc::UnboundedSender<Envelope>,
}

impl UnboundedChannel {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl MessageChannel for UnboundedChannel {
    fn post(&self, envelope: Envelope) -> GhostResult<()> {
        self.sender
            .send(envelope)
            .map_err(|_| GhostError::channel_closed("unbounded"))
    }
}

/// Channel that only writes messages to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogChannel;

impl MessageChannel for LogChannel {
    fn post(&self, envelope: Envelope) -> GhostResult<()> {
        log::info!(
            target: "ghostwire::relay",
            "-> {}: {}",
            envelope.recipient.as_deref().unwrap_or("runtime"),
            envelope.payload
        );
        Ok(())
    }
}

/// Channel that keeps every posted envelope in memory.
#[derive(Debug, Default)]
pub struct MemoryChannel {
    posted: Mutex<Vec<Envelope>>,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn envelopes(&self) -> Vec<Envelope> {
        self.posted.lock().recover_poison("MemoryChannel::envelopes").clone()
    }

    pub fn payloads(&self) -> Vec<Value> {
        self.envelopes().into_iter().map(|e| e.payload).collect()
    }
}

impl MessageChannel for MemoryChannel {
    fn post(&self, envelope: Envelope) -> GhostResult<()> {
        self.posted
            .lock()
            .recover_poison("MemoryChannel::post")
            .push(envelope);
        Ok(())
    }
}
