//! Inline ghost-text completions for a page-embedded Monaco editor.
//!
//! The host page owns the editor library; this crate intercepts the page's
//! assignment of the library global ([`interceptor`]), registers a completion
//! provider exactly once ([`completion`]), tracks which editor shows which
//! document ([`registry`]), and relays events to the extension runtime
//! ([`relay`]). Host APIs are modelled as optional capabilities in [`host`].

pub mod completion;
pub mod config;
pub mod error;
pub mod host;
pub mod interceptor;
pub mod platform;
pub mod registry;
pub mod relay;
pub mod session;

pub use completion::{CompletionList, CompletionProvider, InlineCompletion, TextRange};
pub use config::{EffectiveSettings, GhostSettings};
pub use error::{GhostError, GhostResult};
pub use interceptor::{EnvironmentInterceptor, InterceptorState};
pub use platform::{IdeIdentity, PlatformKind};
pub use registry::EditorRegistry;
pub use relay::{Relay, RelayMessage};
pub use session::{Session, SessionConfig};
