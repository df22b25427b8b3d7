//! Capability model of the host editor library.
//!
//! The host library is third-party code embedded in a page we do not control.
//! It may be loaded late, may be an older build, or may lack parts of the API
//! entirely. Every extension point is therefore either an `Option`-returning
//! accessor or a trait method with a "not supported" default, and callers are
//! expected to check before use and degrade silently.

pub mod memory;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::completion::CompletionList;

/// Shared handle to a live editor widget owned by the host.
pub type EditorRef = Arc<dyn EditorInstance>;

/// Shared handle to the host library object assigned to the page global.
pub type LibraryRef = Arc<dyn MonacoLibrary>;

/// Listener for document swaps on a single editor instance.
pub type ModelChangeListener = Box<dyn Fn(&ModelChange) + Send + Sync>;

/// Handler invoked by the host when a registered command is executed.
pub type CommandHandler = Arc<dyn Fn(CommandArguments) + Send + Sync>;

/// Hook invoked by the host for every newly created editor instance.
pub type EditorCreatedHook = Arc<dyn Fn(EditorRef) + Send + Sync>;

/// One-based cursor position as the host library reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub line_number: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line_number: u32, column: u32) -> Self {
        Self {
            line_number,
            column,
        }
    }

    /// Compute the position of a UTF-16 offset within `text`.
    ///
    /// Offsets past the end clamp to the end of the text.
    pub fn from_utf16_offset(text: &str, offset: usize) -> Self {
        let mut line_number = 1u32;
        let mut column = 1u32;
        let mut consumed = 0usize;

        for ch in text.chars() {
            let width = ch.len_utf16();
            if consumed + width > offset {
                break;
            }
            consumed += width;
            if ch == '\n' {
                line_number += 1;
                column = 1;
            } else {
                column += width as u32;
            }
        }

        Self::new(line_number, column)
    }
}

/// Payload of a document-swap notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelChange {
    pub old_model_url: Option<String>,
    pub new_model_url: Option<String>,
}

impl ModelChange {
    pub fn new(old_model_url: Option<&str>, new_model_url: Option<&str>) -> Self {
        Self {
            old_model_url: old_model_url.map(str::to_owned),
            new_model_url: new_model_url.map(str::to_owned),
        }
    }
}

/// Options pushed onto an editor instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_suggest: Option<InlineSuggestOptions>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineSuggestOptions {
    pub enabled: bool,
}

impl EditorOptions {
    /// Options that turn on inline suggestion rendering.
    pub fn inline_suggest_enabled() -> Self {
        Self {
            inline_suggest: Some(InlineSuggestOptions { enabled: true }),
        }
    }
}

/// Arguments the host passes when executing a registered command.
#[derive(Default)]
pub struct CommandArguments {
    pub completion_id: Option<String>,
    /// Continuation the host wants run once the command has been handled.
    pub on_accepted: Option<Box<dyn FnOnce() + Send>>,
}

impl std::fmt::Debug for CommandArguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandArguments")
            .field("completion_id", &self.completion_id)
            .field("on_accepted", &self.on_accepted.as_ref().map(|_| "FnOnce"))
            .finish()
    }
}

/// The document currently bound to an editor instance.
pub trait TextModel: Send + Sync {
    /// The host-assigned URI of the document.
    fn uri(&self) -> String;

    /// Language accessor found on older host builds.
    fn language_identifier(&self) -> Option<String> {
        None
    }

    /// Language accessor found on current host builds.
    fn language_id(&self) -> Option<String> {
        None
    }
}

/// One live editor widget.
pub trait EditorInstance: Send + Sync {
    /// Full text of the bound document.
    fn get_value(&self) -> String;

    /// Convert a UTF-16 offset into a position, when the host supports it.
    fn get_position_at(&self, _offset: usize) -> Option<Position> {
        None
    }

    /// Push options onto the instance. Returns `false` when unsupported.
    fn update_options(&self, _options: &EditorOptions) -> bool {
        false
    }

    /// The currently bound document, if any.
    fn model(&self) -> Option<Arc<dyn TextModel>> {
        None
    }

    /// Subscribe to document swaps. Returns `false` when unsupported.
    fn on_did_change_model(&self, _listener: ModelChangeListener) -> bool {
        false
    }
}

/// The provider object handed to the host's inline-completion registry.
pub trait InlineCompletionsProvider: Send + Sync {
    fn provide_inline_completions(
        &self,
        editor: &dyn EditorInstance,
        position: Position,
    ) -> CompletionList;
}

/// Document selector used when registering a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSelector {
    pub pattern: String,
}

impl DocumentSelector {
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }
}

/// The `languages` namespace of the host library.
pub trait LanguagesApi: Send + Sync {
    fn register_inline_completions_provider(
        &self,
        selector: DocumentSelector,
        provider: Arc<dyn InlineCompletionsProvider>,
    );
}

/// The `editor` namespace of the host library.
pub trait EditorApi: Send + Sync {
    fn register_command(&self, id: &str, handler: CommandHandler);

    fn on_did_create_editor(&self, hook: EditorCreatedHook);
}

/// The host library object itself.
pub trait MonacoLibrary: Send + Sync {
    /// Present only when the library can register inline-completion providers.
    fn languages(&self) -> Option<&dyn LanguagesApi> {
        None
    }

    fn editor(&self) -> Option<&dyn EditorApi> {
        None
    }
}

/// Read access to page-global variables.
pub trait PageGlobals: Send + Sync {
    fn get_string(&self, name: &str) -> Option<String>;
}

impl PageGlobals for std::collections::HashMap<String, String> {
    fn get_string(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// What the injected script knows about the page it runs in.
#[derive(Clone)]
pub struct PageContext {
    /// `window.location.href` at script start.
    pub location: String,
    pub globals: Arc<dyn PageGlobals>,
}

impl PageContext {
    pub fn new(location: impl Into<String>, globals: Arc<dyn PageGlobals>) -> Self {
        Self {
            location: location.into(),
            globals,
        }
    }

    /// A page at `location` with no globals of interest.
    pub fn bare(location: impl Into<String>) -> Self {
        Self::new(location, Arc::new(NoGlobals))
    }
}

impl std::fmt::Debug for PageContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageContext")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

/// Page without any globals of interest.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGlobals;

impl PageGlobals for NoGlobals {
    fn get_string(&self, _name: &str) -> Option<String> {
        None
    }
}
