//! Inline completion provider handed to the host library.
//!
//! The host calls [`CompletionProvider::provide_completions`] on every
//! keystroke and cursor move and awaits the result before rendering ghost
//! text. The provider itself never suspends and never fails: no match, or any
//! internal problem, is an empty [`CompletionList`].

pub mod matcher;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::config::EffectiveSettings;
use crate::config::defaults::ACCEPT_COMPLETION_TITLE;
use crate::error::GhostResult;
use crate::host::{
    EditorInstance, EditorOptions, EditorRef, InlineCompletionsProvider, PageContext, PageGlobals,
    Position, TextModel,
};
use crate::platform::{IdeIdentity, PlatformDetector, PlatformKind};
use crate::registry::EditorRegistry;
use crate::relay::{GhostEvent, Relay, RelayMessage};

pub use matcher::{CompletionMatcher, PrefixTrigger, Suggestion};

/// Range replaced by a completion, in one-based host coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextRange {
    pub start_line_number: u32,
    pub start_column: u32,
    pub end_line_number: u32,
    pub end_column: u32,
}

impl TextRange {
    pub fn new(start: Position, end: Position) -> Self {
        Self {
            start_line_number: start.line_number,
            start_column: start.column,
            end_line_number: end.line_number,
            end_column: end.column,
        }
    }

    /// Zero-width range: an insertion point.
    pub fn collapsed(at: Position) -> Self {
        Self::new(at, at)
    }

    pub fn is_empty(&self) -> bool {
        self.start_line_number == self.end_line_number && self.start_column == self.end_column
    }
}

/// Command attached to an item; executed by the host on acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub id: String,
    pub title: String,
    pub arguments: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineCompletion {
    pub insert_text: String,
    /// Text shown as ghost text.
    pub text: String,
    pub range: TextRange,
    pub command: Command,
}

impl InlineCompletion {
    /// The completion id threaded back to the acceptance command.
    pub fn completion_id(&self) -> Option<&str> {
        self.command.arguments.first().and_then(Value::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionList {
    pub items: Vec<InlineCompletion>,
}

impl CompletionList {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Ghost-text provider bound to one extension id.
pub struct CompletionProvider {
    extension_id: String,
    registry: EditorRegistry,
    matcher: Arc<dyn CompletionMatcher>,
    detector: PlatformDetector,
    platform: PlatformKind,
    globals: Arc<dyn PageGlobals>,
    relay: Relay,
    command_id: String,
}

impl std::fmt::Debug for CompletionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionProvider")
            .field("extension_id", &self.extension_id)
            .field("platform", &self.platform)
            .field("command_id", &self.command_id)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl CompletionProvider {
    /// Build a provider; the page is classified here, once.
    pub fn new(
        extension_id: impl Into<String>,
        page: &PageContext,
        settings: &EffectiveSettings,
        relay: Relay,
    ) -> Self {
        let detector = PlatformDetector::new_or_default(settings);
        let platform = detector.classify(&page.location);
        log::debug!(
            target: "ghostwire::completion",
            "Classified {} as {:?}",
            page.location,
            platform
        );

        Self {
            extension_id: extension_id.into(),
            registry: EditorRegistry::new(),
            matcher: Arc::new(PrefixTrigger::from_settings(settings)),
            detector,
            platform,
            globals: Arc::clone(&page.globals),
            relay,
            command_id: settings.command_id.clone(),
        }
    }

    /// Replace the matching rule.
    pub fn with_matcher(mut self, matcher: Arc<dyn CompletionMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn extension_id(&self) -> &str {
        &self.extension_id
    }

    pub fn platform(&self) -> PlatformKind {
        self.platform
    }

    pub fn registry(&self) -> &EditorRegistry {
        &self.registry
    }

    pub fn command_id(&self) -> &str {
        &self.command_id
    }

    pub fn ide_info(&self) -> IdeIdentity {
        self.detector.ide_info(self.platform, self.globals.as_ref())
    }

    /// Language of `model`, preferring the accessor older host builds expose.
    pub fn language_id(&self, model: &dyn TextModel) -> Option<String> {
        model.language_identifier().or_else(|| model.language_id())
    }

    /// Zero or one ghost-text item for the current document.
    ///
    /// The suggestion is inserted at the end of the document regardless of
    /// where the cursor is.
    pub fn provide_completions(
        &self,
        editor: &dyn EditorInstance,
        position: Position,
    ) -> CompletionList {
        match catch_unwind(AssertUnwindSafe(|| self.compute_completions(editor, position))) {
            Ok(list) => list,
            Err(_) => {
                log::error!(
                    target: "ghostwire::completion",
                    "Panic while computing completions; returning none"
                );
                CompletionList::empty()
            }
        }
    }

    fn compute_completions(
        &self,
        editor: &dyn EditorInstance,
        _position: Position,
    ) -> CompletionList {
        let text = editor.get_value();
        let Some(suggestion) = self.matcher.suggest(&text) else {
            return CompletionList::empty();
        };

        let end_offset = text.encode_utf16().count();
        let end = editor
            .get_position_at(end_offset)
            .unwrap_or_else(|| Position::from_utf16_offset(&text, end_offset));

        CompletionList {
            items: vec![InlineCompletion {
                text: suggestion.insert_text.clone(),
                insert_text: suggestion.insert_text,
                range: TextRange::collapsed(end),
                command: Command {
                    id: self.command_id.clone(),
                    title: ACCEPT_COMPLETION_TITLE.to_string(),
                    arguments: vec![Value::String(suggestion.completion_id)],
                },
            }],
        }
    }

    /// [`Self::provide_completions`] as an already-resolved future.
    pub fn provide_completions_ready(
        &self,
        editor: &dyn EditorInstance,
        position: Position,
    ) -> std::future::Ready<CompletionList> {
        std::future::ready(self.provide_completions(editor, position))
    }

    /// Acknowledge an accepted suggestion.
    ///
    /// Runs inside the host's command pipeline, so nothing escapes: failures
    /// and panics are logged and dropped.
    pub fn accepted_completion(&self, completion_id: Option<&str>) {
        match catch_unwind(AssertUnwindSafe(|| self.record_acceptance(completion_id))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                log::error!(
                    target: "ghostwire::completion",
                    "Failed to record accepted completion {:?}: {}",
                    completion_id,
                    err
                );
            }
            Err(_) => {
                log::error!(
                    target: "ghostwire::completion",
                    "Panic while recording accepted completion {:?}",
                    completion_id
                );
            }
        }
    }

    fn record_acceptance(&self, completion_id: Option<&str>) -> GhostResult<()> {
        log::info!(
            target: "ghostwire::completion",
            "Completion accepted: {}",
            completion_id.unwrap_or("<none>")
        );
        self.relay
            .try_send(&RelayMessage::GhostText(GhostEvent::CompletionAccepted {
                completion_id: completion_id.map(str::to_owned),
                ide: self.ide_info(),
            }))
    }

    /// Report that registration against the host finished.
    pub fn notify_activated(&self) {
        self.relay.send(&RelayMessage::GhostText(GhostEvent::Activated {
            ide: self.ide_info(),
        }));
    }

    /// Turn on inline suggestions for `editor` and start tracking it.
    ///
    /// Called from the host's editor-creation hook; a panic in the editor's
    /// own methods is logged and the editor is left untracked.
    pub fn register_editor(&self, editor: EditorRef) {
        if catch_unwind(AssertUnwindSafe(|| self.track_editor(editor))).is_err() {
            log::error!(
                target: "ghostwire::completion",
                "Panic while registering editor; it will not receive ghost text"
            );
        }
    }

    fn track_editor(&self, editor: EditorRef) {
        if !editor.update_options(&EditorOptions::inline_suggest_enabled()) {
            log::debug!(
                target: "ghostwire::completion",
                "Editor does not accept option updates; inline suggestions left as configured"
            );
        }
        self.registry.attach(editor);
    }
}

impl InlineCompletionsProvider for CompletionProvider {
    fn provide_inline_completions(
        &self,
        editor: &dyn EditorInstance,
        position: Position,
    ) -> CompletionList {
        self.provide_completions(editor, position)
    }
}
