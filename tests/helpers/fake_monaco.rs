//! A host library double that behaves like Monaco's global API surface.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ghostwire::CompletionList;
use ghostwire::host::{
    CommandArguments, CommandHandler, DocumentSelector, EditorApi, EditorCreatedHook,
    EditorInstance, EditorRef, InlineCompletionsProvider, LanguagesApi, MonacoLibrary, Position,
};

#[derive(Default)]
struct Registrations {
    providers: Vec<(DocumentSelector, Arc<dyn InlineCompletionsProvider>)>,
    commands: HashMap<String, Vec<CommandHandler>>,
    hooks: Vec<EditorCreatedHook>,
}

#[derive(Default)]
pub struct FakeMonaco {
    registrations: Mutex<Registrations>,
    /// Simulates a build without `languages.registerInlineCompletionsProvider`.
    pub without_inline_completions: bool,
}

impl FakeMonaco {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn without_inline_completions() -> Arc<Self> {
        Arc::new(Self {
            without_inline_completions: true,
            ..Default::default()
        })
    }

    pub fn provider_count(&self) -> usize {
        self.registrations.lock().unwrap().providers.len()
    }

    pub fn command_count(&self, id: &str) -> usize {
        self.registrations
            .lock()
            .unwrap()
            .commands
            .get(id)
            .map_or(0, Vec::len)
    }

    pub fn hook_count(&self) -> usize {
        self.registrations.lock().unwrap().hooks.len()
    }

    pub fn selectors(&self) -> Vec<DocumentSelector> {
        self.registrations
            .lock()
            .unwrap()
            .providers
            .iter()
            .map(|(selector, _)| selector.clone())
            .collect()
    }

    /// Create an editor the way the host does: every creation hook sees it.
    pub fn create_editor(&self, editor: EditorRef) {
        let hooks = self.registrations.lock().unwrap().hooks.clone();
        for hook in hooks {
            hook(Arc::clone(&editor));
        }
    }

    /// Ask every registered provider for completions, as on a keystroke.
    pub fn request_completions(
        &self,
        editor: &dyn EditorInstance,
        position: Position,
    ) -> Vec<CompletionList> {
        let providers: Vec<_> = self
            .registrations
            .lock()
            .unwrap()
            .providers
            .iter()
            .map(|(_, provider)| Arc::clone(provider))
            .collect();
        providers
            .iter()
            .map(|provider| provider.provide_inline_completions(editor, position))
            .collect()
    }

    /// Execute a registered command. Returns false when the id is unknown.
    pub fn execute_command(&self, id: &str, args: CommandArguments) -> bool {
        let handler = self
            .registrations
            .lock()
            .unwrap()
            .commands
            .get(id)
            .and_then(|handlers| handlers.last().cloned());
        match handler {
            Some(handler) => {
                handler(args);
                true
            }
            None => false,
        }
    }
}

impl LanguagesApi for FakeMonaco {
    fn register_inline_completions_provider(
        &self,
        selector: DocumentSelector,
        provider: Arc<dyn InlineCompletionsProvider>,
    ) {
        self.registrations
            .lock()
            .unwrap()
            .providers
            .push((selector, provider));
    }
}

impl EditorApi for FakeMonaco {
    fn register_command(&self, id: &str, handler: CommandHandler) {
        self.registrations
            .lock()
            .unwrap()
            .commands
            .entry(id.to_string())
            .or_default()
            .push(handler);
    }

    fn on_did_create_editor(&self, hook: EditorCreatedHook) {
        self.registrations.lock().unwrap().hooks.push(hook);
    }
}

impl MonacoLibrary for FakeMonaco {
    fn languages(&self) -> Option<&dyn LanguagesApi> {
        (!self.without_inline_completions).then_some(self as &dyn LanguagesApi)
    }

    fn editor(&self) -> Option<&dyn EditorApi> {
        Some(self)
    }
}
