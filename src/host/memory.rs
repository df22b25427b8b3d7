//! In-memory editor instance.
//!
//! Behaves like a host editor widget without a page: used by the CLI to run
//! completions offline and by tests to drive document swaps.

use std::sync::{Arc, Mutex};

use super::{
    EditorInstance, EditorOptions, ModelChange, ModelChangeListener, Position, TextModel,
};
use crate::error::LockResultExt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryModel {
    uri: String,
    language_id: Option<String>,
}

impl MemoryModel {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            language_id: None,
        }
    }

    pub fn with_language(mut self, language_id: impl Into<String>) -> Self {
        self.language_id = Some(language_id.into());
        self
    }
}

impl TextModel for MemoryModel {
    fn uri(&self) -> String {
        self.uri.clone()
    }

    fn language_id(&self) -> Option<String> {
        self.language_id.clone()
    }
}

#[derive(Default)]
struct MemoryEditorState {
    text: String,
    model: Option<Arc<MemoryModel>>,
    options: Vec<EditorOptions>,
}

/// Editor instance backed by plain memory.
#[derive(Default)]
pub struct MemoryEditor {
    state: Mutex<MemoryEditorState>,
    listeners: Mutex<Vec<ModelChangeListener>>,
}

impl MemoryEditor {
    pub fn new(text: impl Into<String>) -> Self {
        let editor = Self::default();
        editor.set_value(text);
        editor
    }

    /// Create an editor already bound to a document.
    pub fn with_model(text: impl Into<String>, model: MemoryModel) -> Self {
        let editor = Self::new(text);
        editor
            .state
            .lock()
            .recover_poison("MemoryEditor::with_model")
            .model = Some(Arc::new(model));
        editor
    }

    pub fn set_value(&self, text: impl Into<String>) {
        self.state.lock().recover_poison("MemoryEditor::set_value").text = text.into();
    }

    /// Bind a different document and notify subscribers, like a host swap.
    pub fn set_model(&self, model: Option<MemoryModel>) {
        let change = {
            let mut state = self.state.lock().recover_poison("MemoryEditor::set_model");
            let old = state.model.as_ref().map(|m| m.uri.clone());
            state.model = model.map(Arc::new);
            let new = state.model.as_ref().map(|m| m.uri.clone());
            ModelChange {
                old_model_url: old,
                new_model_url: new,
            }
        };
        self.emit_model_change(&change);
    }

    /// Deliver an arbitrary notification, including ones that disagree with
    /// the actual binding.
    pub fn emit_model_change(&self, change: &ModelChange) {
        let listeners = self.listeners.lock().recover_poison("MemoryEditor::emit");
        for listener in listeners.iter() {
            listener(change);
        }
    }

    /// Every options update received, in order.
    pub fn applied_options(&self) -> Vec<EditorOptions> {
        self.state
            .lock()
            .recover_poison("MemoryEditor::applied_options")
            .options
            .clone()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().recover_poison("MemoryEditor::listener_count").len()
    }
}

impl EditorInstance for MemoryEditor {
    fn get_value(&self) -> String {
        self.state.lock().recover_poison("MemoryEditor::get_value").text.clone()
    }

    fn get_position_at(&self, offset: usize) -> Option<Position> {
        let text = self.get_value();
        Some(Position::from_utf16_offset(&text, offset))
    }

    fn update_options(&self, options: &EditorOptions) -> bool {
        self.state
            .lock()
            .recover_poison("MemoryEditor::update_options")
            .options
            .push(options.clone());
        true
    }

    fn model(&self) -> Option<Arc<dyn TextModel>> {
        let state = self.state.lock().recover_poison("MemoryEditor::model");
        state
            .model
            .as_ref()
            .map(|model| Arc::clone(model) as Arc<dyn TextModel>)
    }

    fn on_did_change_model(&self, listener: ModelChangeListener) -> bool {
        self.listeners
            .lock()
            .recover_poison("MemoryEditor::on_did_change_model")
            .push(listener);
        true
    }
}
