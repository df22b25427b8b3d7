//! Document URI → editor instance index.
//!
//! Entries are added when an instance is attached and moved when the host
//! swaps the document bound to an instance. There is no detach: an instance
//! disposed without a swap leaves its last URI behind until the page unloads.

use dashmap::DashMap;
use std::sync::{Arc, Weak};

use crate::host::{EditorInstance, EditorRef, ModelChange};

/// The central index of live editor instances, keyed by document URI.
///
/// Cloning shares the same index.
#[derive(Clone, Default)]
pub struct EditorRegistry {
    editors: Arc<DashMap<String, EditorRef>>,
}

impl std::fmt::Debug for EditorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorRegistry")
            .field("uris", &self.uris())
            .finish()
    }
}

fn same_instance(a: *const dyn EditorInstance, b: *const dyn EditorInstance) -> bool {
    std::ptr::addr_eq(a, b)
}

impl EditorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `instance` under its current document URI and follow its
    /// document swaps from now on.
    pub fn attach(&self, instance: EditorRef) {
        if let Some(uri) = instance.model().map(|model| model.uri()) {
            self.bind(&instance, uri);
        }

        let registry = self.clone();
        let weak: Weak<dyn EditorInstance> = Arc::downgrade(&instance);
        let subscribed = instance.on_did_change_model(Box::new(move |change| {
            registry.rebind(&weak, change);
        }));
        if !subscribed {
            log::debug!(
                target: "ghostwire::registry",
                "Editor does not report document swaps; its entry will not follow rebinding"
            );
        }
    }

    /// Apply one document-swap notification for the instance behind `weak`.
    ///
    /// The old key is removed first, and only if it still points at this
    /// instance, so a late or duplicated notification cannot evict another
    /// editor's entry.
    fn rebind(&self, weak: &Weak<dyn EditorInstance>, change: &ModelChange) {
        if let Some(old_uri) = change.old_model_url.as_deref() {
            self.editors
                .remove_if(old_uri, |_, editor| same_instance(Arc::as_ptr(editor), weak.as_ptr()));
        }

        if let Some(new_uri) = change.new_model_url.as_deref()
            && let Some(instance) = weak.upgrade()
        {
            self.bind(&instance, new_uri.to_string());
        }
    }

    /// Point `uri` at `instance`, dropping any other key the instance still holds.
    fn bind(&self, instance: &EditorRef, uri: String) {
        let target = Arc::as_ptr(instance);
        self.editors
            .retain(|key, editor| key == &uri || !same_instance(Arc::as_ptr(editor), target));
        self.editors.insert(uri, Arc::clone(instance));
    }

    pub fn get(&self, uri: &str) -> Option<EditorRef> {
        self.editors.get(uri).map(|entry| Arc::clone(entry.value()))
    }

    pub fn is_empty(&self) -> bool {
        self.editors.is_empty()
    }

    /// All indexed URIs, sorted.
    pub fn uris(&self) -> Vec<String> {
        let mut uris: Vec<String> = self.editors.iter().map(|e| e.key().clone()).collect();
        uris.sort();
        uris
    }

    /// URIs currently pointing at `instance`, sorted.
    pub fn uris_for(&self, instance: &EditorRef) -> Vec<String> {
        let target = Arc::as_ptr(instance);
        let mut uris: Vec<String> = self
            .editors
            .iter()
            .filter(|e| same_instance(Arc::as_ptr(e.value()), target))
            .map(|e| e.key().clone())
            .collect();
        uris.sort();
        uris
    }
}
