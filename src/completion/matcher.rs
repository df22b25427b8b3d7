//! Rules deciding whether a document gets a suggestion.

use crate::config::EffectiveSettings;

/// What to offer for a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub insert_text: String,
    pub completion_id: String,
}

/// A matching rule. Implementations must be pure and fast; they run on every
/// keystroke.
pub trait CompletionMatcher: Send + Sync {
    fn suggest(&self, text: &str) -> Option<Suggestion>;
}

/// Offers a fixed suggestion when the document starts with a trigger string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixTrigger {
    trigger: String,
    suggestion: Suggestion,
}

impl PrefixTrigger {
    pub fn new(
        trigger: impl Into<String>,
        insert_text: impl Into<String>,
        completion_id: impl Into<String>,
    ) -> Self {
        Self {
            trigger: trigger.into(),
            suggestion: Suggestion {
                insert_text: insert_text.into(),
                completion_id: completion_id.into(),
            },
        }
    }

    pub fn from_settings(settings: &EffectiveSettings) -> Self {
        Self::new(
            settings.trigger_prefix.clone(),
            settings.suggestion.clone(),
            settings.completion_id.clone(),
        )
    }
}

impl CompletionMatcher for PrefixTrigger {
    fn suggest(&self, text: &str) -> Option<Suggestion> {
        text.starts_with(&self.trigger).then(|| self.suggestion.clone())
    }
}
