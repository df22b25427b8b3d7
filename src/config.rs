pub mod defaults;
pub mod loader;
pub mod user;

use serde::{Deserialize, Serialize};

use crate::platform::PlatformKind;
use defaults::*;

pub use loader::{
    SettingsEvent, SettingsEventKind, SettingsLoadOutcome, SettingsSource, load_settings,
};

/// Settings as written in a config layer. Every field is optional so layers
/// can be merged; see [`EffectiveSettings`] for the resolved form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GhostSettings {
    /// Prefix the document must start with to get a suggestion.
    #[serde(default)]
    pub trigger_prefix: Option<String>,
    /// Text offered as ghost text.
    #[serde(default)]
    pub suggestion: Option<String>,
    /// Identifier threaded back to the acceptance command.
    #[serde(default)]
    pub completion_id: Option<String>,
    /// Name under which the acceptance command is registered.
    #[serde(default)]
    pub command_id: Option<String>,
    /// Document pattern the provider is registered for.
    #[serde(default)]
    pub document_pattern: Option<String>,
    #[serde(default)]
    pub platform: Option<PlatformSettings>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlatformSettings {
    /// Regex matched against the page URL to detect the known platform.
    #[serde(default)]
    pub url_pattern: Option<String>,
    #[serde(default)]
    pub ide_name: Option<String>,
    /// Page global holding the platform version.
    #[serde(default)]
    pub version_global: Option<String>,
    /// Skip URL detection and use this classification.
    #[serde(default)]
    pub force: Option<PlatformKind>,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveSettings {
    pub trigger_prefix: String,
    pub suggestion: String,
    pub completion_id: String,
    pub command_id: String,
    pub document_pattern: String,
    pub url_pattern: String,
    pub ide_name: String,
    pub version_global: String,
    pub forced_platform: Option<PlatformKind>,
}

impl Default for EffectiveSettings {
    fn default() -> Self {
        Self::from(GhostSettings::default())
    }
}

impl From<GhostSettings> for EffectiveSettings {
    fn from(settings: GhostSettings) -> Self {
        let platform = settings.platform.unwrap_or_default();
        Self {
            trigger_prefix: settings
                .trigger_prefix
                .unwrap_or_else(|| DEFAULT_TRIGGER_PREFIX.to_string()),
            suggestion: settings
                .suggestion
                .unwrap_or_else(|| DEFAULT_SUGGESTION.to_string()),
            completion_id: settings
                .completion_id
                .unwrap_or_else(|| DEFAULT_COMPLETION_ID.to_string()),
            command_id: settings
                .command_id
                .unwrap_or_else(|| ACCEPT_COMPLETION_COMMAND.to_string()),
            document_pattern: settings
                .document_pattern
                .unwrap_or_else(|| ALL_DOCUMENTS_PATTERN.to_string()),
            url_pattern: platform
                .url_pattern
                .unwrap_or_else(|| KNOWN_PLATFORM_URL_PATTERN.to_string()),
            ide_name: platform
                .ide_name
                .unwrap_or_else(|| KNOWN_PLATFORM_IDE_NAME.to_string()),
            version_global: platform
                .version_global
                .unwrap_or_else(|| KNOWN_PLATFORM_VERSION_GLOBAL.to_string()),
            forced_platform: platform.force,
        }
    }
}

/// Merge a list of layers, later layers taking precedence.
pub fn merge_all(configs: &[Option<GhostSettings>]) -> Option<GhostSettings> {
    configs.iter().cloned().reduce(merge_settings).flatten()
}

/// Merge two GhostSettings, preferring values from `primary` over `fallback`
pub fn merge_settings(
    fallback: Option<GhostSettings>,
    primary: Option<GhostSettings>,
) -> Option<GhostSettings> {
    match (fallback, primary) {
        (None, None) => None,
        (Some(settings), None) | (None, Some(settings)) => Some(settings),
        (Some(fallback), Some(primary)) => Some(GhostSettings {
            trigger_prefix: primary.trigger_prefix.or(fallback.trigger_prefix),
            suggestion: primary.suggestion.or(fallback.suggestion),
            completion_id: primary.completion_id.or(fallback.completion_id),
            command_id: primary.command_id.or(fallback.command_id),
            document_pattern: primary.document_pattern.or(fallback.document_pattern),
            platform: merge_platform(fallback.platform, primary.platform),
        }),
    }
}

fn merge_platform(
    fallback: Option<PlatformSettings>,
    primary: Option<PlatformSettings>,
) -> Option<PlatformSettings> {
    match (fallback, primary) {
        (None, None) => None,
        (Some(settings), None) | (None, Some(settings)) => Some(settings),
        (Some(fallback), Some(primary)) => Some(PlatformSettings {
            url_pattern: primary.url_pattern.or(fallback.url_pattern),
            ide_name: primary.ide_name.or(fallback.ide_name),
            version_global: primary.version_global.or(fallback.version_global),
            force: primary.force.or(fallback.force),
        }),
    }
}
