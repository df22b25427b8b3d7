//! Default configuration values for ghostwire.
//!
//! These are the lowest-precedence layer of the settings stack.

use super::{GhostSettings, PlatformSettings};

pub const DEFAULT_TRIGGER_PREFIX: &str = "My cat is";
pub const DEFAULT_SUGGESTION: &str = " a madhouse";
pub const DEFAULT_COMPLETION_ID: &str = "hardcoded-completion";
pub const ACCEPT_COMPLETION_COMMAND: &str = "ghostText.acceptCompletion";
pub const ACCEPT_COMPLETION_TITLE: &str = "Accept Completion";
pub const ALL_DOCUMENTS_PATTERN: &str = "**";

pub const KNOWN_PLATFORM_URL_PATTERN: &str = r"^https://colab\.research\.google\.com/.*";
pub const KNOWN_PLATFORM_IDE_NAME: &str = "colab";
pub const KNOWN_PLATFORM_VERSION_GLOBAL: &str = "colabVersionTag";

/// Value reported for any IDE field that cannot be determined.
pub const UNKNOWN: &str = "unknown";

/// Config file name, looked up in the project root and the user config dir.
pub const CONFIG_FILE_NAME: &str = "ghostwire.toml";

/// Returns the default settings layer.
pub fn default_settings() -> GhostSettings {
    GhostSettings {
        trigger_prefix: Some(DEFAULT_TRIGGER_PREFIX.to_string()),
        suggestion: Some(DEFAULT_SUGGESTION.to_string()),
        completion_id: Some(DEFAULT_COMPLETION_ID.to_string()),
        command_id: Some(ACCEPT_COMPLETION_COMMAND.to_string()),
        document_pattern: Some(ALL_DOCUMENTS_PATTERN.to_string()),
        platform: Some(PlatformSettings {
            url_pattern: Some(KNOWN_PLATFORM_URL_PATTERN.to_string()),
            ide_name: Some(KNOWN_PLATFORM_IDE_NAME.to_string()),
            version_global: Some(KNOWN_PLATFORM_VERSION_GLOBAL.to_string()),
            force: None,
        }),
    }
}
