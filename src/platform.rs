//! Hosting-page classification.
//!
//! The page is classified once from its URL when the provider is built. A
//! single-page app that navigates client-side keeps its first classification.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::EffectiveSettings;
use crate::config::defaults::{KNOWN_PLATFORM_URL_PATTERN, UNKNOWN};
use crate::error::{GhostError, GhostResult};
use crate::host::PageGlobals;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    #[default]
    Unspecified,
    /// The page matched the known-platform URL pattern.
    Known,
    /// Set explicitly through settings; never produced by URL matching.
    Custom,
}

/// Name and version reported alongside ghost-text events.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeIdentity {
    pub ide_name: String,
    pub ide_version: String,
}

impl IdeIdentity {
    pub fn new(ide_name: impl Into<String>, ide_version: impl Into<String>) -> Self {
        Self {
            ide_name: ide_name.into(),
            ide_version: ide_version.into(),
        }
    }

    pub fn unknown() -> Self {
        Self::new(UNKNOWN, UNKNOWN)
    }
}

#[derive(Debug, Clone)]
pub struct PlatformDetector {
    url_pattern: Regex,
    ide_name: String,
    version_global: String,
    forced: Option<PlatformKind>,
}

impl PlatformDetector {
    pub fn new(settings: &EffectiveSettings) -> GhostResult<Self> {
        let url_pattern = Regex::new(&settings.url_pattern).map_err(|err| {
            GhostError::config(format!("invalid url pattern {:?}: {}", settings.url_pattern, err))
        })?;
        Ok(Self {
            url_pattern,
            ide_name: settings.ide_name.clone(),
            version_global: settings.version_global.clone(),
            forced: settings.forced_platform,
        })
    }

    /// Build a detector, falling back to the built-in URL pattern when the
    /// configured one does not compile.
    pub fn new_or_default(settings: &EffectiveSettings) -> Self {
        Self::new(settings).unwrap_or_else(|err| {
            log::warn!(target: "ghostwire::platform", "{}; using built-in pattern", err);
            Self {
                url_pattern: Regex::new(KNOWN_PLATFORM_URL_PATTERN)
                    .expect("valid regex for known platform url"),
                ide_name: settings.ide_name.clone(),
                version_global: settings.version_global.clone(),
                forced: settings.forced_platform,
            }
        })
    }

    pub fn classify(&self, current_url: &str) -> PlatformKind {
        if let Some(forced) = self.forced {
            return forced;
        }
        if self.url_pattern.is_match(current_url) {
            PlatformKind::Known
        } else {
            PlatformKind::Unspecified
        }
    }

    /// Identity for `kind`; the version is read from the page on every call.
    pub fn ide_info(&self, kind: PlatformKind, globals: &dyn PageGlobals) -> IdeIdentity {
        match kind {
            PlatformKind::Known => IdeIdentity::new(
                self.ide_name.clone(),
                globals
                    .get_string(&self.version_global)
                    .unwrap_or_else(|| UNKNOWN.to_string()),
            ),
            PlatformKind::Unspecified | PlatformKind::Custom => IdeIdentity::unknown(),
        }
    }
}
