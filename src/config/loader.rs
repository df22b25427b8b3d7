//! Layered settings loading.
//!
//! Loading never fails: every problem is reported as a [`SettingsEvent`] and
//! the offending layer is skipped, so a broken config file degrades to the
//! defaults instead of disabling ghost text.

use serde_json::Value;
use std::fs;
use std::path::Path;

use super::defaults::{CONFIG_FILE_NAME, default_settings};
use super::user::{load_user_config, user_config_path};
use super::{EffectiveSettings, GhostSettings, merge_all};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsEventKind {
    Info,
    Warning,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingsEvent {
    pub kind: SettingsEventKind,
    pub message: String,
}

impl SettingsEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: SettingsEventKind::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: SettingsEventKind::Warning,
            message: message.into(),
        }
    }

    /// Forward the event to the `log` facade.
    pub fn log(&self) {
        match self.kind {
            SettingsEventKind::Info => log::info!(target: "ghostwire::config", "{}", self.message),
            SettingsEventKind::Warning => {
                log::warn!(target: "ghostwire::config", "{}", self.message)
            }
        }
    }
}

/// Where an override layer came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsSource {
    /// Settings handed over by the extension runtime with the injected script.
    ExtensionMessage,
    /// Settings passed on the command line.
    CommandLine,
}

impl SettingsSource {
    fn description(self) -> &'static str {
        match self {
            SettingsSource::ExtensionMessage => "extension settings message",
            SettingsSource::CommandLine => "command line settings",
        }
    }
}

#[derive(Debug)]
pub struct SettingsLoadOutcome {
    pub settings: EffectiveSettings,
    pub events: Vec<SettingsEvent>,
}

pub fn load_settings(
    root_path: Option<&Path>,
    override_settings: Option<(SettingsSource, Value)>,
) -> SettingsLoadOutcome {
    let mut events = Vec::new();

    let defaults = Some(default_settings());
    let user_config = load_user_config_with_events(&mut events);
    let project_settings = load_toml_settings(root_path, &mut events);
    let override_settings = override_settings
        .and_then(|(source, value)| parse_override_settings(source, value, &mut events));

    // defaults < user < project < override
    let merged = merge_all(&[defaults, user_config, project_settings, override_settings]);
    let settings = merged.map(EffectiveSettings::from).unwrap_or_default();

    SettingsLoadOutcome { settings, events }
}

fn load_user_config_with_events(events: &mut Vec<SettingsEvent>) -> Option<GhostSettings> {
    match load_user_config() {
        Ok(Some(settings)) => {
            let path = user_config_path()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "user config dir".to_string());
            events.push(SettingsEvent::info(format!("Loaded user config from {}", path)));
            Some(settings)
        }
        Ok(None) => None,
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to load user config: {}",
                err
            )));
            None
        }
    }
}

fn load_toml_settings(
    root_path: Option<&Path>,
    events: &mut Vec<SettingsEvent>,
) -> Option<GhostSettings> {
    let root = root_path?;
    let config_path = root.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return None;
    }

    events.push(SettingsEvent::info(format!(
        "Found config file: {}",
        config_path.display()
    )));

    match fs::read_to_string(&config_path) {
        Ok(contents) => match toml::from_str::<GhostSettings>(&contents) {
            Ok(settings) => {
                events.push(SettingsEvent::info("Successfully loaded ghostwire.toml"));
                Some(settings)
            }
            Err(err) => {
                events.push(SettingsEvent::warning(format!(
                    "Failed to parse ghostwire.toml: {}",
                    err
                )));
                None
            }
        },
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to read ghostwire.toml: {}",
                err
            )));
            None
        }
    }
}

fn parse_override_settings(
    source: SettingsSource,
    value: Value,
    events: &mut Vec<SettingsEvent>,
) -> Option<GhostSettings> {
    match serde_json::from_value::<GhostSettings>(value) {
        Ok(settings) => {
            events.push(SettingsEvent::info(format!(
                "Parsed {} as GhostSettings",
                source.description()
            )));
            Some(settings)
        }
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to parse {}: {}",
                source.description(),
                err
            )));
            None
        }
    }
}
