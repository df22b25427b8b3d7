use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

use ghostwire::config::{SettingsSource, load_settings};
use ghostwire::host::memory::MemoryEditor;
use ghostwire::host::{PageContext, Position};
use ghostwire::platform::PlatformDetector;
use ghostwire::relay::{LogChannel, Relay};
use ghostwire::CompletionProvider;

/// Inspect ghost-text rules outside the browser
#[derive(Parser)]
#[command(name = "ghostwire")]
#[command(version)]
#[command(about = "Inspect ghost-text completion rules outside the browser")]
struct Cli {
    /// Directory holding a project ghostwire.toml
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Settings override as a JSON object (highest precedence)
    #[arg(long, global = true)]
    settings: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the completion list produced for a document
    Complete {
        /// Full document text
        text: String,

        /// Page URL the document is shown on
        #[arg(long, default_value = "about:blank")]
        url: String,

        /// Also run the acceptance path for the first item
        #[arg(long)]
        accept: bool,
    },
    /// Classify a page URL and print the IDE identity
    Classify {
        url: String,

        /// Platform version global value to assume
        #[arg(long)]
        version: Option<String>,
    },
    /// Print the effective settings after merging every layer
    Settings,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let override_settings = match cli
        .settings
        .as_deref()
        .map(serde_json::from_str::<serde_json::Value>)
    {
        None => None,
        Some(Ok(value)) => Some((SettingsSource::CommandLine, value)),
        Some(Err(e)) => {
            eprintln!("Error: --settings is not valid JSON: {}", e);
            std::process::exit(2);
        }
    };
    let outcome = load_settings(cli.root.as_deref(), override_settings);
    for event in &outcome.events {
        event.log();
    }
    let settings = outcome.settings;

    let output = match cli.command {
        Commands::Complete { text, url, accept } => {
            let provider = CompletionProvider::new(
                "cli",
                &PageContext::bare(url),
                &settings,
                Relay::new(Arc::new(LogChannel)),
            );
            let cursor = Position::from_utf16_offset(&text, usize::MAX);
            let editor = MemoryEditor::new(text);
            let list = provider.provide_completions(&editor, cursor);
            if accept && let Some(item) = list.items.first() {
                provider.accepted_completion(item.completion_id());
            }
            serde_json::to_value(list)
        }
        Commands::Classify { url, version } => {
            let detector = PlatformDetector::new_or_default(&settings);
            let kind = detector.classify(&url);
            let globals: std::collections::HashMap<String, String> = version
                .map(|v| (settings.version_global.clone(), v))
                .into_iter()
                .collect();
            serde_json::to_value(detector.ide_info(kind, &globals))
                .map(|ide| json!({ "platform": kind, "ide": ide }))
        }
        Commands::Settings => serde_json::to_value(&settings),
    };

    match output.and_then(|value| serde_json::to_string_pretty(&value)) {
        Ok(text) => println!("{}", text),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
