//! Script start-up on both sides of the page boundary.
//!
//! The content script builds the page-script URL (carrying the extension id
//! in its query), reports the injection, and then only forwards ghost-text
//! events. The page script recovers the extension id from its own URL, sends
//! the handshake, and installs the interceptor.

use std::sync::Arc;
use url::Url;

use crate::config::EffectiveSettings;
use crate::error::{GhostError, GhostResult};
use crate::host::{LibraryRef, PageContext};
use crate::interceptor::{EnvironmentInterceptor, Scheduler};
use crate::relay::{ContentRelay, Relay, RelayMessage};

const EXTENSION_ID_PARAM: &str = "id";

/// URL of the page script with the extension id appended.
pub fn page_script_url(script_url: &str, extension_id: &str) -> GhostResult<String> {
    let mut url = Url::parse(script_url)?;
    url.query_pairs_mut()
        .append_pair(EXTENSION_ID_PARAM, extension_id);
    Ok(url.into())
}

/// Extension id carried in the page script's own URL.
pub fn extension_id_from_script_url(script_src: &str) -> GhostResult<String> {
    let url = Url::parse(script_src)?;
    url.query_pairs()
        .find(|(key, _)| key == EXTENSION_ID_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| GhostError::missing_extension_id(script_src))
}

/// Content-script start: returns the URL to inject and the forwarding relay.
pub fn inject_page_script(
    runtime: Relay,
    script_url: &str,
    extension_id: &str,
) -> GhostResult<(String, ContentRelay)> {
    let url = page_script_url(script_url, extension_id)?;
    let content = ContentRelay::new(runtime);
    content.notify_script_injected();
    Ok((url, content))
}

/// Everything the page script needs to start.
pub struct SessionConfig {
    /// `src` of the running page script.
    pub script_src: String,
    pub page: PageContext,
    pub settings: EffectiveSettings,
    /// Channel to the extension runtime.
    pub runtime: Relay,
    /// Channel to the content script in the same window.
    pub window: Relay,
    pub scheduler: Arc<dyn Scheduler>,
}

/// A running page script.
#[derive(Debug)]
pub struct Session {
    extension_id: String,
    interceptor: Arc<EnvironmentInterceptor>,
}

impl Session {
    /// Handshake with the extension and install the interceptor.
    ///
    /// `existing` is whatever the page had already assigned to the library
    /// global before this script ran.
    pub fn start(config: SessionConfig, existing: Option<LibraryRef>) -> GhostResult<Self> {
        let extension_id = extension_id_from_script_url(&config.script_src)?;
        config
            .runtime
            .addressed_to(extension_id.clone())
            .send(&RelayMessage::Success);

        let interceptor = Arc::new(EnvironmentInterceptor::new(
            extension_id.clone(),
            config.page,
            Arc::new(config.settings),
            config.window,
            config.scheduler,
        ));
        if existing.is_some() {
            interceptor.set(existing);
        }
        interceptor.install();

        log::debug!(
            target: "ghostwire::session",
            "Page script started for extension {}",
            extension_id
        );
        Ok(Self {
            extension_id,
            interceptor,
        })
    }

    pub fn extension_id(&self) -> &str {
        &self.extension_id
    }

    /// The accessor standing in for the page's library global.
    pub fn interceptor(&self) -> &Arc<EnvironmentInterceptor> {
        &self.interceptor
    }
}
