//! Owned accessor over the page-global editor-library slot.
//!
//! The page assigns its editor library to a global at a time we do not
//! control: before our script runs, after it, or never. The interceptor sits
//! in front of that slot and reacts to the first useful assignment:
//!
//! ```text
//! Unset --install()--> InterceptedNoLibrary --set(Some(lib))--> Registered
//! ```
//!
//! `Registered` is terminal. Later assignments still update the stored
//! reference, and reads always return exactly what was last assigned.
//!
//! Host registration happens on a later scheduler turn because the library's
//! own setup may still be running in the turn that assigned it.

pub mod scheduler;

use arc_swap::ArcSwapOption;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex};

use crate::completion::CompletionProvider;
use crate::config::EffectiveSettings;
use crate::error::LockResultExt;
use crate::host::{CommandArguments, DocumentSelector, LibraryRef, PageContext};
use crate::relay::Relay;

pub use scheduler::{QueueScheduler, Scheduler, Task, TokioScheduler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptorState {
    /// Accessor not installed; assignments are plain stores.
    Unset,
    /// Accessor installed, waiting for a library that can take our provider.
    InterceptedNoLibrary,
    /// Provider constructed and host registration scheduled.
    Registered,
}

/// The host's environment-configuration global.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    #[serde(rename = "globalAPI", default)]
    pub global_api: bool,
    /// Every other key the page put there, kept untouched.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl EnvironmentConfig {
    pub fn global_api_enabled() -> Self {
        Self {
            global_api: true,
            other: Map::new(),
        }
    }
}

struct Slot {
    state: InterceptorState,
    library: Option<LibraryRef>,
    provider: Option<Arc<CompletionProvider>>,
}

pub struct EnvironmentInterceptor {
    slot: Mutex<Slot>,
    environment: ArcSwapOption<EnvironmentConfig>,
    extension_id: String,
    page: PageContext,
    settings: Arc<EffectiveSettings>,
    relay: Relay,
    scheduler: Arc<dyn Scheduler>,
}

impl std::fmt::Debug for EnvironmentInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentInterceptor")
            .field("state", &self.state())
            .field("extension_id", &self.extension_id)
            .field("page", &self.page)
            .finish_non_exhaustive()
    }
}

impl EnvironmentInterceptor {
    pub fn new(
        extension_id: impl Into<String>,
        page: PageContext,
        settings: Arc<EffectiveSettings>,
        relay: Relay,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        Self {
            slot: Mutex::new(Slot {
                state: InterceptorState::Unset,
                library: None,
                provider: None,
            }),
            environment: ArcSwapOption::empty(),
            extension_id: extension_id.into(),
            page,
            settings,
            relay,
            scheduler,
        }
    }

    pub fn state(&self) -> InterceptorState {
        self.slot.lock().recover_poison("EnvironmentInterceptor::state").state
    }

    /// The provider built on registration, if it happened.
    pub fn provider(&self) -> Option<Arc<CompletionProvider>> {
        self.slot
            .lock()
            .recover_poison("EnvironmentInterceptor::provider")
            .provider
            .clone()
    }

    /// Install the accessor.
    ///
    /// A library stored before installation is assigned again through the
    /// trapped path so it still gets registered.
    pub fn install(&self) {
        let existing = {
            let mut slot = self.slot.lock().recover_poison("EnvironmentInterceptor::install");
            if slot.state != InterceptorState::Unset {
                log::debug!(target: "ghostwire::interceptor", "Accessor already installed");
                return;
            }
            slot.state = InterceptorState::InterceptedNoLibrary;
            slot.library.clone()
        };

        if let Some(library) = existing {
            log::debug!(
                target: "ghostwire::interceptor",
                "Editor library present before interception; re-assigning it"
            );
            self.set(Some(library));
        }
    }

    /// Read the library slot. Always returns the last assigned value.
    pub fn get(&self) -> Option<LibraryRef> {
        self.slot
            .lock()
            .recover_poison("EnvironmentInterceptor::get")
            .library
            .clone()
    }

    /// Assign the library slot.
    ///
    /// The slot lock is never held while host code runs, so the library's
    /// accessors may read the slot back or assign it again.
    pub fn set(&self, library: Option<LibraryRef>) {
        let state = {
            let mut slot = self.slot.lock().recover_poison("EnvironmentInterceptor::set");
            slot.library = library.clone();
            slot.state
        };

        let library = match (state, library) {
            (InterceptorState::InterceptedNoLibrary, Some(library)) => library,
            (InterceptorState::Registered, Some(_)) => {
                log::trace!(
                    target: "ghostwire::interceptor",
                    "Editor library re-assigned after registration; passing through"
                );
                return;
            }
            _ => return,
        };

        let capable = catch_unwind(AssertUnwindSafe(|| library.languages().is_some()));
        if !capable.unwrap_or(false) {
            log::info!(
                target: "ghostwire::interceptor",
                "Editor library cannot register inline completion providers; ghost text stays inactive"
            );
            return;
        }

        let provider = Arc::new(CompletionProvider::new(
            self.extension_id.clone(),
            &self.page,
            &self.settings,
            self.relay.clone(),
        ));

        {
            let mut slot = self.slot.lock().recover_poison("EnvironmentInterceptor::set");
            if slot.state != InterceptorState::InterceptedNoLibrary {
                log::trace!(
                    target: "ghostwire::interceptor",
                    "Registration already claimed by an earlier assignment"
                );
                return;
            }
            slot.state = InterceptorState::Registered;
            slot.provider = Some(Arc::clone(&provider));
        }

        let selector = DocumentSelector::pattern(self.settings.document_pattern.clone());
        self.scheduler.defer(Box::new(move || {
            let registration =
                AssertUnwindSafe(move || register_with_host(&library, provider, selector));
            if catch_unwind(registration).is_err() {
                log::error!(
                    target: "ghostwire::interceptor",
                    "Panic while registering with the editor library; ghost text stays inactive"
                );
            }
        }));
    }

    /// Read the environment configuration, creating a default with the
    /// global API flag on if the page has none yet.
    pub fn environment(&self) -> Arc<EnvironmentConfig> {
        if let Some(config) = self.environment.load_full() {
            return config;
        }
        let created = Arc::new(EnvironmentConfig::global_api_enabled());
        let previous = self
            .environment
            .compare_and_swap(&None::<Arc<EnvironmentConfig>>, Some(Arc::clone(&created)));
        (*previous).clone().unwrap_or(created)
    }

    /// Assign the environment configuration, forcing the global API flag on.
    ///
    /// Together with [`Self::environment`] this keeps the flag on for every
    /// configuration the host can observe, before and after registration.
    pub fn set_environment(&self, config: Option<EnvironmentConfig>) {
        self.environment.store(config.map(|mut config| {
            config.global_api = true;
            Arc::new(config)
        }));
    }
}

fn register_with_host(
    library: &LibraryRef,
    provider: Arc<CompletionProvider>,
    selector: DocumentSelector,
) {
    let Some(languages) = library.languages() else {
        log::info!(
            target: "ghostwire::interceptor",
            "Inline completion registration disappeared before it could run"
        );
        return;
    };
    languages.register_inline_completions_provider(selector, provider.clone());

    match library.editor() {
        Some(editor_api) => {
            let accepting = Arc::clone(&provider);
            editor_api.register_command(
                provider.command_id(),
                Arc::new(move |args: CommandArguments| {
                    accepting.accepted_completion(args.completion_id.as_deref());
                    if let Some(on_accepted) = args.on_accepted {
                        on_accepted();
                    }
                }),
            );

            let tracking = Arc::clone(&provider);
            editor_api.on_did_create_editor(Arc::new(move |editor| {
                tracking.register_editor(editor);
            }));
        }
        None => {
            log::info!(
                target: "ghostwire::interceptor",
                "Editor library has no editor namespace; acceptance command and editor hook skipped"
            );
        }
    }

    log::info!(target: "ghostwire::interceptor", "Ghost text activated for Monaco editor");
    provider.notify_activated();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::{MemoryEditor, MemoryModel};
    use crate::host::{
        CommandHandler, EditorApi, EditorCreatedHook, EditorInstance, EditorRef,
        InlineCompletionsProvider, LanguagesApi, MonacoLibrary, Position,
    };
    use crate::relay::MemoryChannel;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recorder {
        providers: Mutex<Vec<(DocumentSelector, Arc<dyn InlineCompletionsProvider>)>>,
        commands: Mutex<Vec<(String, CommandHandler)>>,
        hooks: Mutex<Vec<EditorCreatedHook>>,
    }

    impl LanguagesApi for Recorder {
        fn register_inline_completions_provider(
            &self,
            selector: DocumentSelector,
            provider: Arc<dyn InlineCompletionsProvider>,
        ) {
            self.providers.lock().unwrap().push((selector, provider));
        }
    }

    impl EditorApi for Recorder {
        fn register_command(&self, id: &str, handler: CommandHandler) {
            self.commands.lock().unwrap().push((id.to_string(), handler));
        }

        fn on_did_create_editor(&self, hook: EditorCreatedHook) {
            self.hooks.lock().unwrap().push(hook);
        }
    }

    #[derive(Default)]
    struct Library {
        recorder: Recorder,
        without_languages: bool,
        without_editor: bool,
    }

    impl MonacoLibrary for Library {
        fn languages(&self) -> Option<&dyn LanguagesApi> {
            (!self.without_languages).then_some(&self.recorder as &dyn LanguagesApi)
        }

        fn editor(&self) -> Option<&dyn EditorApi> {
            (!self.without_editor).then_some(&self.recorder as &dyn EditorApi)
        }
    }

    struct Fixture {
        interceptor: EnvironmentInterceptor,
        scheduler: Arc<QueueScheduler>,
        channel: Arc<MemoryChannel>,
    }

    fn fixture() -> Fixture {
        let scheduler = Arc::new(QueueScheduler::new());
        let channel = Arc::new(MemoryChannel::new());
        let interceptor = EnvironmentInterceptor::new(
            "ext-id",
            PageContext::bare("https://colab.research.google.com/drive/abc"),
            Arc::new(EffectiveSettings::default()),
            Relay::new(channel.clone()),
            scheduler.clone(),
        );
        Fixture {
            interceptor,
            scheduler,
            channel,
        }
    }

    fn same_library(a: &LibraryRef, b: &Arc<Library>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
    }

    /// A library whose namespace accessor reads the page global back.
    #[derive(Default)]
    struct ReentrantLibrary {
        recorder: Recorder,
        interceptor: std::sync::OnceLock<std::sync::Weak<EnvironmentInterceptor>>,
        saw_itself: AtomicUsize,
    }

    impl MonacoLibrary for ReentrantLibrary {
        fn languages(&self) -> Option<&dyn LanguagesApi> {
            if let Some(interceptor) = self.interceptor.get().and_then(|weak| weak.upgrade())
                && interceptor.get().is_some()
            {
                self.saw_itself.fetch_add(1, Ordering::SeqCst);
            }
            Some(&self.recorder)
        }

        fn editor(&self) -> Option<&dyn EditorApi> {
            Some(&self.recorder)
        }
    }

    #[test]
    fn library_accessors_may_read_the_slot_during_assignment() {
        let f = fixture();
        let interceptor = Arc::new(f.interceptor);
        interceptor.install();
        let library = Arc::new(ReentrantLibrary::default());
        let _ = library.interceptor.set(Arc::downgrade(&interceptor));

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        let assigning = Arc::clone(&interceptor);
        let assigned: LibraryRef = library.clone();
        std::thread::spawn(move || {
            assigning.set(Some(assigned));
            let _ = done_tx.send(());
        });

        done_rx
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("assignment must not block on host re-entry");
        assert_eq!(interceptor.state(), InterceptorState::Registered);
        assert_eq!(library.saw_itself.load(Ordering::SeqCst), 1);

        f.scheduler.run_pending();
        assert_eq!(library.recorder.providers.lock().unwrap().len(), 1);
    }

    struct ExplodingLanguages;

    impl LanguagesApi for ExplodingLanguages {
        fn register_inline_completions_provider(
            &self,
            _selector: DocumentSelector,
            _provider: Arc<dyn InlineCompletionsProvider>,
        ) {
            panic!("host registration failed");
        }
    }

    struct ExplodingLibrary;

    impl MonacoLibrary for ExplodingLibrary {
        fn languages(&self) -> Option<&dyn LanguagesApi> {
            Some(&ExplodingLanguages)
        }
    }

    #[test]
    fn host_panic_during_registration_stays_contained() {
        let f = fixture();
        f.interceptor.install();
        f.interceptor.set(Some(Arc::new(ExplodingLibrary)));

        assert_eq!(f.scheduler.run_pending(), 1);
        assert!(f.channel.payloads().is_empty());
        assert_eq!(f.interceptor.state(), InterceptorState::Registered);
    }

    #[test]
    fn install_moves_to_intercepted() {
        let f = fixture();
        assert_eq!(f.interceptor.state(), InterceptorState::Unset);
        f.interceptor.install();
        assert_eq!(f.interceptor.state(), InterceptorState::InterceptedNoLibrary);
    }

    #[test]
    fn registration_is_deferred_to_next_turn() {
        let f = fixture();
        f.interceptor.install();
        let library = Arc::new(Library::default());

        f.interceptor.set(Some(library.clone()));

        assert_eq!(f.interceptor.state(), InterceptorState::Registered);
        assert!(library.recorder.providers.lock().unwrap().is_empty());
        assert_eq!(f.scheduler.run_pending(), 1);

        let providers = library.recorder.providers.lock().unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].0, DocumentSelector::pattern("**"));
        let commands = library.recorder.commands.lock().unwrap();
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].0, "ghostText.acceptCompletion");
        assert_eq!(library.recorder.hooks.lock().unwrap().len(), 1);
    }

    #[test]
    fn null_assignments_before_library_do_not_register() {
        let f = fixture();
        f.interceptor.install();

        f.interceptor.set(None);
        f.interceptor.set(None);
        assert_eq!(f.interceptor.state(), InterceptorState::InterceptedNoLibrary);
        assert_eq!(f.scheduler.pending_count(), 0);

        let library = Arc::new(Library::default());
        f.interceptor.set(Some(library.clone()));
        f.scheduler.run_pending();
        assert_eq!(library.recorder.providers.lock().unwrap().len(), 1);
    }

    #[test]
    fn later_assignments_pass_through_without_registering() {
        let f = fixture();
        f.interceptor.install();
        let first = Arc::new(Library::default());
        let second = Arc::new(Library::default());

        f.interceptor.set(Some(first.clone()));
        f.interceptor.set(None);
        assert!(f.interceptor.get().is_none());
        f.interceptor.set(Some(second.clone()));
        f.interceptor.set(Some(first.clone()));
        f.scheduler.run_pending();

        assert!(same_library(&f.interceptor.get().unwrap(), &first));
        assert_eq!(first.recorder.providers.lock().unwrap().len(), 1);
        assert!(second.recorder.providers.lock().unwrap().is_empty());
    }

    #[test]
    fn library_present_before_install_is_registered_once() {
        let f = fixture();
        let library = Arc::new(Library::default());

        f.interceptor.set(Some(library.clone()));
        assert_eq!(f.interceptor.state(), InterceptorState::Unset);
        assert_eq!(f.scheduler.pending_count(), 0);

        f.interceptor.install();
        f.interceptor.install();
        f.scheduler.run_pending();

        assert_eq!(f.interceptor.state(), InterceptorState::Registered);
        assert_eq!(library.recorder.providers.lock().unwrap().len(), 1);
        assert!(same_library(&f.interceptor.get().unwrap(), &library));
    }

    #[test]
    fn library_without_registration_capability_stays_inert() {
        let f = fixture();
        f.interceptor.install();
        let limited = Arc::new(Library {
            without_languages: true,
            ..Default::default()
        });

        f.interceptor.set(Some(limited.clone()));

        assert_eq!(f.interceptor.state(), InterceptorState::InterceptedNoLibrary);
        assert!(same_library(&f.interceptor.get().unwrap(), &limited));
        assert_eq!(f.scheduler.run_pending(), 0);
        assert!(f.interceptor.provider().is_none());
        assert!(f.channel.payloads().is_empty());
    }

    #[test]
    fn missing_editor_namespace_still_registers_provider() {
        let f = fixture();
        f.interceptor.install();
        let library = Arc::new(Library {
            without_editor: true,
            ..Default::default()
        });

        f.interceptor.set(Some(library.clone()));
        f.scheduler.run_pending();

        assert_eq!(library.recorder.providers.lock().unwrap().len(), 1);
        assert!(library.recorder.commands.lock().unwrap().is_empty());
        assert!(library.recorder.hooks.lock().unwrap().is_empty());
    }

    #[test]
    fn activation_is_reported_through_relay() {
        let f = fixture();
        f.interceptor.install();
        f.interceptor.set(Some(Arc::new(Library::default())));
        assert!(f.channel.payloads().is_empty());

        f.scheduler.run_pending();

        assert_eq!(
            f.channel.payloads(),
            vec![json!({
                "type": "FROM_GHOST_TEXT",
                "event": "activated",
                "ideName": "colab",
                "ideVersion": "unknown"
            })]
        );
    }

    #[test]
    fn acceptance_command_acknowledges_then_runs_callback() {
        let f = fixture();
        f.interceptor.install();
        let library = Arc::new(Library::default());
        f.interceptor.set(Some(library.clone()));
        f.scheduler.run_pending();

        let handler = library.recorder.commands.lock().unwrap()[0].1.clone();
        let channel = f.channel.clone();
        let acknowledged_first = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&acknowledged_first);

        handler(CommandArguments {
            completion_id: Some("hardcoded-completion".into()),
            on_accepted: Some(Box::new(move || {
                // activated + completionAccepted already posted
                flag.store(channel.payloads().len(), Ordering::SeqCst);
            })),
        });
        handler(CommandArguments::default());

        assert_eq!(acknowledged_first.load(Ordering::SeqCst), 2);
        assert_eq!(f.channel.payloads().len(), 3);
    }

    #[test]
    fn creation_hook_registers_editors_with_provider() {
        let f = fixture();
        f.interceptor.install();
        let library = Arc::new(Library::default());
        f.interceptor.set(Some(library.clone()));
        f.scheduler.run_pending();

        let hook = library.recorder.hooks.lock().unwrap()[0].clone();
        let editor = Arc::new(MemoryEditor::with_model(
            "My cat is",
            MemoryModel::new("inmemory://model/1"),
        ));
        let as_ref: EditorRef = editor.clone();
        hook(as_ref);

        let provider = f.interceptor.provider().unwrap();
        assert_eq!(provider.registry().uris(), vec!["inmemory://model/1"]);
        assert_eq!(editor.applied_options().len(), 1);

        let registered = library.recorder.providers.lock().unwrap()[0].1.clone();
        let list = registered.provide_inline_completions(
            editor.as_ref() as &dyn EditorInstance,
            Position::new(1, 10),
        );
        assert_eq!(list.items.len(), 1);
    }

    #[test]
    fn environment_defaults_to_global_api_enabled() {
        let f = fixture();
        let config = f.interceptor.environment();
        assert!(config.global_api);
        assert!(Arc::ptr_eq(&config, &f.interceptor.environment()));
    }

    #[test]
    fn assigned_environment_gets_global_api_forced() {
        let f = fixture();
        let mut page_config: EnvironmentConfig =
            serde_json::from_value(json!({ "baseUrl": "/monaco" })).unwrap();
        assert!(!page_config.global_api);
        page_config.other.insert("locale".into(), json!("en"));

        f.interceptor.set_environment(Some(page_config));

        let config = f.interceptor.environment();
        assert!(config.global_api);
        assert_eq!(
            serde_json::to_value(config.as_ref()).unwrap(),
            json!({ "globalAPI": true, "baseUrl": "/monaco", "locale": "en" })
        );
    }

    #[test]
    fn cleared_environment_is_recreated_on_read() {
        let f = fixture();
        f.interceptor.set_environment(None);
        assert!(f.interceptor.environment().global_api);
    }
}
