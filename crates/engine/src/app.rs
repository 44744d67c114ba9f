//! Application state and composition.
//!
//! The store and services are constructed once here and passed by reference
//! to everything that needs them - no module-level global state, so tests
//! build fresh instances per case.

use std::path::PathBuf;
use std::sync::Arc;

use chatling_domain::ScenarioId;

use crate::catalog::{CatalogError, ScenarioCatalog};
use crate::events::EventBus;
use crate::infrastructure::auth::StaticAuth;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::persistence::JsonFileStore;
use crate::infrastructure::ports::{AuthPort, ClockPort, Identity, ProfileRepo};
use crate::infrastructure::remote::{HttpProfileRepo, InMemoryProfileRepo};
use crate::stores::ProgressStore;
use crate::use_cases::{
    ParentReport, ProgressUseCases, ReminderService, ScenarioSession, SyncService,
};

/// Runtime configuration, assembled from the environment by the binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory of authored scenario JSON files.
    pub content_dir: PathBuf,
    /// Directory for local records (progress + reminder state).
    pub data_dir: PathBuf,
    /// Base URL of the remote profile service; in-memory stand-in when unset.
    pub remote_url: Option<String>,
    /// Signed-in identity; anonymous when unset.
    pub identity: Option<Identity>,
}

/// Main application state: the scenario catalog plus every service, wired
/// over shared single instances of the store and clock.
pub struct App {
    pub catalog: ScenarioCatalog,
    pub store: Arc<ProgressStore>,
    pub events: EventBus,
    pub sync: Arc<SyncService>,
    pub progress: ProgressUseCases,
    pub reminder: ReminderService,
    pub report: ParentReport,
    clock: Arc<dyn ClockPort>,
}

impl App {
    pub fn build(config: AppConfig) -> Result<Self, CatalogError> {
        let catalog = ScenarioCatalog::load_dir(&config.content_dir)?;

        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock);
        let store = Arc::new(ProgressStore::new(Arc::new(JsonFileStore::new(
            config.data_dir.join("progress.json"),
        ))));

        let remote: Arc<dyn ProfileRepo> = match &config.remote_url {
            Some(url) => Arc::new(HttpProfileRepo::new(url.clone())),
            None => Arc::new(InMemoryProfileRepo::new()),
        };
        let auth: Arc<dyn AuthPort> = Arc::new(match config.identity {
            Some(identity) => StaticAuth::signed_in(identity.user_id, identity.email),
            None => StaticAuth::anonymous(),
        });

        let sync = Arc::new(SyncService::new(
            Arc::clone(&store),
            remote,
            Arc::clone(&auth),
            Arc::clone(&clock),
        ));
        let progress = ProgressUseCases::new(Arc::clone(&store), Arc::clone(&sync));
        let reminder = ReminderService::new(
            Arc::new(JsonFileStore::new(config.data_dir.join("reminder.json"))),
            auth,
            Arc::clone(&clock),
        );

        Ok(Self {
            catalog,
            store,
            events: EventBus::new(),
            sync,
            progress,
            reminder,
            report: ParentReport::default(),
            clock,
        })
    }

    /// Open a walker session for a scenario. `None` when the id isn't in the
    /// catalog.
    pub fn session(&self, scenario_id: &ScenarioId) -> Option<ScenarioSession> {
        let scenario = self.catalog.get(scenario_id)?;
        Some(ScenarioSession::new(
            scenario,
            Arc::clone(&self.store),
            self.events.clone(),
            Arc::clone(&self.sync),
            Arc::clone(&self.clock),
        ))
    }
}
