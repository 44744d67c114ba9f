//! Chatling engine: dialogue graph walker, progress store, sync reconciler.
//!
//! The engine walks authored scenario graphs one node at a time, persists
//! learner progress locally after every transition, reconciles local and
//! remote snapshots when an identity is available, and emits presentation
//! events over an explicit bus. See `chatling-domain` for the pure content
//! and progress types.

pub mod app;
pub mod catalog;
pub mod events;
pub mod infrastructure;
pub mod stores;
pub mod use_cases;

pub use app::{App, AppConfig};
pub use catalog::{CatalogError, ScenarioCatalog};
pub use events::{EventBus, SessionEvent};
pub use stores::ProgressStore;
