//! Use case modules.

pub mod progress;
pub mod reminder;
pub mod report;
pub mod session;
pub mod sync;

pub use progress::ProgressUseCases;
pub use reminder::{ReminderService, ReminderState, SCENARIOS_BEFORE_REMINDER};
pub use report::{default_rules, ParentReport, ReportRule, NOT_STARTED_MESSAGE};
pub use session::{Affordance, ScenarioSession, SessionError, SYNC_GRACE_PERIOD};
pub use sync::{SyncError, SyncService};
