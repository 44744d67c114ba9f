//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete
//! types. Ports exist for:
//! - Local persistence (could swap JSON file -> sqlite or browser storage)
//! - The remote profile service (could swap HTTP -> any hosted store)
//! - Authentication (supplies identity, gates sync)
//! - Clock (for testing delayed effects without sleeping)

mod error;
mod external;
mod repos;
mod testing;

pub use error::{RemoteError, StorageError};
pub use external::{AuthPort, Identity, ProfileRecord, ProfileRepo};
pub use repos::{ProgressRepo, ReminderRepo};
pub use testing::ClockPort;

// Test-only mocks (only available during test builds)
#[cfg(test)]
pub use external::{MockAuthPort, MockProfileRepo};
#[cfg(test)]
pub use repos::{MockProgressRepo, MockReminderRepo};
#[cfg(test)]
pub use testing::MockClockPort;
