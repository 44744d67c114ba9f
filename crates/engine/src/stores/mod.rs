//! State storage modules.
//!
//! - `ProgressStore` - durable user progress, sole writer of the local record

pub mod progress;

pub use progress::ProgressStore;
