//! Remote profile service adapters.

mod http;
mod memory;

pub use http::HttpProfileRepo;
pub use memory::InMemoryProfileRepo;
