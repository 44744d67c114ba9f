//! Infrastructure: ports and their concrete adapters.

pub mod auth;
pub mod clock;
pub mod persistence;
pub mod ports;
pub mod remote;
