//! Shared fixtures for service tests.

mod db;
mod helpers;

pub use context::*;
pub use helpers::Placed;
