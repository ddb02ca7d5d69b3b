//! Persistence, services and background work for the Souq fulfillment core.

pub mod auth;
pub mod context;
pub mod database;
pub mod domain;
pub mod errors;
pub mod notifications;
pub mod settings;

#[cfg(test)]
mod test;

mod uuids;

pub use uuids::TypedUuid;
