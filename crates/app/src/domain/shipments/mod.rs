//! Shipments
//!
//! Legs of physical movement for orders and returns, and the actions that drive them.

pub mod data;
pub mod errors;
pub mod records;
pub(crate) mod repository;
pub mod service;

pub use errors::ShipmentsServiceError;
pub use service::*;
