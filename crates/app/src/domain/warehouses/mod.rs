//! Regional Warehouses

pub mod errors;
pub(crate) mod repository;
pub mod service;

pub use errors::WarehousesServiceError;
pub use service::*;
