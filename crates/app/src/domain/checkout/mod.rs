//! Checkout

pub(crate) mod assembler;
mod cache;
pub mod data;
pub mod errors;
pub mod service;

pub use errors::CheckoutServiceError;
pub use service::*;
