//! Shipments

pub(crate) mod handlers;
pub(crate) mod responses;

pub(crate) use handlers::*;
