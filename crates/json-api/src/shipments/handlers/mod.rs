//! Shipment Handlers

pub(crate) mod available;
pub(crate) mod get;
pub(crate) mod transitions;
