//! Payment Handlers

pub(crate) mod get;
pub(crate) mod webhook;
