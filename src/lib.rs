//! Souq
//!
//! Souq is the order fulfillment core of a multi-sided marketplace: it prices carts, splits orders
//! into shipment legs routed through regional warehouses, drives those legs through their
//! lifecycle and describes the ledger postings that settle them.
//!
//! Everything in this crate is pure. Persistence and transport live in `souq-app` and `souq-json`.

pub mod actors;
pub mod coupons;
pub mod ledger;
pub mod money;
pub mod orders;
pub mod pricing;
pub mod regions;
pub mod returns;
pub mod routing;
pub mod shipments;
pub mod withdrawals;

#[cfg(test)]
pub(crate) mod fixtures;
