//! Souq domain

pub mod carts;
pub mod checkout;
pub mod coupons;
pub mod ledger;
pub mod orders;
pub mod payments;
pub mod products;
pub mod returns;
pub mod shipments;
pub mod users;
pub mod warehouses;
pub mod withdrawals;
