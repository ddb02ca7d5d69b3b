//! Ledger
//!
//! Balance and transaction history. Users read their own account, admins any account via
//! `?user=`.

pub(crate) mod balance;
pub(crate) mod history;
