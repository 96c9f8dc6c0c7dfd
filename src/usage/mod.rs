//! Subscription tiers and daily usage quotas.

pub mod ledger;
pub mod tier;

pub use ledger::*;
pub use tier::*;
