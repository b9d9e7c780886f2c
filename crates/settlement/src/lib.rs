//! Settlement rule engine.
//!
//! Evaluates one or more selected coupons against a purchase. Each rule
//! kind has its own executor; the manager derives the dispatch flag from
//! the selected coupons' categories and delegates. Ineligible or
//! non-combinable selections are normal outcomes: the raw price comes back
//! with the coupon selection cleared.

mod combined;
pub mod executor;
mod flat;
mod instant;
mod manager;
mod percentage;

pub use combined::CombinedExecutor;
pub use executor::{minimum_charge, round2, RuleExecutor};
pub use flat::FlatExecutor;
pub use instant::InstantExecutor;
pub use manager::ExecuteManager;
pub use percentage::PercentageExecutor;
