//! Domain types for the Promo coupon service.
//!
//! Everything here is storage-agnostic: closed vocabularies, the template
//! and coupon records, and the settlement value objects the rule engine
//! operates on. Service crates build on these types; nothing in this crate
//! performs I/O.

pub mod coupon;
pub mod error;
pub mod settlement;
pub mod template;
pub mod vocab;

pub use coupon::{Coupon, SENTINEL_COUPON_ID};
pub use error::CouponError;
pub use settlement::{GoodsInfo, SelectedCoupon, SettlementInfo};
pub use template::{
    CouponTemplate, Discount, Expiration, TemplateRequest, TemplateRule, TemplateSnapshot, Usage,
};
pub use vocab::{CouponCategory, CouponStatus, DistributeTarget, PeriodType, ProductLine, RuleFlag};
