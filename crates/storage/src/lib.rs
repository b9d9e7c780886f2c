//! Storage abstractions for the Promo coupon service.
//!
//! The service touches three external shared resources: the durable store
//! (templates and coupon records), the per-user coupon cache, and the
//! per-template code pool. Each is a trait here, with in-memory reference
//! backends for tests and local runs.

mod error;
pub mod memory;
mod traits;

pub use error::StorageError;
pub use memory::{MemoryCache, MemoryCodePool, MemoryStore};
pub use traits::{CodePool, CouponCache, CouponStore, TemplateStore};
