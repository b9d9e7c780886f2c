//! Backend traits for the coupon service.
//!
//! Three external shared resources sit behind these traits: the durable
//! store (templates + coupon records), the per-user coupon cache, and the
//! per-template code pool. All implementations must be `Send + Sync +
//! 'static` so they can be shared across async task boundaries by reference.

use std::collections::HashMap;

use async_trait::async_trait;

use promo_core::{Coupon, CouponStatus, CouponTemplate};

use crate::error::StorageError;

/// Durable store for coupon templates.
#[async_trait]
pub trait TemplateStore: Send + Sync + 'static {
    /// Insert a new template, assigning its id. Returns the stored record.
    ///
    /// Fails with `DuplicateTemplate` when a template of the same name
    /// already exists.
    async fn insert_template(&self, template: CouponTemplate)
        -> Result<CouponTemplate, StorageError>;

    /// Load one template by id.
    async fn find_template(&self, template_id: i64) -> Result<CouponTemplate, StorageError>;

    /// Load many templates by id. Missing ids are silently absent from the
    /// result; the caller decides whether that is a degradation or an error.
    async fn find_templates(
        &self,
        template_ids: &[i64],
    ) -> Result<HashMap<i64, CouponTemplate>, StorageError>;

    /// All templates that are available and not expired.
    async fn list_available(&self) -> Result<Vec<CouponTemplate>, StorageError>;

    /// Flip a template to `available = true` and persist the flag.
    async fn mark_available(&self, template_id: i64) -> Result<(), StorageError>;
}

/// Durable store for acquired coupon records.
///
/// Only ids, code, times and status are persisted; template snapshots are a
/// cache-level denormalization and never reach this store.
#[async_trait]
pub trait CouponStore: Send + Sync + 'static {
    /// Insert a new coupon, assigning its id. Returns the stored record.
    async fn insert_coupon(&self, coupon: Coupon) -> Result<Coupon, StorageError>;

    /// All coupons of one user in one status.
    async fn find_by_user_and_status(
        &self,
        user_id: i64,
        status: CouponStatus,
    ) -> Result<Vec<Coupon>, StorageError>;

    /// Load exactly the given ids. Ids that do not resolve are absent from
    /// the result; the reconciliation consumer checks the count.
    async fn find_by_ids(&self, coupon_ids: &[i64]) -> Result<Vec<Coupon>, StorageError>;

    /// Set the status on every given id in one batch. All-or-nothing: on
    /// error no record has been changed.
    async fn update_status(
        &self,
        coupon_ids: &[i64],
        status: CouponStatus,
    ) -> Result<usize, StorageError>;
}

/// Per-(user, status) coupon cache with a sentinel-aware contract.
///
/// `get` distinguishes "never cached" (`None`) from "cached, possibly the
/// sentinel" (`Some`). Writers merge into the bucket atomically per key so
/// concurrent cache writers (read-path reclassification, acquisition,
/// settlement) cannot lose updates.
#[async_trait]
pub trait CouponCache: Send + Sync + 'static {
    /// The cached bucket, verbatim (sentinel included).
    async fn get(
        &self,
        user_id: i64,
        status: CouponStatus,
    ) -> Result<Option<Vec<Coupon>>, StorageError>;

    /// Merge coupons into the bucket, replacing entries with the same
    /// coupon id. The whole read-modify-write is atomic per (user, status).
    async fn put(
        &self,
        user_id: i64,
        status: CouponStatus,
        coupons: &[Coupon],
    ) -> Result<usize, StorageError>;

    /// Write the sentinel into each listed status bucket, marking the empty
    /// result as confirmed.
    async fn put_empty(&self, user_id: i64, statuses: &[CouponStatus])
        -> Result<(), StorageError>;

    /// Drop the given coupon ids from the bucket. Ids not present are
    /// ignored. Used when a reclassification moves coupons out of a bucket.
    async fn evict(
        &self,
        user_id: i64,
        status: CouponStatus,
        coupon_ids: &[i64],
    ) -> Result<(), StorageError>;
}

/// Per-template ordered pool of pre-generated coupon codes.
#[async_trait]
pub trait CodePool: Send + Sync + 'static {
    /// Push a whole batch of codes for one template.
    async fn push_codes(&self, template_id: i64, codes: Vec<String>) -> Result<(), StorageError>;

    /// Atomically dequeue one code. `None` when the pool is exhausted.
    /// Two concurrent poppers must never receive the same code.
    async fn pop_code(&self, template_id: i64) -> Result<Option<String>, StorageError>;

    /// Remaining codes in the template's pool.
    async fn pool_size(&self, template_id: i64) -> Result<usize, StorageError>;
}
