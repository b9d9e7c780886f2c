//! In-memory backends.
//!
//! Reference implementations of the storage traits backed by
//! `tokio::sync` locks over plain maps. Each trait method holds its lock
//! for the whole read-modify-write, which is what gives `CouponCache::put`
//! its per-bucket atomicity and `CodePool::pop_code` its single-popper
//! guarantee.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use tokio::sync::Mutex;

use promo_core::{Coupon, CouponStatus, CouponTemplate};

use crate::error::StorageError;
use crate::traits::{CodePool, CouponCache, CouponStore, TemplateStore};

/// In-memory durable store for templates and coupon records.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

#[derive(Default)]
struct StoreInner {
    templates: HashMap<i64, CouponTemplate>,
    next_template_id: i64,
    coupons: HashMap<i64, Coupon>,
    next_coupon_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn insert_template(
        &self,
        mut template: CouponTemplate,
    ) -> Result<CouponTemplate, StorageError> {
        let mut inner = self.inner.lock().await;
        if inner.templates.values().any(|t| t.name == template.name) {
            return Err(StorageError::DuplicateTemplate {
                name: template.name,
            });
        }
        inner.next_template_id += 1;
        template.id = inner.next_template_id;
        inner.templates.insert(template.id, template.clone());
        Ok(template)
    }

    async fn find_template(&self, template_id: i64) -> Result<CouponTemplate, StorageError> {
        let inner = self.inner.lock().await;
        inner
            .templates
            .get(&template_id)
            .cloned()
            .ok_or(StorageError::TemplateNotFound { template_id })
    }

    async fn find_templates(
        &self,
        template_ids: &[i64],
    ) -> Result<HashMap<i64, CouponTemplate>, StorageError> {
        let inner = self.inner.lock().await;
        Ok(template_ids
            .iter()
            .filter_map(|id| inner.templates.get(id).map(|t| (*id, t.clone())))
            .collect())
    }

    async fn list_available(&self) -> Result<Vec<CouponTemplate>, StorageError> {
        let inner = self.inner.lock().await;
        let mut templates: Vec<_> = inner
            .templates
            .values()
            .filter(|t| t.available && !t.expired)
            .cloned()
            .collect();
        templates.sort_by_key(|t| t.id);
        Ok(templates)
    }

    async fn mark_available(&self, template_id: i64) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;
        match inner.templates.get_mut(&template_id) {
            Some(template) => {
                template.available = true;
                Ok(())
            }
            None => Err(StorageError::TemplateNotFound { template_id }),
        }
    }
}

#[async_trait]
impl CouponStore for MemoryStore {
    async fn insert_coupon(&self, mut coupon: Coupon) -> Result<Coupon, StorageError> {
        let mut inner = self.inner.lock().await;
        inner.next_coupon_id += 1;
        coupon.id = inner.next_coupon_id;
        // The snapshot is a cache-level concern; the durable row stays minimal.
        let mut stored = coupon.clone();
        stored.template = None;
        inner.coupons.insert(stored.id, stored);
        Ok(coupon)
    }

    async fn find_by_user_and_status(
        &self,
        user_id: i64,
        status: CouponStatus,
    ) -> Result<Vec<Coupon>, StorageError> {
        let inner = self.inner.lock().await;
        let mut coupons: Vec<_> = inner
            .coupons
            .values()
            .filter(|c| c.user_id == user_id && c.status == status)
            .cloned()
            .collect();
        coupons.sort_by_key(|c| c.id);
        Ok(coupons)
    }

    async fn find_by_ids(&self, coupon_ids: &[i64]) -> Result<Vec<Coupon>, StorageError> {
        let inner = self.inner.lock().await;
        Ok(coupon_ids
            .iter()
            .filter_map(|id| inner.coupons.get(id).cloned())
            .collect())
    }

    async fn update_status(
        &self,
        coupon_ids: &[i64],
        status: CouponStatus,
    ) -> Result<usize, StorageError> {
        let mut inner = self.inner.lock().await;
        // All-or-nothing: verify every id resolves before touching any row.
        for id in coupon_ids {
            if !inner.coupons.contains_key(id) {
                return Err(StorageError::CouponNotFound { coupon_id: *id });
            }
        }
        for id in coupon_ids {
            if let Some(coupon) = inner.coupons.get_mut(id) {
                coupon.status = status;
            }
        }
        Ok(coupon_ids.len())
    }
}

/// In-memory coupon cache keyed by (user, status).
#[derive(Default)]
pub struct MemoryCache {
    buckets: Mutex<HashMap<(i64, u8), HashMap<i64, Coupon>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CouponCache for MemoryCache {
    async fn get(
        &self,
        user_id: i64,
        status: CouponStatus,
    ) -> Result<Option<Vec<Coupon>>, StorageError> {
        let buckets = self.buckets.lock().await;
        Ok(buckets.get(&(user_id, status.code())).map(|bucket| {
            let mut coupons: Vec<_> = bucket.values().cloned().collect();
            coupons.sort_by_key(|c| c.id);
            coupons
        }))
    }

    async fn put(
        &self,
        user_id: i64,
        status: CouponStatus,
        coupons: &[Coupon],
    ) -> Result<usize, StorageError> {
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets.entry((user_id, status.code())).or_default();
        // A real write supersedes the sentinel.
        if !coupons.is_empty() {
            bucket.remove(&promo_core::SENTINEL_COUPON_ID);
        }
        for coupon in coupons {
            bucket.insert(coupon.id, coupon.clone());
        }
        Ok(coupons.len())
    }

    async fn put_empty(
        &self,
        user_id: i64,
        statuses: &[CouponStatus],
    ) -> Result<(), StorageError> {
        let mut buckets = self.buckets.lock().await;
        for status in statuses {
            buckets
                .entry((user_id, status.code()))
                .or_default()
                .insert(promo_core::SENTINEL_COUPON_ID, Coupon::sentinel(user_id));
        }
        Ok(())
    }

    async fn evict(
        &self,
        user_id: i64,
        status: CouponStatus,
        coupon_ids: &[i64],
    ) -> Result<(), StorageError> {
        let mut buckets = self.buckets.lock().await;
        if let Some(bucket) = buckets.get_mut(&(user_id, status.code())) {
            for id in coupon_ids {
                bucket.remove(id);
            }
        }
        Ok(())
    }
}

/// In-memory ordered code pool per template.
#[derive(Default)]
pub struct MemoryCodePool {
    pools: Mutex<HashMap<i64, VecDeque<String>>>,
}

impl MemoryCodePool {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CodePool for MemoryCodePool {
    async fn push_codes(&self, template_id: i64, codes: Vec<String>) -> Result<(), StorageError> {
        let mut pools = self.pools.lock().await;
        pools.entry(template_id).or_default().extend(codes);
        Ok(())
    }

    async fn pop_code(&self, template_id: i64) -> Result<Option<String>, StorageError> {
        let mut pools = self.pools.lock().await;
        Ok(pools
            .get_mut(&template_id)
            .and_then(|pool| pool.pop_front()))
    }

    async fn pool_size(&self, template_id: i64) -> Result<usize, StorageError> {
        let pools = self.pools.lock().await;
        Ok(pools.get(&template_id).map_or(0, VecDeque::len))
    }
}
