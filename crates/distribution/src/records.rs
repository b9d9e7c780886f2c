//! Cache-aside read path for a user's coupon records, including the lazy
//! expiry reclassification on the usable view.

use std::collections::HashSet;

use time::OffsetDateTime;

use promo_core::{Coupon, CouponError, CouponStatus};

use crate::reconcile::ReconciliationMessage;
use crate::DistributionService;

impl DistributionService {
    /// All coupons of one user in one status.
    ///
    /// Cache hit returns the bucket verbatim minus the sentinel. A miss
    /// loads from the durable store; an empty durable result writes the
    /// sentinel into the queried status bucket so the next lookup for that
    /// status does not reach the store again. Sibling buckets are left
    /// untouched; the store may well hold coupons in another status.
    ///
    /// The `Usable` view is reclassified on the way out: coupons past their
    /// effective deadline move to the Expired bucket, the durable store is
    /// told through the reconciliation channel, and only the still-usable
    /// subset is returned. Records whose template snapshot could not be
    /// resolved are returned as-is; without a deadline they cannot be
    /// reclassified, and eligibility checks downstream reject them.
    pub async fn find_coupons_by_status(
        &self,
        user_id: i64,
        status: CouponStatus,
    ) -> Result<Vec<Coupon>, CouponError> {
        let coupons = match self.cache.get(user_id, status).await? {
            Some(bucket) => {
                tracing::debug!(user_id, status = status.code(), "coupon cache hit");
                bucket.into_iter().filter(|c| !c.is_sentinel()).collect()
            }
            None => self.load_and_cache(user_id, status).await?,
        };

        if status != CouponStatus::Usable {
            return Ok(coupons);
        }
        self.reclassify_expired(user_id, coupons).await
    }

    async fn load_and_cache(
        &self,
        user_id: i64,
        status: CouponStatus,
    ) -> Result<Vec<Coupon>, CouponError> {
        let loaded = self.store.find_by_user_and_status(user_id, status).await?;
        if loaded.is_empty() {
            tracing::info!(
                user_id,
                status = status.code(),
                "no coupons on record, caching sentinel"
            );
            self.cache.put_empty(user_id, &[status]).await?;
            return Ok(Vec::new());
        }

        let coupons = self.attach_snapshots(loaded).await?;
        self.cache.put(user_id, status, &coupons).await?;
        Ok(coupons)
    }

    /// Rebuild the denormalized template view on every cache fill.
    async fn attach_snapshots(&self, mut coupons: Vec<Coupon>) -> Result<Vec<Coupon>, CouponError> {
        let template_ids: Vec<i64> = coupons
            .iter()
            .map(|c| c.template_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let snapshots = self.templates.resolve_templates(&template_ids).await?;

        for coupon in &mut coupons {
            coupon.template = snapshots.get(&coupon.template_id).cloned();
            if coupon.template.is_none() {
                tracing::warn!(
                    coupon_id = coupon.id,
                    template_id = coupon.template_id,
                    "coupon references a template that no longer resolves"
                );
            }
        }
        Ok(coupons)
    }

    /// Move expired coupons out of the usable view and announce the
    /// reclassification exactly once per detection.
    async fn reclassify_expired(
        &self,
        user_id: i64,
        coupons: Vec<Coupon>,
    ) -> Result<Vec<Coupon>, CouponError> {
        let now = OffsetDateTime::now_utc();
        let (expired, usable): (Vec<Coupon>, Vec<Coupon>) =
            coupons.into_iter().partition(|c| c.is_expired_at(now));
        if expired.is_empty() {
            return Ok(usable);
        }

        let ids: Vec<i64> = expired.iter().map(|c| c.id).collect();
        tracing::info!(user_id, ?ids, "reclassifying expired coupons");

        let reclassified: Vec<Coupon> = expired
            .into_iter()
            .map(|mut c| {
                c.status = CouponStatus::Expired;
                c
            })
            .collect();
        self.cache
            .put(user_id, CouponStatus::Expired, &reclassified)
            .await?;
        self.cache
            .evict(user_id, CouponStatus::Usable, &ids)
            .await?;
        self.reconciler
            .publish(ReconciliationMessage {
                status: CouponStatus::Expired,
                ids,
            })
            .await?;

        Ok(usable)
    }
}
