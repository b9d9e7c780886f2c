//! Coupon acquisition: quota check, pool pop, persist, cache.

use time::OffsetDateTime;

use promo_core::{Coupon, CouponError, CouponStatus};

use crate::DistributionService;

impl DistributionService {
    /// Claim one coupon of the given template for the user.
    ///
    /// The quota check reads the usable-bucket view; between it and the pool
    /// pop another acquisition can slip in, so a user racing against their
    /// own requests may briefly exceed the limitation. The pop itself is
    /// atomic, so no code is ever handed out twice; the quota overshoot is
    /// accepted.
    pub async fn acquire(&self, user_id: i64, template_id: i64) -> Result<Coupon, CouponError> {
        let snapshots = self.templates.resolve_templates(&[template_id]).await?;
        let snapshot = snapshots
            .get(&template_id)
            .cloned()
            .ok_or(CouponError::TemplateNotFound { template_id })?;

        let usable = self
            .find_coupons_by_status(user_id, CouponStatus::Usable)
            .await?;
        let held = usable
            .iter()
            .filter(|c| c.template_id == template_id)
            .count() as u32;
        let limitation = snapshot.rule.limitation;
        if held >= limitation {
            tracing::info!(user_id, template_id, held, limitation, "quota exhausted");
            return Err(CouponError::QuotaExceeded {
                template_id,
                limitation,
            });
        }

        let code = self
            .pool
            .pop_code(template_id)
            .await?
            .ok_or(CouponError::PoolExhausted { template_id })?;

        let coupon = Coupon::new(template_id, user_id, code, OffsetDateTime::now_utc());
        let mut stored = self.store.insert_coupon(coupon).await?;
        stored.template = Some(snapshot);
        self.cache
            .put(user_id, CouponStatus::Usable, std::slice::from_ref(&stored))
            .await?;

        tracing::info!(
            user_id,
            template_id,
            coupon_id = stored.id,
            "coupon acquired"
        );
        Ok(stored)
    }
}
