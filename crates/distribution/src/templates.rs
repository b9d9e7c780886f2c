//! The available-to-acquire template view for one user.

use std::collections::HashMap;

use time::OffsetDateTime;

use promo_core::{CouponError, CouponStatus, TemplateSnapshot};

use crate::DistributionService;

impl DistributionService {
    /// Templates the user can still acquire from: available, not past their
    /// absolute deadline, and with per-template quota remaining.
    pub async fn find_available_templates(
        &self,
        user_id: i64,
    ) -> Result<Vec<TemplateSnapshot>, CouponError> {
        let now = OffsetDateTime::now_utc();
        let templates = self.templates.list_unexpired_templates(now).await?;

        let usable = self
            .find_coupons_by_status(user_id, CouponStatus::Usable)
            .await?;
        let mut held: HashMap<i64, u32> = HashMap::new();
        for coupon in &usable {
            *held.entry(coupon.template_id).or_default() += 1;
        }

        Ok(templates
            .into_iter()
            .filter(|t| held.get(&t.id).copied().unwrap_or(0) < t.rule.limitation)
            .collect())
    }
}
