//! Settlement orchestration: ownership check, rule-engine call, and the
//! Used write-back when the discount is actually employed.

use std::collections::HashSet;

use promo_core::{Coupon, CouponError, CouponStatus, SettlementInfo};
use promo_settlement::round2;

use crate::reconcile::ReconciliationMessage;
use crate::DistributionService;

impl DistributionService {
    /// Settle a purchase against the user's selected coupons.
    ///
    /// Ineligible or non-combinable selections are normal outcomes coming
    /// back from the engine with a cleared selection; only a selection that
    /// names coupons the user does not hold is an error. With `employ` set
    /// and a non-empty applied selection, the applied coupons move to the
    /// Used bucket and the durable store learns of it through the
    /// reconciliation channel.
    pub async fn settle(&self, mut info: SettlementInfo) -> Result<SettlementInfo, CouponError> {
        if info.coupons.is_empty() {
            info.cost = round2(info.goods_sum());
            return Ok(info);
        }

        let usable = self
            .find_coupons_by_status(info.user_id, CouponStatus::Usable)
            .await?;
        let owned: HashSet<i64> = usable.iter().map(|c| c.id).collect();
        if let Some(foreign) = info.coupons.iter().find(|c| !owned.contains(&c.id)) {
            tracing::warn!(
                user_id = info.user_id,
                coupon_id = foreign.id,
                "settlement selects a coupon the user does not hold"
            );
            return Err(CouponError::Inconsistent {
                message: format!(
                    "coupon {} is not usable by user {}",
                    foreign.id, info.user_id
                ),
            });
        }

        let result = self.engine.compute_rule(info)?;

        if result.employ && !result.coupons.is_empty() {
            let ids: Vec<i64> = result.coupons.iter().map(|c| c.id).collect();
            let used: Vec<Coupon> = usable
                .into_iter()
                .filter(|c| ids.contains(&c.id))
                .map(|mut c| {
                    c.status = CouponStatus::Used;
                    c
                })
                .collect();

            self.cache
                .put(result.user_id, CouponStatus::Used, &used)
                .await?;
            self.cache
                .evict(result.user_id, CouponStatus::Usable, &ids)
                .await?;
            self.reconciler
                .publish(ReconciliationMessage {
                    status: CouponStatus::Used,
                    ids: ids.clone(),
                })
                .await?;
            tracing::info!(user_id = result.user_id, ?ids, cost = %result.cost, "coupons employed");
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use promo_core::{CouponError, CouponStatus, SelectedCoupon, SettlementInfo};

    use crate::testing::{goods, harness, seed_template, template, Harness};

    async fn acquired_selection(h: &Harness, template_name: &str) -> SelectedCoupon {
        let template_id = seed_template(h, template(template_name, 1), 5).await;
        let coupon = h.service.acquire(9, template_id).await.unwrap();
        SelectedCoupon {
            id: coupon.id,
            template: coupon.template.unwrap(),
        }
    }

    fn info(coupons: Vec<SelectedCoupon>, employ: bool) -> SettlementInfo {
        SettlementInfo {
            user_id: 9,
            goods: vec![goods(1, 12000, 1)],
            coupons,
            employ,
            cost: Decimal::ZERO,
        }
    }

    #[tokio::test]
    async fn employed_settlement_moves_the_coupon_to_used() {
        let mut h = harness();
        let selection = acquired_selection(&h, "flat twenty").await;
        let coupon_id = selection.id;

        let result = h.service.settle(info(vec![selection], true)).await.unwrap();
        // 120.00 with a flat 20-off-100 coupon.
        assert_eq!(result.cost, Decimal::new(10000, 2));
        assert_eq!(result.coupons.len(), 1);

        let message = h.receiver.try_recv().unwrap();
        assert_eq!(message.status, CouponStatus::Used);
        assert_eq!(message.ids, vec![coupon_id]);

        let usable = h
            .service
            .find_coupons_by_status(9, CouponStatus::Usable)
            .await
            .unwrap();
        assert!(usable.is_empty());
        let used = h
            .service
            .find_coupons_by_status(9, CouponStatus::Used)
            .await
            .unwrap();
        assert_eq!(used.len(), 1);
        assert_eq!(used[0].id, coupon_id);
    }

    #[tokio::test]
    async fn trial_settlement_leaves_the_coupon_usable() {
        let mut h = harness();
        let selection = acquired_selection(&h, "flat twenty").await;

        let result = h
            .service
            .settle(info(vec![selection], false))
            .await
            .unwrap();
        assert_eq!(result.cost, Decimal::new(10000, 2));

        assert!(h.receiver.try_recv().is_err());
        let usable = h
            .service
            .find_coupons_by_status(9, CouponStatus::Usable)
            .await
            .unwrap();
        assert_eq!(usable.len(), 1);
    }

    #[tokio::test]
    async fn ineligible_selection_is_not_consumed() {
        let mut h = harness();
        let selection = acquired_selection(&h, "flat twenty").await;

        // Purchased category 3 is outside the template's scope {1}.
        let mut request = info(vec![selection], true);
        request.goods = vec![goods(3, 12000, 1)];

        let result = h.service.settle(request).await.unwrap();
        assert_eq!(result.cost, Decimal::new(12000, 2));
        assert!(result.coupons.is_empty());
        assert!(h.receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn foreign_coupon_selection_is_inconsistent() {
        let h = harness();
        let mut selection = acquired_selection(&h, "flat twenty").await;
        selection.id = 999;

        let err = h
            .service
            .settle(info(vec![selection], true))
            .await
            .unwrap_err();
        assert!(matches!(err, CouponError::Inconsistent { .. }));
    }

    #[tokio::test]
    async fn empty_selection_returns_the_rounded_sum() {
        let h = harness();
        let mut request = info(vec![], true);
        request.goods = vec![goods(1, 33335, 3)]; // 3 x 333.35

        let result = h.service.settle(request).await.unwrap();
        assert_eq!(result.cost, Decimal::new(100005, 2));
        assert!(result.coupons.is_empty());
    }
}
