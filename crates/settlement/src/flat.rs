//! Flat-amount rule: subtract a fixed quota once the goods sum reaches the
//! template's base threshold.

use rust_decimal::Decimal;

use promo_core::{RuleFlag, SettlementInfo};

use crate::executor::{
    categories_intersect, finalize_cost, reject_with_raw_sum, round2, RuleExecutor,
};

pub struct FlatExecutor;

impl RuleExecutor for FlatExecutor {
    fn rule_flag(&self) -> RuleFlag {
        RuleFlag::Flat
    }

    fn compute(&self, mut info: SettlementInfo) -> SettlementInfo {
        let goods_sum = round2(info.goods_sum());

        if !categories_intersect(&info) {
            tracing::debug!(user_id = info.user_id, "flat coupon does not match goods");
            return reject_with_raw_sum(info, goods_sum);
        }

        // Eligibility established; the first (only) selected coupon drives
        // the arithmetic.
        let Some(selected) = info.coupons.first() else {
            return reject_with_raw_sum(info, goods_sum);
        };
        let base = Decimal::from(selected.template.rule.discount.base);
        let quota = Decimal::from(selected.template.rule.discount.quota);

        if goods_sum < base {
            tracing::debug!(user_id = info.user_id, %goods_sum, %base, "goods sum below flat base");
            return reject_with_raw_sum(info, goods_sum);
        }

        info.cost = finalize_cost(goods_sum - quota);
        info
    }
}
