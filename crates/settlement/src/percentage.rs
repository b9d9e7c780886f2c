//! Percentage rule: the quota is the percentage of the goods sum the buyer
//! still pays (e.g. quota 85 keeps 85% of the price).

use rust_decimal::Decimal;

use promo_core::{RuleFlag, SettlementInfo};

use crate::executor::{
    categories_intersect, finalize_cost, reject_with_raw_sum, round2, RuleExecutor,
};

pub struct PercentageExecutor;

impl RuleExecutor for PercentageExecutor {
    fn rule_flag(&self) -> RuleFlag {
        RuleFlag::Percentage
    }

    fn compute(&self, mut info: SettlementInfo) -> SettlementInfo {
        let goods_sum = round2(info.goods_sum());

        if !categories_intersect(&info) {
            tracing::debug!(
                user_id = info.user_id,
                "percentage coupon does not match goods"
            );
            return reject_with_raw_sum(info, goods_sum);
        }

        let Some(selected) = info.coupons.first() else {
            return reject_with_raw_sum(info, goods_sum);
        };
        let quota = Decimal::from(selected.template.rule.discount.quota);

        info.cost = finalize_cost(goods_sum * quota / Decimal::from(100));
        info
    }
}
