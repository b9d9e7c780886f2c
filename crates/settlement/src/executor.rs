//! The rule-executor capability and the helpers shared by every executor.

use rust_decimal::{Decimal, RoundingStrategy};

use promo_core::{RuleFlag, SettlementInfo};

/// One settlement rule implementation.
///
/// Executors are pure: they take the settlement context and return it with
/// `cost` filled in and `coupons` pruned to the applied subset (or cleared
/// when the selection does not apply). Registration in the manager is
/// explicit; there is no discovery mechanism.
pub trait RuleExecutor: Send + Sync {
    /// The dispatch tag this executor handles.
    fn rule_flag(&self) -> RuleFlag;

    /// Compute the settlement result.
    fn compute(&self, info: SettlementInfo) -> SettlementInfo;
}

/// Minimum amount any settlement still charges.
pub fn minimum_charge() -> Decimal {
    Decimal::new(10, 2) // 0.10
}

/// Round to 2 decimal places, half away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Single-template eligibility: the purchased categories and the template's
/// eligible categories must intersect. One matching good is enough.
pub fn categories_intersect(info: &SettlementInfo) -> bool {
    let Some(selected) = info.coupons.first() else {
        return false;
    };
    let eligible = &selected.template.rule.usage.goods_categories;
    info.goods
        .iter()
        .any(|g| eligible.contains(&g.goods_category))
}

/// Resolve an ineligible selection: raw price, cleared coupons.
pub fn reject_with_raw_sum(mut info: SettlementInfo, goods_sum: Decimal) -> SettlementInfo {
    info.cost = goods_sum;
    info.coupons.clear();
    info
}

/// Final cost: floored at the minimum charge, rounded to 2 decimals.
pub fn finalize_cost(value: Decimal) -> Decimal {
    round2(value.max(minimum_charge()))
}
