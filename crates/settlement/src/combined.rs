//! Combined flat + percentage rule: exactly two coupons, flat applied first
//! when its base is met, then the percentage.
//!
//! Two policies here are deliberately stricter or looser than the
//! single-coupon case:
//! - Eligibility requires the purchased categories to be fully covered by
//!   the union of both templates' category lists (empty difference, not
//!   mere intersection).
//! - Combination legality is an OR across both sides: the pair is legal if
//!   EITHER template's shareable-key set (its own key plus its weight list)
//!   contains both keys. One template can vouch for a combination the other
//!   does not list. The asymmetry is intentional product behavior; do not
//!   tighten it to AND.

use rust_decimal::Decimal;

use promo_core::{CouponCategory, RuleFlag, SelectedCoupon, SettlementInfo};

use crate::executor::{finalize_cost, reject_with_raw_sum, round2, RuleExecutor};

pub struct CombinedExecutor;

impl RuleExecutor for CombinedExecutor {
    fn rule_flag(&self) -> RuleFlag {
        RuleFlag::FlatPercentage
    }

    fn compute(&self, mut info: SettlementInfo) -> SettlementInfo {
        let goods_sum = round2(info.goods_sum());

        if !categories_fully_covered(&info) {
            tracing::debug!(
                user_id = info.user_id,
                "combined coupons do not cover all purchased categories"
            );
            return reject_with_raw_sum(info, goods_sum);
        }

        let (Some(flat), Some(percentage)) = split_pair(&info.coupons) else {
            return reject_with_raw_sum(info, goods_sum);
        };
        let flat = flat.clone();
        let percentage = percentage.clone();

        if !can_share(&flat, &percentage) {
            tracing::debug!(
                user_id = info.user_id,
                flat_key = %flat.template.shared_key(),
                percentage_key = %percentage.template.shared_key(),
                "flat and percentage templates are not combinable"
            );
            return reject_with_raw_sum(info, goods_sum);
        }

        let mut applied = Vec::with_capacity(2);
        let mut target = goods_sum;

        let flat_base = Decimal::from(flat.template.rule.discount.base);
        let flat_quota = Decimal::from(flat.template.rule.discount.quota);
        if target >= flat_base {
            target -= flat_quota;
            applied.push(flat);
        }

        let percentage_quota = Decimal::from(percentage.template.rule.discount.quota);
        target = target * percentage_quota / Decimal::from(100);
        applied.push(percentage);

        info.coupons = applied;
        info.cost = finalize_cost(target);
        info
    }
}

/// Every purchased category must appear in the union of both templates'
/// eligible-category lists.
fn categories_fully_covered(info: &SettlementInfo) -> bool {
    let mut eligible: Vec<i32> = Vec::new();
    for selected in &info.coupons {
        eligible.extend(&selected.template.rule.usage.goods_categories);
    }
    info.goods
        .iter()
        .all(|g| eligible.contains(&g.goods_category))
}

/// Pick the flat and percentage coupons out of the selected pair.
fn split_pair(coupons: &[SelectedCoupon]) -> (Option<&SelectedCoupon>, Option<&SelectedCoupon>) {
    let mut flat = None;
    let mut percentage = None;
    for selected in coupons {
        match selected.template.category {
            CouponCategory::FlatAmount => flat = Some(selected),
            CouponCategory::Percentage => percentage = Some(selected),
            CouponCategory::InstantReduction => {}
        }
    }
    (flat, percentage)
}

/// Combination legality: {flatKey, pctKey} must be a subset of either
/// template's shareable set (own key + weight list). OR across both sides.
fn can_share(flat: &SelectedCoupon, percentage: &SelectedCoupon) -> bool {
    let flat_key = flat.template.shared_key();
    let percentage_key = percentage.template.shared_key();

    let mut flat_shareable = vec![flat_key.clone()];
    flat_shareable.extend(flat.template.rule.weight.iter().cloned());

    let mut percentage_shareable = vec![percentage_key.clone()];
    percentage_shareable.extend(percentage.template.rule.weight.iter().cloned());

    let pair = [flat_key, percentage_key];
    pair.iter().all(|k| flat_shareable.contains(k))
        || pair.iter().all(|k| percentage_shareable.contains(k))
}
