//! Settlement value objects: a purchase context plus the selected coupons.
//!
//! `SettlementInfo` is constructed per request and never persisted. The rule
//! engine fills in `cost` and prunes `coupons` down to the ones actually
//! applied.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::template::TemplateSnapshot;

/// One purchased line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoodsInfo {
    /// Goods category id, matched against a template's usage scope.
    pub goods_category: i32,
    pub price: Decimal,
    pub count: u32,
}

impl GoodsInfo {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.count)
    }
}

/// A coupon selected for settlement, carried with its template snapshot so
/// the rule engine never re-resolves templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedCoupon {
    /// Coupon record id.
    pub id: i64,
    pub template: TemplateSnapshot,
}

/// Purchase context for one settlement request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementInfo {
    pub user_id: i64,
    pub goods: Vec<GoodsInfo>,
    /// Selected coupons; the engine clears this when the selection does not
    /// apply and prunes it to the applied subset when it does.
    pub coupons: Vec<SelectedCoupon>,
    /// True when this request should mark the applied coupons used on
    /// success (as opposed to a price preview).
    pub employ: bool,
    /// Output: the final cost. Zero until the engine has run.
    pub cost: Decimal,
}

impl SettlementInfo {
    /// Raw sum of all purchased goods, before any coupon.
    pub fn goods_sum(&self) -> Decimal {
        self.goods.iter().map(GoodsInfo::line_total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goods_sum_multiplies_price_by_count() {
        let info = SettlementInfo {
            user_id: 1,
            goods: vec![
                GoodsInfo {
                    goods_category: 1,
                    price: Decimal::new(2550, 2), // 25.50
                    count: 2,
                },
                GoodsInfo {
                    goods_category: 2,
                    price: Decimal::new(1000, 2), // 10.00
                    count: 3,
                },
            ],
            coupons: vec![],
            employ: false,
            cost: Decimal::ZERO,
        };
        assert_eq!(info.goods_sum(), Decimal::new(8100, 2)); // 81.00
    }
}
