//! Rule dispatch: derive the rule flag from the selected coupons and hand
//! the settlement to the matching executor.

use std::collections::HashMap;

use promo_core::{CouponError, RuleFlag, SettlementInfo};

use crate::combined::CombinedExecutor;
use crate::executor::{round2, RuleExecutor};
use crate::flat::FlatExecutor;
use crate::instant::InstantExecutor;
use crate::percentage::PercentageExecutor;

/// The settlement rule engine: an explicit, enumerable registry mapping
/// rule flags to executors.
pub struct ExecuteManager {
    executors: HashMap<RuleFlag, Box<dyn RuleExecutor>>,
}

impl Default for ExecuteManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecuteManager {
    /// Build the registry with all four executors registered.
    pub fn new() -> Self {
        let mut executors: HashMap<RuleFlag, Box<dyn RuleExecutor>> = HashMap::new();
        for executor in [
            Box::new(FlatExecutor) as Box<dyn RuleExecutor>,
            Box::new(PercentageExecutor),
            Box::new(InstantExecutor),
            Box::new(CombinedExecutor),
        ] {
            executors.insert(executor.rule_flag(), executor);
        }
        ExecuteManager { executors }
    }

    /// Compute the settlement result for the purchase.
    ///
    /// No coupon selected means no rule runs: the cost is the raw goods sum
    /// rounded to 2 decimals. Unsupported category combinations (anything
    /// beyond one coupon or flat + percentage) fail fast.
    pub fn compute_rule(&self, mut info: SettlementInfo) -> Result<SettlementInfo, CouponError> {
        if info.coupons.is_empty() {
            info.cost = round2(info.goods_sum());
            return Ok(info);
        }

        let categories: Vec<_> = info.coupons.iter().map(|c| c.template.category).collect();
        let flag = RuleFlag::from_categories(&categories)?;

        let executor = self
            .executors
            .get(&flag)
            .ok_or(CouponError::UnsupportedCombination {
                categories: categories.iter().map(|c| c.code().to_string()).collect(),
            })?;

        tracing::debug!(user_id = info.user_id, ?flag, "dispatching settlement rule");
        Ok(executor.compute(info))
    }
}
