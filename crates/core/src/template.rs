//! Coupon templates: the immutable business configuration behind a family
//! of coupons, plus the denormalized snapshot attached to cached coupons.

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::error::CouponError;
use crate::vocab::{CouponCategory, DistributeTarget, PeriodType, ProductLine};

/// Validity-period rule. The absolute deadline always applies; `gap` only
/// matters for floating (`Shift`) periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expiration {
    pub period: PeriodType,
    /// Floating-window length in days, anchored to acquisition time.
    pub gap: u32,
    /// Absolute deadline; no coupon of this template is usable past it.
    #[serde(with = "time::serde::rfc3339")]
    pub deadline: OffsetDateTime,
}

impl Expiration {
    /// Deadline that applies to one concrete coupon.
    ///
    /// Floating periods expire `gap` days after acquisition, but never
    /// later than the template's absolute deadline.
    pub fn effective_deadline(&self, assign_time: OffsetDateTime) -> OffsetDateTime {
        match self.period {
            PeriodType::Regular => self.deadline,
            PeriodType::Shift => {
                let floating = assign_time + Duration::days(i64::from(self.gap));
                floating.min(self.deadline)
            }
        }
    }
}

/// Discount parameters. `quota` is the reduction amount for flat/instant
/// coupons and the retained percentage (e.g. 85) for percentage coupons.
/// `base` is the goods-sum threshold; only flat-amount coupons consult it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub quota: u32,
    pub base: u32,
}

/// Usage scope: region plus the goods categories the coupon applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub province: String,
    pub city: String,
    pub goods_categories: Vec<i32>,
}

/// The full rule block of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRule {
    pub expiration: Expiration,
    pub discount: Discount,
    /// Maximum usable coupons of this template one user may hold.
    pub limitation: u32,
    pub usage: Usage,
    /// Shared keys of other templates this one may be combined with in a
    /// single settlement.
    pub weight: Vec<String>,
}

/// Immutable template record as held by the durable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponTemplate {
    pub id: i64,
    /// Set once the code pool has been generated and pushed.
    pub available: bool,
    pub expired: bool,
    pub name: String,
    pub logo: String,
    pub intro: String,
    pub category: CouponCategory,
    pub product_line: ProductLine,
    /// Pool size: exactly this many codes are generated.
    pub count: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub create_time: OffsetDateTime,
    /// Owning (creating) user.
    pub user_id: i64,
    /// Uniqueness key: product line + category + creation date (yyyyMMdd).
    pub key: String,
    pub target: DistributeTarget,
    pub rule: TemplateRule,
}

impl CouponTemplate {
    /// Build the template key from its identity fields.
    pub fn build_key(
        product_line: ProductLine,
        category: CouponCategory,
        create_time: OffsetDateTime,
    ) -> String {
        let date = create_time.date();
        format!(
            "{}{}{:04}{:02}{:02}",
            product_line.code(),
            category.code(),
            date.year(),
            u8::from(date.month()),
            date.day()
        )
    }

    pub fn snapshot(&self) -> TemplateSnapshot {
        TemplateSnapshot {
            id: self.id,
            name: self.name.clone(),
            logo: self.logo.clone(),
            intro: self.intro.clone(),
            category: self.category,
            product_line: self.product_line,
            key: self.key.clone(),
            target: self.target,
            rule: self.rule.clone(),
        }
    }
}

/// Denormalized template view carried on cached coupons and settlement
/// requests. Never persisted alongside a coupon; rebuilt on every cache fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSnapshot {
    pub id: i64,
    pub name: String,
    pub logo: String,
    pub intro: String,
    pub category: CouponCategory,
    pub product_line: ProductLine,
    pub key: String,
    pub target: DistributeTarget,
    pub rule: TemplateRule,
}

impl TemplateSnapshot {
    /// Key used in combination-legality checks: template key plus the
    /// zero-padded template id.
    pub fn shared_key(&self) -> String {
        format!("{}{:04}", self.key, self.id)
    }
}

/// Inbound request to create a template. `available`/`expired`/`key` are
/// derived, never accepted from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRequest {
    pub name: String,
    pub logo: String,
    pub intro: String,
    pub category: CouponCategory,
    pub product_line: ProductLine,
    pub count: u32,
    pub user_id: i64,
    pub target: DistributeTarget,
    pub rule: TemplateRule,
}

impl TemplateRequest {
    /// Validate the request against the template invariants: a future
    /// deadline, at least one coupon, a per-user limitation of at least one,
    /// positive discount parameters, and a non-empty usage scope.
    pub fn validate(&self, now: OffsetDateTime) -> Result<(), CouponError> {
        if self.name.is_empty() {
            return Err(CouponError::InvalidTemplate {
                message: "name must not be empty".to_string(),
            });
        }
        if self.count == 0 {
            return Err(CouponError::InvalidTemplate {
                message: "count must be at least 1".to_string(),
            });
        }
        if self.rule.limitation == 0 {
            return Err(CouponError::InvalidTemplate {
                message: "limitation must be at least 1".to_string(),
            });
        }
        if self.rule.expiration.deadline <= now {
            return Err(CouponError::InvalidTemplate {
                message: "deadline must be in the future".to_string(),
            });
        }
        if self.rule.expiration.gap == 0 {
            return Err(CouponError::InvalidTemplate {
                message: "expiration gap must be positive".to_string(),
            });
        }
        if self.rule.discount.quota == 0 || self.rule.discount.base == 0 {
            return Err(CouponError::InvalidTemplate {
                message: "discount quota and base must be positive".to_string(),
            });
        }
        if self.rule.usage.province.is_empty()
            || self.rule.usage.city.is_empty()
            || self.rule.usage.goods_categories.is_empty()
        {
            return Err(CouponError::InvalidTemplate {
                message: "usage scope must name a region and goods categories".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn rule(deadline: OffsetDateTime) -> TemplateRule {
        TemplateRule {
            expiration: Expiration {
                period: PeriodType::Regular,
                gap: 1,
                deadline,
            },
            discount: Discount {
                quota: 20,
                base: 100,
            },
            limitation: 1,
            usage: Usage {
                province: "Bavaria".to_string(),
                city: "Munich".to_string(),
                goods_categories: vec![1, 2],
            },
            weight: vec![],
        }
    }

    fn request(deadline: OffsetDateTime) -> TemplateRequest {
        TemplateRequest {
            name: "autumn flat 20".to_string(),
            logo: "http://img.example/autumn.png".to_string(),
            intro: "20 off above 100".to_string(),
            category: CouponCategory::FlatAmount,
            product_line: ProductLine::Retail,
            count: 100,
            user_id: 7,
            target: DistributeTarget::Multi,
            rule: rule(deadline),
        }
    }

    #[test]
    fn template_key_format() {
        let key = CouponTemplate::build_key(
            ProductLine::Retail,
            CouponCategory::FlatAmount,
            datetime!(2026-03-05 10:00 UTC),
        );
        assert_eq!(key, "100120260305");
    }

    #[test]
    fn shared_key_pads_id_to_four_digits() {
        let template = CouponTemplate {
            id: 42,
            available: true,
            expired: false,
            name: "x".to_string(),
            logo: String::new(),
            intro: String::new(),
            category: CouponCategory::Percentage,
            product_line: ProductLine::Wholesale,
            count: 1,
            create_time: datetime!(2026-01-01 00:00 UTC),
            user_id: 1,
            key: "200220260101".to_string(),
            target: DistributeTarget::Single,
            rule: rule(datetime!(2027-01-01 00:00 UTC)),
        };
        assert_eq!(template.snapshot().shared_key(), "2002202601010042");
    }

    #[test]
    fn regular_period_uses_absolute_deadline() {
        let exp = Expiration {
            period: PeriodType::Regular,
            gap: 5,
            deadline: datetime!(2026-06-01 00:00 UTC),
        };
        assert_eq!(
            exp.effective_deadline(datetime!(2026-05-30 00:00 UTC)),
            datetime!(2026-06-01 00:00 UTC)
        );
    }

    #[test]
    fn shift_period_is_capped_by_absolute_deadline() {
        let exp = Expiration {
            period: PeriodType::Shift,
            gap: 10,
            deadline: datetime!(2026-06-01 00:00 UTC),
        };
        // Anchored window ends before the cap.
        assert_eq!(
            exp.effective_deadline(datetime!(2026-05-01 00:00 UTC)),
            datetime!(2026-05-11 00:00 UTC)
        );
        // Anchored window would run past the cap.
        assert_eq!(
            exp.effective_deadline(datetime!(2026-05-30 00:00 UTC)),
            datetime!(2026-06-01 00:00 UTC)
        );
    }

    #[test]
    fn request_validation_rejects_past_deadline() {
        let req = request(datetime!(2020-01-01 00:00 UTC));
        let err = req.validate(datetime!(2026-01-01 00:00 UTC)).unwrap_err();
        assert!(matches!(err, CouponError::InvalidTemplate { .. }));
    }

    #[test]
    fn request_validation_accepts_well_formed() {
        let req = request(datetime!(2027-01-01 00:00 UTC));
        assert!(req.validate(datetime!(2026-01-01 00:00 UTC)).is_ok());
    }

    #[test]
    fn request_validation_rejects_zero_limitation() {
        let mut req = request(datetime!(2027-01-01 00:00 UTC));
        req.rule.limitation = 0;
        assert!(req.validate(datetime!(2026-01-01 00:00 UTC)).is_err());
    }
}
