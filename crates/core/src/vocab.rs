//! Closed business vocabularies.
//!
//! Every fixed vocabulary in the system is a closed enum with an explicit
//! wire code. Decoding an unknown code is an error at the boundary, never a
//! silent pass-through: downstream matches are exhaustive and rely on it.

use serde::{Deserialize, Serialize};

use crate::error::CouponError;

/// Coupon category: how the discount is computed.
///
/// The three-digit string code is part of the coupon-code prefix and of the
/// template key, so it is stable wire format, not a display detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CouponCategory {
    /// Fixed reduction once the goods sum reaches a base threshold.
    FlatAmount,
    /// Percentage of the goods sum (quota is the percent kept, e.g. 85).
    Percentage,
    /// Fixed reduction with no base threshold.
    InstantReduction,
}

impl CouponCategory {
    pub fn code(self) -> &'static str {
        match self {
            CouponCategory::FlatAmount => "001",
            CouponCategory::Percentage => "002",
            CouponCategory::InstantReduction => "003",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, CouponError> {
        match code {
            "001" => Ok(CouponCategory::FlatAmount),
            "002" => Ok(CouponCategory::Percentage),
            "003" => Ok(CouponCategory::InstantReduction),
            other => Err(CouponError::UnknownCode {
                vocabulary: "category",
                code: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for CouponCategory {
    type Error = CouponError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CouponCategory::from_code(&value)
    }
}

impl From<CouponCategory> for String {
    fn from(value: CouponCategory) -> Self {
        value.code().to_string()
    }
}

/// Product line owning a template. The single-digit code leads the
/// coupon-code prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ProductLine {
    Retail,
    Wholesale,
}

impl ProductLine {
    pub fn code(self) -> u8 {
        match self {
            ProductLine::Retail => 1,
            ProductLine::Wholesale => 2,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, CouponError> {
        match code {
            1 => Ok(ProductLine::Retail),
            2 => Ok(ProductLine::Wholesale),
            other => Err(CouponError::UnknownCode {
                vocabulary: "product line",
                code: other.to_string(),
            }),
        }
    }
}

impl TryFrom<u8> for ProductLine {
    type Error = CouponError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ProductLine::from_code(value)
    }
}

impl From<ProductLine> for u8 {
    fn from(value: ProductLine) -> Self {
        value.code()
    }
}

/// Lifecycle status of an acquired coupon.
///
/// `Used` and `Expired` are terminal; no transition reverses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CouponStatus {
    Usable,
    Used,
    Expired,
}

impl CouponStatus {
    pub fn code(self) -> u8 {
        match self {
            CouponStatus::Usable => 1,
            CouponStatus::Used => 2,
            CouponStatus::Expired => 3,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, CouponError> {
        match code {
            1 => Ok(CouponStatus::Usable),
            2 => Ok(CouponStatus::Used),
            3 => Ok(CouponStatus::Expired),
            other => Err(CouponError::UnknownCode {
                vocabulary: "coupon status",
                code: other.to_string(),
            }),
        }
    }
}

impl TryFrom<u8> for CouponStatus {
    type Error = CouponError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        CouponStatus::from_code(value)
    }
}

impl From<CouponStatus> for u8 {
    fn from(value: CouponStatus) -> Self {
        value.code()
    }
}

/// Validity-period kind for a template's expiration rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PeriodType {
    /// Fixed window: the rule's absolute deadline applies to every coupon.
    Regular,
    /// Floating window anchored to acquisition time by `gap` days, still
    /// capped by the absolute deadline.
    Shift,
}

impl PeriodType {
    pub fn code(self) -> u8 {
        match self {
            PeriodType::Regular => 1,
            PeriodType::Shift => 2,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, CouponError> {
        match code {
            1 => Ok(PeriodType::Regular),
            2 => Ok(PeriodType::Shift),
            other => Err(CouponError::UnknownCode {
                vocabulary: "period type",
                code: other.to_string(),
            }),
        }
    }
}

impl TryFrom<u8> for PeriodType {
    type Error = CouponError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        PeriodType::from_code(value)
    }
}

impl From<PeriodType> for u8 {
    fn from(value: PeriodType) -> Self {
        value.code()
    }
}

/// Distribution target of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DistributeTarget {
    Single,
    Multi,
}

impl DistributeTarget {
    pub fn code(self) -> u8 {
        match self {
            DistributeTarget::Single => 1,
            DistributeTarget::Multi => 2,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, CouponError> {
        match code {
            1 => Ok(DistributeTarget::Single),
            2 => Ok(DistributeTarget::Multi),
            other => Err(CouponError::UnknownCode {
                vocabulary: "distribute target",
                code: other.to_string(),
            }),
        }
    }
}

impl TryFrom<u8> for DistributeTarget {
    type Error = CouponError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        DistributeTarget::from_code(value)
    }
}

impl From<DistributeTarget> for u8 {
    fn from(value: DistributeTarget) -> Self {
        value.code()
    }
}

/// Dispatch tag for the settlement rule engine.
///
/// Derived from the categories of the selected coupons, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleFlag {
    Flat,
    Percentage,
    Instant,
    /// Exactly two coupons: one flat-amount plus one percentage.
    FlatPercentage,
}

impl RuleFlag {
    /// Derive the dispatch flag from the selected coupons' categories.
    ///
    /// Any multi-coupon combination other than flat + percentage is
    /// unsupported and fails fast.
    pub fn from_categories(categories: &[CouponCategory]) -> Result<Self, CouponError> {
        match categories {
            [CouponCategory::FlatAmount] => Ok(RuleFlag::Flat),
            [CouponCategory::Percentage] => Ok(RuleFlag::Percentage),
            [CouponCategory::InstantReduction] => Ok(RuleFlag::Instant),
            [CouponCategory::FlatAmount, CouponCategory::Percentage]
            | [CouponCategory::Percentage, CouponCategory::FlatAmount] => {
                Ok(RuleFlag::FlatPercentage)
            }
            other => Err(CouponError::UnsupportedCombination {
                categories: other.iter().map(|c| c.code().to_string()).collect(),
            }),
        }
    }
}
