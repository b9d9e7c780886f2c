//! Error taxonomy for the coupon service.
//!
//! Business rejections that still produce a well-formed settlement result
//! (ineligible goods, non-combinable templates) are NOT errors; the rule
//! engine returns them as a cleared coupon selection with the raw price.

/// All business-level errors surfaced by the coupon service.
#[derive(Debug, thiserror::Error)]
pub enum CouponError {
    /// A wire code did not resolve to a known vocabulary entry.
    #[error("unknown {vocabulary} code: {code}")]
    UnknownCode {
        vocabulary: &'static str,
        code: String,
    },

    /// Template does not exist or could not be resolved.
    #[error("template not found: {template_id}")]
    TemplateNotFound { template_id: i64 },

    /// The user already holds `limitation` usable coupons of this template.
    #[error("quota exceeded for template {template_id}: limitation {limitation}")]
    QuotaExceeded { template_id: i64, limitation: u32 },

    /// The template's code pool has no codes left.
    #[error("code pool exhausted for template {template_id}")]
    PoolExhausted { template_id: i64 },

    /// A collaborator (template service, settlement engine) failed.
    /// Retryable from the caller's point of view.
    #[error("upstream unavailable: {source_name}")]
    UpstreamUnavailable { source_name: String },

    /// Storage and cache disagree, or a request references records the
    /// store does not confirm (e.g. settling coupons the user does not own).
    #[error("inconsistent state: {message}")]
    Inconsistent { message: String },

    /// The selected coupons' categories map to no supported rule.
    #[error("unsupported coupon combination: {categories:?}")]
    UnsupportedCombination { categories: Vec<String> },

    /// Template build request failed validation.
    #[error("invalid template request: {message}")]
    InvalidTemplate { message: String },

    /// Storage backend failure, surfaced as retryable.
    #[error("storage failure: {0}")]
    Storage(String),
}
