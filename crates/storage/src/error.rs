//! Storage error type shared by all backend traits.

use promo_core::CouponError;

/// All errors a storage backend can return.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No template with the given id.
    #[error("template not found: {template_id}")]
    TemplateNotFound { template_id: i64 },

    /// No coupon with the given id.
    #[error("coupon not found: {coupon_id}")]
    CouponNotFound { coupon_id: i64 },

    /// A template with this name already exists.
    #[error("duplicate template name: {name}")]
    DuplicateTemplate { name: String },

    /// A backend-specific failure (connection, serialization, timeout).
    /// Retryable from the caller's point of view.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<StorageError> for CouponError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::TemplateNotFound { template_id } => {
                CouponError::TemplateNotFound { template_id }
            }
            other => CouponError::Storage(other.to_string()),
        }
    }
}
