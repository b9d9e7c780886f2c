//! The coupon record: one user's claim on a code from a template's pool.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::template::TemplateSnapshot;
use crate::vocab::CouponStatus;

/// Cache-only marker id meaning "confirmed empty result" for a
/// (user, status) bucket. Prevents repeated durable-store lookups when a
/// user simply has no coupons.
pub const SENTINEL_COUPON_ID: i64 = -1;

/// A coupon acquired by a user.
///
/// The durable store persists only ids, code, times and status; `template`
/// is a cache-only denormalization rebuilt on every cache fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coupon {
    /// Assigned by the durable store on insert; `-1` marks the sentinel.
    pub id: i64,
    pub template_id: i64,
    pub user_id: i64,
    pub coupon_code: String,
    #[serde(with = "time::serde::rfc3339")]
    pub assign_time: OffsetDateTime,
    pub status: CouponStatus,
    /// Denormalized template view. Never persisted; absent on records whose
    /// template could not be resolved (degraded, rejected by eligibility
    /// checks downstream).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<TemplateSnapshot>,
}

impl Coupon {
    pub fn new(
        template_id: i64,
        user_id: i64,
        coupon_code: String,
        assign_time: OffsetDateTime,
    ) -> Self {
        Coupon {
            id: 0,
            template_id,
            user_id,
            coupon_code,
            assign_time,
            status: CouponStatus::Usable,
            template: None,
        }
    }

    /// The cache-penetration guard record.
    pub fn sentinel(user_id: i64) -> Self {
        Coupon {
            id: SENTINEL_COUPON_ID,
            template_id: SENTINEL_COUPON_ID,
            user_id,
            coupon_code: String::new(),
            assign_time: OffsetDateTime::UNIX_EPOCH,
            status: CouponStatus::Usable,
            template: None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.id == SENTINEL_COUPON_ID
    }

    /// Whether this coupon's effective deadline has passed.
    ///
    /// A record without a template snapshot cannot prove a deadline either
    /// way; it is never reclassified here and gets rejected by eligibility
    /// checks downstream instead.
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        match &self.template {
            Some(snapshot) => snapshot.rule.expiration.effective_deadline(self.assign_time) <= now,
            None => false,
        }
    }
}
