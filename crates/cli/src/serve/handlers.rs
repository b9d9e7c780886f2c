//! HTTP route handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use time::OffsetDateTime;

use promo_core::{CouponStatus, SettlementInfo, TemplateRequest};

use super::state::AppState;
use super::{error_response, json_error};

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    let response = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(response))
}

#[derive(Deserialize)]
pub(crate) struct CouponsQuery {
    status: u8,
}

/// GET /users/{user_id}/coupons?status=N
pub(crate) async fn handle_user_coupons(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Query(query): Query<CouponsQuery>,
) -> Response {
    let status = match CouponStatus::from_code(query.status) {
        Ok(status) => status,
        Err(err) => return error_response(&err),
    };
    match state
        .distribution
        .find_coupons_by_status(user_id, status)
        .await
    {
        Ok(coupons) => (StatusCode::OK, Json(coupons)).into_response(),
        Err(err) => error_response(&err),
    }
}

/// GET /users/{user_id}/templates
pub(crate) async fn handle_user_templates(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Response {
    match state.distribution.find_available_templates(user_id).await {
        Ok(templates) => (StatusCode::OK, Json(templates)).into_response(),
        Err(err) => error_response(&err),
    }
}

/// POST /templates
///
/// Returns the stored template immediately; code-pool generation runs as a
/// detached task and flips `available` when it finishes.
pub(crate) async fn handle_build_template(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TemplateRequest>,
) -> Response {
    match state
        .builder
        .build(request, OffsetDateTime::now_utc())
        .await
    {
        Ok((template, _codegen)) => (StatusCode::OK, Json(template)).into_response(),
        Err(err) => error_response(&err),
    }
}

#[derive(Deserialize)]
pub(crate) struct AcquireRequest {
    user_id: i64,
    template_id: i64,
}

/// POST /acquire
pub(crate) async fn handle_acquire(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AcquireRequest>,
) -> Response {
    match state
        .distribution
        .acquire(request.user_id, request.template_id)
        .await
    {
        Ok(coupon) => (StatusCode::OK, Json(coupon)).into_response(),
        Err(err) => error_response(&err),
    }
}

/// POST /settlement
pub(crate) async fn handle_settlement(
    State(state): State<Arc<AppState>>,
    Json(info): Json<SettlementInfo>,
) -> Response {
    match state.distribution.settle(info).await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => error_response(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promo_core::{
        CouponCategory, Discount, DistributeTarget, Expiration, GoodsInfo, PeriodType,
        ProductLine, TemplateRule, Usage,
    };
    use rust_decimal::Decimal;
    use time::Duration;

    fn request(name: &str) -> TemplateRequest {
        TemplateRequest {
            name: name.to_string(),
            logo: "logo.png".to_string(),
            intro: "flat 20 off 100".to_string(),
            category: CouponCategory::FlatAmount,
            product_line: ProductLine::Retail,
            count: 10,
            user_id: 1,
            target: DistributeTarget::Multi,
            rule: TemplateRule {
                expiration: Expiration {
                    period: PeriodType::Regular,
                    gap: 1,
                    deadline: OffsetDateTime::now_utc() + Duration::days(30),
                },
                discount: Discount {
                    quota: 20,
                    base: 100,
                },
                limitation: 1,
                usage: Usage {
                    province: "Hubei".to_string(),
                    city: "Wuhan".to_string(),
                    goods_categories: vec![1],
                },
                weight: vec![],
            },
        }
    }

    /// One pass through the wired state: build, acquire, settle.
    #[tokio::test]
    async fn state_wiring_supports_the_full_flow() {
        let state = AppState::in_memory();

        let (template, codegen) = state
            .builder
            .build(request("wired flat"), OffsetDateTime::now_utc())
            .await
            .unwrap();
        codegen.await.unwrap();

        let coupon = state.distribution.acquire(9, template.id).await.unwrap();
        let result = state
            .distribution
            .settle(SettlementInfo {
                user_id: 9,
                goods: vec![GoodsInfo {
                    goods_category: 1,
                    price: Decimal::new(12000, 2),
                    count: 1,
                }],
                coupons: vec![promo_core::SelectedCoupon {
                    id: coupon.id,
                    template: coupon.template.unwrap(),
                }],
                employ: true,
                cost: Decimal::ZERO,
            })
            .await
            .unwrap();

        assert_eq!(result.cost, Decimal::new(10000, 2));
    }
}
