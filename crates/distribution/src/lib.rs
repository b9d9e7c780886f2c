//! Coupon distribution: the user-facing read, acquisition and settlement
//! paths, plus the reconciliation channel that keeps the durable store in
//! step with the cache view.

mod acquire;
mod records;
mod reconcile;
mod settle;
mod templates;

use std::sync::Arc;

use promo_settlement::ExecuteManager;
use promo_storage::{CodePool, CouponCache, CouponStore};
use promo_template::TemplateProvider;

pub use reconcile::{
    InProcessChannel, ReconciliationConsumer, ReconciliationMessage, ReconciliationPublisher,
};

/// The distribution service.
///
/// One instance per process; every collaborator sits behind a trait object
/// so backends (and the reconciliation transport) can be swapped without
/// touching the business paths.
pub struct DistributionService {
    store: Arc<dyn CouponStore>,
    cache: Arc<dyn CouponCache>,
    pool: Arc<dyn CodePool>,
    templates: Arc<dyn TemplateProvider>,
    reconciler: Arc<dyn ReconciliationPublisher>,
    engine: ExecuteManager,
}

impl DistributionService {
    pub fn new(
        store: Arc<dyn CouponStore>,
        cache: Arc<dyn CouponCache>,
        pool: Arc<dyn CodePool>,
        templates: Arc<dyn TemplateProvider>,
        reconciler: Arc<dyn ReconciliationPublisher>,
    ) -> Self {
        DistributionService {
            store,
            cache,
            pool,
            templates,
            reconciler,
            engine: ExecuteManager::new(),
        }
    }
}
