//! Application state: the wired-up service graph behind the handlers.

use std::sync::Arc;

use promo_distribution::{DistributionService, InProcessChannel, ReconciliationConsumer};
use promo_storage::{CodePool, CouponStore, MemoryCache, MemoryCodePool, MemoryStore, TemplateStore};
use promo_template::{StoreTemplateProvider, TemplateBuilder};

/// Shared state for all request handlers.
pub(crate) struct AppState {
    pub(crate) distribution: DistributionService,
    pub(crate) builder: TemplateBuilder,
}

impl AppState {
    /// Wire the whole service graph over the in-memory backends and start
    /// the reconciliation consumer in the background.
    pub(crate) fn in_memory() -> Arc<AppState> {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(MemoryCache::new());
        let pool = Arc::new(MemoryCodePool::new());
        let provider = Arc::new(StoreTemplateProvider::new(
            store.clone() as Arc<dyn TemplateStore>
        ));

        let (channel, receiver) = InProcessChannel::new();
        let consumer = ReconciliationConsumer::new(store.clone() as Arc<dyn CouponStore>);
        tokio::spawn(async move { consumer.run(receiver).await });

        let distribution = DistributionService::new(
            store.clone(),
            cache,
            pool.clone(),
            provider,
            Arc::new(channel),
        );
        let builder = TemplateBuilder::new(
            store as Arc<dyn TemplateStore>,
            pool as Arc<dyn CodePool>,
        );

        Arc::new(AppState {
            distribution,
            builder,
        })
    }
}
