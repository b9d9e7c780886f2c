//! The template collaborator seam.
//!
//! Downstream services (distribution, settlement orchestration) resolve
//! templates through this trait rather than the store directly, so a remote
//! template service can replace the in-process implementation without
//! touching callers.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;

use promo_core::{CouponError, TemplateSnapshot};
use promo_storage::TemplateStore;

/// Read-side template collaborator.
#[async_trait]
pub trait TemplateProvider: Send + Sync + 'static {
    /// Batch-resolve template ids to snapshots. Ids that do not resolve are
    /// absent from the map.
    async fn resolve_templates(
        &self,
        template_ids: &[i64],
    ) -> Result<HashMap<i64, TemplateSnapshot>, CouponError>;

    /// Snapshots of every available, not-expired template.
    async fn list_usable_templates(&self) -> Result<Vec<TemplateSnapshot>, CouponError>;

    /// Usable templates whose absolute deadline lies in the future.
    ///
    /// The store already filters on the available/expired flags; this
    /// filters templates whose deadline passed before the scheduled expiry
    /// job caught up.
    async fn list_unexpired_templates(
        &self,
        now: OffsetDateTime,
    ) -> Result<Vec<TemplateSnapshot>, CouponError> {
        let templates = self.list_usable_templates().await?;
        Ok(templates
            .into_iter()
            .filter(|t| t.rule.expiration.deadline > now)
            .collect())
    }
}

/// Store-backed provider.
pub struct StoreTemplateProvider {
    store: Arc<dyn TemplateStore>,
}

impl StoreTemplateProvider {
    pub fn new(store: Arc<dyn TemplateStore>) -> Self {
        StoreTemplateProvider { store }
    }
}

#[async_trait]
impl TemplateProvider for StoreTemplateProvider {
    async fn resolve_templates(
        &self,
        template_ids: &[i64],
    ) -> Result<HashMap<i64, TemplateSnapshot>, CouponError> {
        let templates = self.store.find_templates(template_ids).await?;
        Ok(templates
            .into_iter()
            .map(|(id, template)| (id, template.snapshot()))
            .collect())
    }

    async fn list_usable_templates(&self) -> Result<Vec<TemplateSnapshot>, CouponError> {
        let templates = self.store.list_available().await?;
        Ok(templates.iter().map(|t| t.snapshot()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promo_core::{
        CouponCategory, CouponTemplate, Discount, DistributeTarget, Expiration, PeriodType,
        ProductLine, TemplateRule, Usage,
    };
    use promo_storage::MemoryStore;
    use time::macros::datetime;

    fn template(name: &str, deadline: OffsetDateTime) -> CouponTemplate {
        let create_time = datetime!(2026-01-01 00:00 UTC);
        CouponTemplate {
            id: 0,
            available: false,
            expired: false,
            name: name.to_string(),
            logo: String::new(),
            intro: String::new(),
            category: CouponCategory::FlatAmount,
            product_line: ProductLine::Retail,
            count: 10,
            create_time,
            user_id: 1,
            key: CouponTemplate::build_key(
                ProductLine::Retail,
                CouponCategory::FlatAmount,
                create_time,
            ),
            target: DistributeTarget::Multi,
            rule: TemplateRule {
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
                    province: "p".to_string(),
                    city: "c".to_string(),
                    goods_categories: vec![1],
                },
                weight: vec![],
            },
        }
    }

    #[tokio::test]
    async fn unexpired_listing_drops_past_deadlines() {
        let store = Arc::new(MemoryStore::new());
        let live = store
            .insert_template(template("live", datetime!(2027-01-01 00:00 UTC)))
            .await
            .unwrap();
        let stale = store
            .insert_template(template("stale", datetime!(2026-02-01 00:00 UTC)))
            .await
            .unwrap();
        store.mark_available(live.id).await.unwrap();
        store.mark_available(stale.id).await.unwrap();

        let provider = StoreTemplateProvider::new(store);
        let listed = provider
            .list_unexpired_templates(datetime!(2026-06-01 00:00 UTC))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, live.id);
    }
}
