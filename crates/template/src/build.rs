//! Template build service.
//!
//! Validates a build request, persists the template (unavailable until its
//! code pool exists), and spawns pool generation off the request path. The
//! caller gets the stored template immediately plus a join handle it may
//! await when it needs the pool to be ready (tests do; request handlers do
//! not).

use std::sync::Arc;

use time::OffsetDateTime;
use tokio::task::JoinHandle;

use promo_core::{CouponError, CouponTemplate, TemplateRequest};
use promo_storage::{CodePool, StorageError, TemplateStore};

use crate::codegen::CodeGenerator;

pub struct TemplateBuilder {
    store: Arc<dyn TemplateStore>,
    pool: Arc<dyn CodePool>,
}

impl TemplateBuilder {
    pub fn new(store: Arc<dyn TemplateStore>, pool: Arc<dyn CodePool>) -> Self {
        TemplateBuilder { store, pool }
    }

    /// Create a template and kick off code generation.
    pub async fn build(
        &self,
        request: TemplateRequest,
        now: OffsetDateTime,
    ) -> Result<(CouponTemplate, JoinHandle<()>), CouponError> {
        request.validate(now)?;

        let template = CouponTemplate {
            id: 0,
            available: false,
            expired: false,
            key: CouponTemplate::build_key(request.product_line, request.category, now),
            name: request.name,
            logo: request.logo,
            intro: request.intro,
            category: request.category,
            product_line: request.product_line,
            count: request.count,
            create_time: now,
            user_id: request.user_id,
            target: request.target,
            rule: request.rule,
        };

        let stored = match self.store.insert_template(template).await {
            Ok(stored) => stored,
            Err(StorageError::DuplicateTemplate { name }) => {
                return Err(CouponError::InvalidTemplate {
                    message: format!("a template named '{name}' already exists"),
                })
            }
            Err(other) => return Err(other.into()),
        };

        tracing::info!(template_id = stored.id, name = %stored.name, "template created");

        let generator = CodeGenerator::new(Arc::clone(&self.store), Arc::clone(&self.pool));
        let template_for_task = stored.clone();
        let handle = tokio::spawn(async move {
            if let Err(err) = generator.generate(&template_for_task).await {
                tracing::error!(
                    template_id = template_for_task.id,
                    error = %err,
                    "code pool generation failed; template stays unavailable"
                );
            }
        });

        Ok((stored, handle))
    }
}
