//! Reconciliation: asynchronous propagation of status changes from the
//! cache view to durable storage.
//!
//! Producers (lazy expiry on the read path, settlement on success) publish
//! `{status, ids}` facts fire-and-forget; a single consumer applies them to
//! the durable store. Delivery is at-least-once; the consumer is idempotent
//! because re-applying a status to already-updated rows changes nothing.
//! The single in-process channel preserves publish order per coupon id, so
//! an Expired detected before a Used can never overtake it.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use promo_core::{CouponError, CouponStatus};
use promo_storage::CouponStore;

/// One status-change batch: "coupons with these ids transitioned to this
/// status."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationMessage {
    pub status: CouponStatus,
    pub ids: Vec<i64>,
}

/// Producer side of the reconciliation channel.
#[async_trait]
pub trait ReconciliationPublisher: Send + Sync + 'static {
    /// Fire-and-forget publish; never blocks on consumer completion.
    async fn publish(&self, message: ReconciliationMessage) -> Result<(), CouponError>;
}

/// In-process channel backed by an unbounded tokio mpsc queue.
pub struct InProcessChannel {
    sender: mpsc::UnboundedSender<ReconciliationMessage>,
}

impl InProcessChannel {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ReconciliationMessage>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (InProcessChannel { sender }, receiver)
    }
}

#[async_trait]
impl ReconciliationPublisher for InProcessChannel {
    async fn publish(&self, message: ReconciliationMessage) -> Result<(), CouponError> {
        self.sender
            .send(message)
            .map_err(|_| CouponError::UpstreamUnavailable {
                source_name: "reconciliation channel".to_string(),
            })
    }
}

/// Consumer: applies status-change batches to the durable store.
pub struct ReconciliationConsumer {
    store: Arc<dyn CouponStore>,
}

impl ReconciliationConsumer {
    pub fn new(store: Arc<dyn CouponStore>) -> Self {
        ReconciliationConsumer { store }
    }

    /// Drain the channel until all senders are dropped.
    pub async fn run(&self, mut receiver: mpsc::UnboundedReceiver<ReconciliationMessage>) {
        while let Some(message) = receiver.recv().await {
            self.apply(&message).await;
        }
    }

    /// Apply one message.
    ///
    /// A batch whose ids do not all resolve is stale or duplicated, not a
    /// transient failure: it is logged and dropped, never retried. Usable
    /// batches are ignored outright; no coupon id exists before the durable
    /// insert that creates it.
    pub async fn apply(&self, message: &ReconciliationMessage) {
        match message.status {
            CouponStatus::Usable => {
                tracing::debug!(ids = ?message.ids, "ignoring usable reconciliation batch");
            }
            CouponStatus::Used | CouponStatus::Expired => {
                self.apply_status(message).await;
            }
        }
    }

    async fn apply_status(&self, message: &ReconciliationMessage) {
        let loaded = match self.store.find_by_ids(&message.ids).await {
            Ok(loaded) => loaded,
            Err(err) => {
                tracing::error!(error = %err, ids = ?message.ids, "reconciliation load failed");
                return;
            }
        };

        if loaded.len() != message.ids.len() {
            tracing::error!(
                expected = message.ids.len(),
                found = loaded.len(),
                status = message.status.code(),
                "reconciliation batch does not resolve, dropping"
            );
            return;
        }

        match self.store.update_status(&message.ids, message.status).await {
            Ok(updated) => {
                tracing::info!(
                    updated,
                    status = message.status.code(),
                    "reconciliation batch applied"
                );
            }
            Err(err) => {
                tracing::error!(error = %err, ids = ?message.ids, "reconciliation update failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promo_core::Coupon;
    use promo_storage::MemoryStore;
    use time::OffsetDateTime;

    async fn seeded_store(count: usize) -> (Arc<MemoryStore>, Vec<i64>) {
        let store = Arc::new(MemoryStore::new());
        let mut ids = Vec::new();
        for i in 0..count {
            let coupon = Coupon::new(
                1,
                9,
                format!("code-{i}"),
                OffsetDateTime::UNIX_EPOCH,
            );
            ids.push(store.insert_coupon(coupon).await.unwrap().id);
        }
        (store, ids)
    }

    #[tokio::test]
    async fn applies_status_to_all_ids() {
        let (store, ids) = seeded_store(3).await;
        let consumer = ReconciliationConsumer::new(store.clone() as Arc<dyn CouponStore>);

        consumer
            .apply(&ReconciliationMessage {
                status: CouponStatus::Used,
                ids: ids.clone(),
            })
            .await;

        for coupon in store.find_by_ids(&ids).await.unwrap() {
            assert_eq!(coupon.status, CouponStatus::Used);
        }
    }

    #[tokio::test]
    async fn reapplying_the_same_message_is_a_no_op() {
        let (store, ids) = seeded_store(2).await;
        let consumer = ReconciliationConsumer::new(store.clone() as Arc<dyn CouponStore>);
        let message = ReconciliationMessage {
            status: CouponStatus::Expired,
            ids: ids.clone(),
        };

        consumer.apply(&message).await;
        let first: Vec<_> = store.find_by_ids(&ids).await.unwrap();
        consumer.apply(&message).await;
        let second: Vec<_> = store.find_by_ids(&ids).await.unwrap();

        assert_eq!(first, second);
        assert!(second.iter().all(|c| c.status == CouponStatus::Expired));
    }

    #[tokio::test]
    async fn unresolvable_batch_is_dropped_not_applied() {
        let (store, ids) = seeded_store(1).await;
        let consumer = ReconciliationConsumer::new(store.clone() as Arc<dyn CouponStore>);

        consumer
            .apply(&ReconciliationMessage {
                status: CouponStatus::Used,
                ids: vec![ids[0], 999],
            })
            .await;

        // The resolvable coupon must not have been updated.
        let loaded = store.find_by_ids(&ids).await.unwrap();
        assert_eq!(loaded[0].status, CouponStatus::Usable);
    }

    #[tokio::test]
    async fn usable_batches_are_ignored() {
        let (store, ids) = seeded_store(1).await;
        let consumer = ReconciliationConsumer::new(store.clone() as Arc<dyn CouponStore>);

        consumer
            .apply(&ReconciliationMessage {
                status: CouponStatus::Usable,
                ids: ids.clone(),
            })
            .await;

        let loaded = store.find_by_ids(&ids).await.unwrap();
        assert_eq!(loaded[0].status, CouponStatus::Usable);
    }

    #[test]
    fn wire_format_is_status_code_plus_ids() {
        let message = ReconciliationMessage {
            status: CouponStatus::Expired,
            ids: vec![4, 7],
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json, serde_json::json!({"status": 3, "ids": [4, 7]}));
    }

    #[tokio::test]
    async fn channel_preserves_publish_order() {
        let (channel, mut receiver) = InProcessChannel::new();
        channel
            .publish(ReconciliationMessage {
                status: CouponStatus::Used,
                ids: vec![1],
            })
            .await
            .unwrap();
        channel
            .publish(ReconciliationMessage {
                status: CouponStatus::Expired,
                ids: vec![1],
            })
            .await
            .unwrap();

        assert_eq!(
            receiver.recv().await.unwrap().status,
            CouponStatus::Used
        );
        assert_eq!(
            receiver.recv().await.unwrap().status,
            CouponStatus::Expired
        );
    }
}
