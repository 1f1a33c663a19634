use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{MemoryStore, Store, StoreError, StoreResult};
use crate::petition::{Petition, PetitionId};
use crate::share::SocialShare;
use crate::signature::{EmailFingerprint, NewSignature, Signature};
use crate::stats::EngagementTotals;
use crate::story::Story;

/// Default bound on a single durable-store call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Health of the durable store as seen by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DurableStatus {
    Connected,
    Unavailable,
    Unconfigured,
}

/// Routes each operation to the durable store, failing over to the
/// in-process fallback when the durable store times out or is unreachable.
///
/// Failover is per operation and silent to callers. Writes that land in the
/// fallback stay there; nothing reconciles them with the durable store once
/// it recovers.
pub struct DualStore {
    durable: Option<Arc<dyn Store>>,
    fallback: Arc<dyn Store>,
    timeout: Duration,
    failed_over: AtomicBool,
}

impl DualStore {
    pub fn new(durable: Arc<dyn Store>, fallback: Arc<dyn Store>, timeout: Duration) -> Self {
        Self {
            durable: Some(durable),
            fallback,
            timeout,
            failed_over: AtomicBool::new(false),
        }
    }

    /// No durable store configured: everything goes to the fallback.
    pub fn fallback_only(fallback: Arc<dyn Store>) -> Self {
        Self {
            durable: None,
            fallback,
            timeout: DEFAULT_TIMEOUT,
            failed_over: AtomicBool::new(true),
        }
    }

    /// A fallback-only store over a seeded [`MemoryStore`].
    #[must_use]
    pub fn in_memory() -> Self {
        Self::fallback_only(Arc::new(MemoryStore::seeded()))
    }

    /// Whether the most recent operation was served by the fallback store.
    pub fn is_failed_over(&self) -> bool {
        self.failed_over.load(Ordering::Relaxed)
    }

    pub async fn durable_status(&self) -> DurableStatus {
        let Some(durable) = &self.durable else {
            return DurableStatus::Unconfigured;
        };
        match tokio::time::timeout(self.timeout, durable.ping()).await {
            Ok(Ok(())) => DurableStatus::Connected,
            Ok(Err(_)) | Err(_) => DurableStatus::Unavailable,
        }
    }

    async fn route<'a, T, D, F>(
        &'a self,
        op: &'static str,
        durable: impl FnOnce(&'a dyn Store) -> D + Send,
        fallback: impl FnOnce(&'a dyn Store) -> F + Send,
    ) -> StoreResult<T>
    where
        T: Send,
        D: Future<Output = StoreResult<T>> + Send,
        F: Future<Output = StoreResult<T>> + Send,
    {
        if let Some(store) = &self.durable {
            match tokio::time::timeout(self.timeout, durable(store.as_ref())).await {
                Ok(Err(StoreError::Unavailable(reason))) => {
                    self.enter_failover(op, store.name(), &reason);
                }
                Err(_) => {
                    let reason = format!("no response within {}ms", self.timeout.as_millis());
                    self.enter_failover(op, store.name(), &reason);
                }
                Ok(result) => {
                    self.leave_failover(store.name());
                    return result;
                }
            }
        }

        tracing::debug!(op, store = self.fallback.name(), "serving from fallback store");
        fallback(self.fallback.as_ref()).await.inspect_err(|e| {
            if matches!(e, StoreError::Unavailable(_)) {
                tracing::error!(op, error = %e, "durable and fallback stores both unavailable");
            }
        })
    }

    fn enter_failover(&self, op: &str, store: &str, reason: &str) {
        if self.failed_over.swap(true, Ordering::Relaxed) {
            tracing::debug!(op, store, reason, "durable store still unavailable");
        } else {
            tracing::warn!(
                op,
                store,
                reason,
                "durable store unavailable, failing over to in-memory store"
            );
        }
    }

    fn leave_failover(&self, store: &str) {
        if self.failed_over.swap(false, Ordering::Relaxed) {
            tracing::info!(store, "durable store recovered; fallback writes are not replayed");
        }
    }
}

#[async_trait]
impl Store for DualStore {
    fn name(&self) -> &'static str {
        "dual"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.route("ping", |s| s.ping(), |s| s.ping()).await
    }

    async fn find_petition_by_slug(&self, slug: &str) -> StoreResult<Option<Petition>> {
        self.route(
            "find_petition_by_slug",
            |s| s.find_petition_by_slug(slug),
            |s| s.find_petition_by_slug(slug),
        )
        .await
    }

    async fn get_petition(&self, id: &PetitionId) -> StoreResult<Option<Petition>> {
        self.route("get_petition", |s| s.get_petition(id), |s| s.get_petition(id))
            .await
    }

    async fn list_active_petitions(&self) -> StoreResult<Vec<Petition>> {
        self.route(
            "list_active_petitions",
            |s| s.list_active_petitions(),
            |s| s.list_active_petitions(),
        )
        .await
    }

    async fn insert_signature(&self, signature: NewSignature) -> StoreResult<Signature> {
        let retry = signature.clone();
        self.route(
            "insert_signature",
            |s| s.insert_signature(signature),
            |s| s.insert_signature(retry),
        )
        .await
    }

    async fn count_signatures(&self, petition_id: &PetitionId) -> StoreResult<i64> {
        self.route(
            "count_signatures",
            |s| s.count_signatures(petition_id),
            |s| s.count_signatures(petition_id),
        )
        .await
    }

    async fn find_signature(
        &self,
        petition_id: &PetitionId,
        fingerprint: &EmailFingerprint,
    ) -> StoreResult<Option<Signature>> {
        self.route(
            "find_signature",
            |s| s.find_signature(petition_id, fingerprint),
            |s| s.find_signature(petition_id, fingerprint),
        )
        .await
    }

    async fn list_recent_public_signatures(
        &self,
        petition_id: &PetitionId,
        limit: usize,
    ) -> StoreResult<Vec<Signature>> {
        self.route(
            "list_recent_public_signatures",
            |s| s.list_recent_public_signatures(petition_id, limit),
            |s| s.list_recent_public_signatures(petition_id, limit),
        )
        .await
    }

    async fn insert_share(&self, share: SocialShare) -> StoreResult<SocialShare> {
        let retry = share.clone();
        self.route(
            "insert_share",
            |s| s.insert_share(share),
            |s| s.insert_share(retry),
        )
        .await
    }

    async fn count_shares(&self, entity_type: &str, entity_id: Option<&str>) -> StoreResult<i64> {
        self.route(
            "count_shares",
            |s| s.count_shares(entity_type, entity_id),
            |s| s.count_shares(entity_type, entity_id),
        )
        .await
    }

    async fn insert_story(&self, story: Story) -> StoreResult<Story> {
        let retry = story.clone();
        self.route(
            "insert_story",
            |s| s.insert_story(story),
            |s| s.insert_story(retry),
        )
        .await
    }

    async fn list_approved_stories(&self) -> StoreResult<Vec<Story>> {
        self.route(
            "list_approved_stories",
            |s| s.list_approved_stories(),
            |s| s.list_approved_stories(),
        )
        .await
    }

    async fn totals(&self) -> StoreResult<EngagementTotals> {
        self.route("totals", |s| s.totals(), |s| s.totals()).await
    }
}
