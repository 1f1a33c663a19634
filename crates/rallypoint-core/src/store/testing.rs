use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{Store, StoreError, StoreResult};
use crate::petition::{Petition, PetitionId};
use crate::share::SocialShare;
use crate::signature::{EmailFingerprint, NewSignature, Signature};
use crate::stats::EngagementTotals;
use crate::story::Story;

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    /// Never answers.
    Stall,
    /// Refuses the connection.
    Down,
    /// Answers with a non-connectivity error.
    Broken,
}

/// A durable store stand-in that fails every call the same way.
pub struct FailingStore {
    failure: Failure,
    calls: AtomicUsize,
}

impl FailingStore {
    pub const fn new(failure: Failure) -> Self {
        Self {
            failure,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn fail<T>(&self) -> StoreResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure {
            Failure::Stall => std::future::pending().await,
            Failure::Down => Err(StoreError::Unavailable("connection refused".to_string())),
            Failure::Broken => Err(StoreError::Backend("relation does not exist".to_string())),
        }
    }
}

#[async_trait]
impl Store for FailingStore {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.fail().await
    }

    async fn find_petition_by_slug(&self, _slug: &str) -> StoreResult<Option<Petition>> {
        self.fail().await
    }

    async fn get_petition(&self, _id: &PetitionId) -> StoreResult<Option<Petition>> {
        self.fail().await
    }

    async fn list_active_petitions(&self) -> StoreResult<Vec<Petition>> {
        self.fail().await
    }

    async fn insert_signature(&self, _signature: NewSignature) -> StoreResult<Signature> {
        self.fail().await
    }

    async fn count_signatures(&self, _petition_id: &PetitionId) -> StoreResult<i64> {
        self.fail().await
    }

    async fn find_signature(
        &self,
        _petition_id: &PetitionId,
        _fingerprint: &EmailFingerprint,
    ) -> StoreResult<Option<Signature>> {
        self.fail().await
    }

    async fn list_recent_public_signatures(
        &self,
        _petition_id: &PetitionId,
        _limit: usize,
    ) -> StoreResult<Vec<Signature>> {
        self.fail().await
    }

    async fn insert_share(&self, _share: SocialShare) -> StoreResult<SocialShare> {
        self.fail().await
    }

    async fn count_shares(&self, _entity_type: &str, _entity_id: Option<&str>) -> StoreResult<i64> {
        self.fail().await
    }

    async fn insert_story(&self, _story: Story) -> StoreResult<Story> {
        self.fail().await
    }

    async fn list_approved_stories(&self) -> StoreResult<Vec<Story>> {
        self.fail().await
    }

    async fn totals(&self) -> StoreResult<EngagementTotals> {
        self.fail().await
    }
}
