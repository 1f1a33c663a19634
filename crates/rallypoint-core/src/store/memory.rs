use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::petition::{self, Petition, PetitionId};
use crate::share::SocialShare;
use crate::signature::{EmailFingerprint, NewSignature, Signature};
use crate::stats::EngagementTotals;
use crate::story::Story;

#[derive(Default)]
struct Inner {
    petitions: HashMap<PetitionId, Petition>,
    signatures: Vec<Signature>,
    signed: HashSet<(PetitionId, EmailFingerprint)>,
    shares: Vec<SocialShare>,
    stories: Vec<Story>,
}

/// Volatile in-process store.
///
/// Shared by every request handler in the process. All mutation happens under
/// one write lock, so the duplicate check and the insert of a signature are a
/// single step. Nothing here ever awaits.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding the flagship petition, matching what the durable store
    /// is expected to contain.
    #[must_use]
    pub fn seeded() -> Self {
        Self::with_petitions([petition::flagship()])
    }

    pub fn with_petitions(petitions: impl IntoIterator<Item = Petition>) -> Self {
        let petitions = petitions
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        Self {
            inner: RwLock::new(Inner {
                petitions,
                ..Inner::default()
            }),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(poisoned)
    }
}

fn poisoned<T>(_: PoisonError<T>) -> StoreError {
    StoreError::Unavailable("in-memory store lock poisoned".to_string())
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }

    async fn find_petition_by_slug(&self, slug: &str) -> StoreResult<Option<Petition>> {
        let inner = self.read()?;
        Ok(inner.petitions.values().find(|p| p.slug == slug).cloned())
    }

    async fn get_petition(&self, id: &PetitionId) -> StoreResult<Option<Petition>> {
        Ok(self.read()?.petitions.get(id).cloned())
    }

    async fn list_active_petitions(&self) -> StoreResult<Vec<Petition>> {
        let inner = self.read()?;
        let mut petitions: Vec<Petition> = inner
            .petitions
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        petitions.sort_by(petition::display_order);
        Ok(petitions)
    }

    async fn insert_signature(&self, signature: NewSignature) -> StoreResult<Signature> {
        let mut inner = self.write()?;

        let key = (
            signature.petition_id.clone(),
            signature.email_fingerprint.clone(),
        );
        if !inner.signed.insert(key) {
            return Err(StoreError::DuplicateKey);
        }

        let signature = signature.into_signature(Uuid::new_v4(), Utc::now());
        inner.signatures.push(signature.clone());
        Ok(signature)
    }

    async fn count_signatures(&self, petition_id: &PetitionId) -> StoreResult<i64> {
        let inner = self.read()?;
        let count = inner
            .signatures
            .iter()
            .filter(|s| &s.petition_id == petition_id)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn find_signature(
        &self,
        petition_id: &PetitionId,
        fingerprint: &EmailFingerprint,
    ) -> StoreResult<Option<Signature>> {
        let inner = self.read()?;
        Ok(inner
            .signatures
            .iter()
            .find(|s| &s.petition_id == petition_id && &s.email_fingerprint == fingerprint)
            .cloned())
    }

    async fn list_recent_public_signatures(
        &self,
        petition_id: &PetitionId,
        limit: usize,
    ) -> StoreResult<Vec<Signature>> {
        let inner = self.read()?;
        // Insertion order is creation order, so walking backwards is newest first.
        Ok(inner
            .signatures
            .iter()
            .rev()
            .filter(|s| &s.petition_id == petition_id && s.display_public)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn insert_share(&self, share: SocialShare) -> StoreResult<SocialShare> {
        self.write()?.shares.push(share.clone());
        Ok(share)
    }

    async fn count_shares(&self, entity_type: &str, entity_id: Option<&str>) -> StoreResult<i64> {
        let inner = self.read()?;
        let count = inner
            .shares
            .iter()
            .filter(|s| s.entity_type == entity_type)
            .filter(|s| entity_id.is_none_or(|id| s.entity_id.as_deref() == Some(id)))
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn insert_story(&self, story: Story) -> StoreResult<Story> {
        self.write()?.stories.push(story.clone());
        Ok(story)
    }

    async fn list_approved_stories(&self) -> StoreResult<Vec<Story>> {
        let inner = self.read()?;
        Ok(inner
            .stories
            .iter()
            .rev()
            .filter(|s| s.is_approved)
            .cloned()
            .collect())
    }

    async fn totals(&self) -> StoreResult<EngagementTotals> {
        let inner = self.read()?;
        let len = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
        Ok(EngagementTotals {
            signatures: len(inner.signatures.len()),
            social_shares: len(inner.shares.len()),
        })
    }
}
