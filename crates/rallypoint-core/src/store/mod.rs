//! Storage backends for petitions, signatures and engagement records.
//!
//! Every backend implements [`Store`]. [`PgStore`] is the durable store,
//! [`MemoryStore`] is the process-local fallback, and [`DualStore`] puts the
//! two together: each operation runs against the durable store first and is
//! retried against the fallback when the durable store times out or cannot be
//! reached.
//!
//! Writes accepted by the fallback are never replayed into the durable store.

mod dual;
mod memory;
mod postgres;

#[cfg(test)]
pub(crate) mod testing;

pub use dual::{DualStore, DurableStatus};
pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;

use crate::petition::{Petition, PetitionId};
use crate::share::SocialShare;
use crate::signature::{EmailFingerprint, NewSignature, Signature};
use crate::stats::EngagementTotals;
use crate::story::Story;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A signature for this petition and fingerprint already exists.
    #[error("duplicate signature")]
    DuplicateKey,

    #[error("unknown petition {0}")]
    UnknownPetition(PetitionId),

    /// The backend could not be reached or did not answer in time.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    async fn ping(&self) -> StoreResult<()>;

    // Petition operations

    async fn find_petition_by_slug(&self, slug: &str) -> StoreResult<Option<Petition>>;

    async fn get_petition(&self, id: &PetitionId) -> StoreResult<Option<Petition>>;

    /// Active petitions, main petition first, then by title.
    async fn list_active_petitions(&self) -> StoreResult<Vec<Petition>>;

    // Signature operations

    /// Fails with [`StoreError::DuplicateKey`] when the petition already holds a
    /// signature with the same fingerprint. Backends must enforce this
    /// themselves; callers' prior lookups are advisory.
    async fn insert_signature(&self, signature: NewSignature) -> StoreResult<Signature>;

    async fn count_signatures(&self, petition_id: &PetitionId) -> StoreResult<i64>;

    async fn find_signature(
        &self,
        petition_id: &PetitionId,
        fingerprint: &EmailFingerprint,
    ) -> StoreResult<Option<Signature>>;

    /// Newest first, `display_public` signatures only.
    async fn list_recent_public_signatures(
        &self,
        petition_id: &PetitionId,
        limit: usize,
    ) -> StoreResult<Vec<Signature>>;

    // Engagement operations

    async fn insert_share(&self, share: SocialShare) -> StoreResult<SocialShare>;

    async fn count_shares(&self, entity_type: &str, entity_id: Option<&str>) -> StoreResult<i64>;

    async fn insert_story(&self, story: Story) -> StoreResult<Story>;

    /// Approved stories, newest first.
    async fn list_approved_stories(&self) -> StoreResult<Vec<Story>>;

    async fn totals(&self) -> StoreResult<EngagementTotals>;
}
