use std::sync::Arc;

use crate::petition::{Petition, DEFAULT_GOAL};
use crate::resolver::PetitionResolver;
use crate::signature::{EmailFingerprint, NewSignature, Signature, SignatureReceipt, SignatureRequest};
use crate::stats::PetitionStats;
use crate::store::{Store, StoreError};
use crate::{Error, Result};

/// Number of recent signatures listed when the caller gives no limit.
pub const DEFAULT_RECENT_LIMIT: usize = 5;
pub const MAX_RECENT_LIMIT: usize = 100;

/// Business rules for signing petitions and reading their progress.
#[derive(Clone)]
pub struct SignatureService {
    store: Arc<dyn Store>,
    resolver: PetitionResolver,
    default_goal: i64,
}

impl SignatureService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            resolver: PetitionResolver::new(Arc::clone(&store)),
            store,
            default_goal: DEFAULT_GOAL,
        }
    }

    /// Goal reported for petitions that have no record in the store serving
    /// the request.
    #[must_use]
    pub fn with_default_goal(mut self, goal: i64) -> Self {
        self.default_goal = goal;
        self
    }

    /// Records one signature per email per petition.
    ///
    /// The lookup before the insert only produces the friendly rejection in
    /// the common case; the store's uniqueness constraint decides races.
    pub async fn submit(&self, petition: &str, request: &SignatureRequest) -> Result<SignatureReceipt> {
        let valid = request.validate()?;
        let petition_id = self.resolver.resolve(petition).await?;
        let fingerprint = EmailFingerprint::of(&valid.email);

        if self
            .store
            .find_signature(&petition_id, &fingerprint)
            .await?
            .is_some()
        {
            tracing::debug!(petition = %petition_id, fingerprint = %fingerprint, "already signed");
            return Err(Error::AlreadySigned);
        }

        let signature = self
            .store
            .insert_signature(NewSignature {
                petition_id,
                name: valid.name,
                email_fingerprint: fingerprint,
                zip_code: valid.zip_code,
                display_public: valid.display_public,
            })
            .await
            .map_err(|e| {
                if e == StoreError::DuplicateKey {
                    tracing::debug!("concurrent duplicate signature rejected by store");
                }
                Error::from(e)
            })?;

        tracing::info!(
            petition = %signature.petition_id,
            signature = %signature.id,
            fingerprint = %signature.email_fingerprint,
            "petition signed"
        );

        Ok(SignatureReceipt::from(signature))
    }

    pub async fn stats(&self, petition: &str) -> Result<PetitionStats> {
        let petition_id = self.resolver.resolve(petition).await?;
        let signature_count = self.store.count_signatures(&petition_id).await?;
        let goal_count = self
            .store
            .get_petition(&petition_id)
            .await?
            .map_or(self.default_goal, |p| p.goal_count);

        PetitionStats::new(petition_id, signature_count, goal_count).inspect_err(|e| {
            tracing::error!(error = %e, "cannot compute petition progress");
        })
    }

    /// Newest public signatures. `limit` defaults to five and is clamped to
    /// `1..=100`.
    pub async fn recent(&self, petition: &str, limit: Option<usize>) -> Result<Vec<Signature>> {
        let petition_id = self.resolver.resolve(petition).await?;
        let limit = limit
            .unwrap_or(DEFAULT_RECENT_LIMIT)
            .clamp(1, MAX_RECENT_LIMIT);

        Ok(self
            .store
            .list_recent_public_signatures(&petition_id, limit)
            .await?)
    }

    pub async fn petitions(&self) -> Result<Vec<Petition>> {
        Ok(self.store.list_active_petitions().await?)
    }
}
