use std::sync::Arc;

use crate::petition::{looks_like_slug, PetitionId};
use crate::store::Store;
use crate::{Error, Result};

/// Turns whatever a caller has for a petition, slug or internal id, into the
/// internal id.
#[derive(Clone)]
pub struct PetitionResolver {
    store: Arc<dyn Store>,
}

impl PetitionResolver {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Ids pass through untouched without a store lookup. Slugs must name an
    /// existing petition.
    pub async fn resolve(&self, slug_or_id: &str) -> Result<PetitionId> {
        let input = slug_or_id.trim();
        if input.is_empty() {
            return Err(Error::PetitionNotFound(String::new()));
        }
        if !looks_like_slug(input) {
            return Ok(PetitionId::from(input));
        }

        match self.store.find_petition_by_slug(input).await? {
            Some(petition) => {
                tracing::debug!(slug = input, id = %petition.id, "resolved petition slug");
                Ok(petition.id)
            }
            None => Err(Error::PetitionNotFound(input.to_string())),
        }
    }
}
