use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("{}", not_found_message(.0))]
    PetitionNotFound(String),

    #[error("You have already signed this petition")]
    AlreadySigned,

    #[error("Storage unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// True for errors caused by the caller's input rather than the server.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::PetitionNotFound(_) | Self::AlreadySigned
        )
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey => Self::AlreadySigned,
            StoreError::UnknownPetition(id) => Self::PetitionNotFound(id.to_string()),
            StoreError::Unavailable(reason) => Self::StoreUnavailable(reason),
            StoreError::Backend(reason) => Self::Storage(reason),
        }
    }
}

fn not_found_message(reference: &str) -> String {
    if reference.is_empty() {
        "Petition not found: no petition was given".to_string()
    } else {
        format!("Petition not found: {reference}")
    }
}

pub type Result<T> = std::result::Result<T, Error>;
