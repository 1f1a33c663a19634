use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::petition::PetitionId;
use crate::{Error, Result};

const MAX_NAME_LEN: usize = 200;
const MAX_ZIP_LEN: usize = 20;

static EMAIL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").ok()
});

/// SHA-256 of the normalized email, hex encoded.
///
/// This is the deduplication key for signatures and the only form in which a
/// signer's email is ever stored. It is partial privacy protection, not
/// anonymization: name and zip code travel alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailFingerprint(String);

impl EmailFingerprint {
    #[must_use]
    pub fn of(email: &str) -> Self {
        let normalized = email.trim().to_lowercase();
        let digest = Sha256::digest(normalized.as_bytes());
        Self(hex::encode(digest))
    }

    /// Wraps a fingerprint read back from storage.
    pub(crate) fn from_stored(hash: String) -> Self {
        Self(hash)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Enough to correlate log lines, not enough to brute-force.
        f.write_str(self.0.get(..8).unwrap_or(&self.0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub id: Uuid,
    pub petition_id: PetitionId,
    pub name: String,
    pub email_fingerprint: EmailFingerprint,
    pub zip_code: String,
    pub display_public: bool,
    pub created_at: DateTime<Utc>,
}

/// A signature ready for insertion; the store assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewSignature {
    pub petition_id: PetitionId,
    pub name: String,
    pub email_fingerprint: EmailFingerprint,
    pub zip_code: String,
    pub display_public: bool,
}

impl NewSignature {
    #[must_use]
    pub fn into_signature(self, id: Uuid, created_at: DateTime<Utc>) -> Signature {
        Signature {
            id,
            petition_id: self.petition_id,
            name: self.name,
            email_fingerprint: self.email_fingerprint,
            zip_code: self.zip_code,
            display_public: self.display_public,
            created_at,
        }
    }
}

/// Raw signing input as submitted by a visitor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub display_public: Option<bool>,
}

/// Signing input that passed validation. Fields are trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSignature {
    pub name: String,
    pub email: String,
    pub zip_code: String,
    pub display_public: bool,
}

impl SignatureRequest {
    pub fn new(name: &str, email: &str, zip_code: &str, display_public: bool) -> Self {
        Self {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            zip_code: Some(zip_code.to_string()),
            display_public: Some(display_public),
        }
    }

    pub fn validate(&self) -> Result<ValidSignature> {
        let name = present(self.name.as_deref());
        let email = present(self.email.as_deref());
        let zip_code = present(self.zip_code.as_deref());

        let (Some(name), Some(email), Some(zip_code)) = (name, email, zip_code) else {
            let missing: Vec<&str> = [("name", name), ("email", email), ("zipCode", zip_code)]
                .into_iter()
                .filter_map(|(field, value)| value.is_none().then_some(field))
                .collect();
            return Err(Error::validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        };

        if name.chars().count() > MAX_NAME_LEN {
            return Err(Error::validation(format!(
                "Name must be at most {MAX_NAME_LEN} characters"
            )));
        }
        if zip_code.chars().count() > MAX_ZIP_LEN {
            return Err(Error::validation(format!(
                "Zip code must be at most {MAX_ZIP_LEN} characters"
            )));
        }
        if !is_email(email) {
            return Err(Error::validation("Invalid email address"));
        }

        Ok(ValidSignature {
            name: name.to_string(),
            email: email.to_string(),
            zip_code: zip_code.to_string(),
            display_public: self.display_public.unwrap_or(false),
        })
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn is_email(candidate: &str) -> bool {
    EMAIL_PATTERN.as_ref().map_or_else(
        || candidate.split_once('@').is_some_and(|(l, d)| !l.is_empty() && d.contains('.')),
        |re| re.is_match(candidate),
    )
}

/// What a signer gets back after a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureReceipt {
    pub id: Uuid,
    pub petition_id: PetitionId,
    pub name: String,
    pub zip_code: String,
    pub display_public: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Signature> for SignatureReceipt {
    fn from(s: Signature) -> Self {
        Self {
            id: s.id,
            petition_id: s.petition_id,
            name: s.name,
            zip_code: s.zip_code,
            display_public: s.display_public,
            created_at: s.created_at,
        }
    }
}
