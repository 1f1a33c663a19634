use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// A visitor shared a petition, story or letter on a social platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialShare {
    pub id: Uuid,
    pub platform: String,
    pub entity_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSocialShare {
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
}

impl NewSocialShare {
    pub fn new(platform: &str, entity_type: &str, entity_id: Option<&str>) -> Self {
        Self {
            platform: Some(platform.to_string()),
            entity_type: Some(entity_type.to_string()),
            entity_id: entity_id.map(ToString::to_string),
        }
    }

    /// Checks required fields and builds the record to store.
    pub fn into_share(self) -> Result<SocialShare> {
        let platform = required(self.platform, "platform")?.to_lowercase();
        let entity_type = required(self.entity_type, "entityType")?.to_lowercase();
        let entity_id = self
            .entity_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        Ok(SocialShare {
            id: Uuid::new_v4(),
            platform,
            entity_type,
            entity_id,
            created_at: Utc::now(),
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::validation(format!("Missing required field: {field}")))
}
