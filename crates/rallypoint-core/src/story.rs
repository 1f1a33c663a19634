use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub role: String,
    pub issue: String,
    pub title: String,
    pub body: String,
    pub consent: bool,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

/// A personal story as submitted. Everything but `consent` and the story text
/// is optional and falls back to a neutral default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewStory {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub issue: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "story")]
    pub body: Option<String>,
    #[serde(default)]
    pub consent: bool,
}

impl NewStory {
    /// Stories are published without moderation once consent is given.
    pub fn into_story(self) -> Result<Story> {
        if !self.consent {
            return Err(Error::validation("Consent is required to submit a story"));
        }
        let body = or_default(self.body, "");
        if body.is_empty() {
            return Err(Error::validation("Story text is required"));
        }

        Ok(Story {
            id: Uuid::new_v4(),
            name: or_default(self.name, "Anonymous"),
            location: or_default(self.location, "Texas"),
            role: or_default(self.role, "community"),
            issue: or_default(self.issue, "general"),
            title: or_default(self.title, "Untitled Story"),
            body,
            consent: true,
            is_approved: true,
            created_at: Utc::now(),
        })
    }
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}
