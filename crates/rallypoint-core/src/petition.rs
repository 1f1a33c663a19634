use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Internal identifier of a petition, as stored in the `petitions.id` column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PetitionId(String);

impl PetitionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PetitionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PetitionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Slugs are hyphenated (`hb1481-device-restrictions`); internal ids never are.
#[must_use]
pub fn looks_like_slug(input: &str) -> bool {
    input.contains('-')
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Petition {
    pub id: PetitionId,
    pub slug: String,
    pub title: String,
    pub goal_count: i64,
    pub is_main: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Petition {
    pub fn new(id: impl Into<String>, slug: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: PetitionId::new(id),
            slug: slug.into(),
            title: title.into(),
            goal_count: DEFAULT_GOAL,
            is_main: false,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_goal(mut self, goal_count: i64) -> Self {
        self.goal_count = goal_count;
        self
    }

    #[must_use]
    pub fn main(mut self) -> Self {
        self.is_main = true;
        self
    }

    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

/// Goal used when a petition record carries none, or cannot be found.
pub const DEFAULT_GOAL: i64 = 10_000;

/// The campaign's flagship petition. Seeded into the fallback store so the
/// main signing flow keeps working while the database is unreachable.
#[must_use]
pub fn flagship() -> Petition {
    Petition::new(
        "cmeky1irj0000f5yhzgv7ocqu",
        "hb1481-device-restrictions",
        "Oppose HB 1481 - Device Restrictions",
    )
    .main()
}

/// Orders petitions for display: main petition first, then by title.
pub(crate) fn display_order(a: &Petition, b: &Petition) -> std::cmp::Ordering {
    b.is_main
        .cmp(&a.is_main)
        .then_with(|| a.title.cmp(&b.title))
}
