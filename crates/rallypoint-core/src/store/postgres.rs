use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::sync::OnceCell;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::petition::{Petition, PetitionId};
use crate::share::SocialShare;
use crate::signature::{EmailFingerprint, NewSignature, Signature};
use crate::stats::EngagementTotals;
use crate::story::Story;

const INIT_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS petitions (
    id TEXT PRIMARY KEY,
    slug TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    goal_count INTEGER NOT NULL DEFAULT 10000,
    is_main BOOLEAN NOT NULL DEFAULT FALSE,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS signatures (
    id UUID PRIMARY KEY,
    petition_id TEXT NOT NULL REFERENCES petitions(id),
    name TEXT NOT NULL,
    email_hash TEXT NOT NULL,
    zip_code TEXT NOT NULL,
    display_public BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_signatures_unique ON signatures(petition_id, email_hash);
CREATE INDEX IF NOT EXISTS idx_signatures_recent ON signatures(petition_id, created_at DESC);

CREATE TABLE IF NOT EXISTS social_shares (
    id UUID PRIMARY KEY,
    platform TEXT NOT NULL,
    entity_type TEXT NOT NULL,
    entity_id TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_shares_entity ON social_shares(entity_type, entity_id);

CREATE TABLE IF NOT EXISTS stories (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    location TEXT NOT NULL,
    role TEXT NOT NULL,
    issue TEXT NOT NULL,
    title TEXT NOT NULL,
    story TEXT NOT NULL,
    consent BOOLEAN NOT NULL,
    is_approved BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#;

const PETITION_COLUMNS: &str =
    "id, slug, title, goal_count::BIGINT, is_main, is_active, created_at";

const SIGNATURE_COLUMNS: &str =
    "id, petition_id, name, email_hash, zip_code, display_public, created_at";

type PetitionRow = (String, String, String, i64, bool, bool, DateTime<Utc>);
type SignatureRow = (Uuid, String, String, String, String, bool, DateTime<Utc>);
type StoryRow = (
    Uuid,
    String,
    String,
    String,
    String,
    String,
    String,
    bool,
    bool,
    DateTime<Utc>,
);

/// The durable store: a PostgreSQL database reached over the network.
///
/// The schema and seed petitions are created on first successful use. A
/// failed bootstrap leaves the store unprepared and is retried by the next
/// call, so a database that was down at boot is set up once it comes back.
pub struct PgStore {
    pool: PgPool,
    seed: Vec<Petition>,
    bootstrapped: OnceCell<()>,
}

impl PgStore {
    /// Builds the pool without connecting, so the process can start while the
    /// database is down. Connections are opened on first use; acquiring one
    /// gives up after `acquire_timeout`.
    pub fn connect_lazy(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(url)?;

        Ok(Self {
            pool,
            seed: Vec::new(),
            bootstrapped: OnceCell::new(),
        })
    }

    /// Petitions inserted (unless already present) during bootstrap.
    #[must_use]
    pub fn with_seed(mut self, petitions: impl IntoIterator<Item = Petition>) -> Self {
        self.seed.extend(petitions);
        self
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.bootstrapped.initialized()
    }

    /// Creates the schema and seed petitions unless an earlier call already
    /// succeeded.
    pub async fn bootstrap(&self) -> StoreResult<()> {
        self.bootstrapped
            .get_or_try_init(|| async {
                let setup = async {
                    self.ensure_schema().await?;
                    for petition in &self.seed {
                        self.ensure_petition(petition).await?;
                    }
                    Ok::<(), StoreError>(())
                };
                // A racing bootstrap in another process can trip catalog or
                // slug uniqueness; that is not a duplicate signature.
                setup.await.map_err(|e| match e {
                    StoreError::DuplicateKey => {
                        StoreError::Backend("schema bootstrap raced another writer".to_string())
                    }
                    other => other,
                })?;
                tracing::info!(seeded = self.seed.len(), "durable store schema ready");
                Ok::<(), StoreError>(())
            })
            .await?;
        Ok(())
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::raw_sql(INIT_SQL).execute(&self.pool).await?;
        Ok(())
    }

    /// Inserts a petition unless one with the same id already exists.
    async fn ensure_petition(&self, petition: &Petition) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO petitions (id, slug, title, goal_count, is_main, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(petition.id.as_str())
        .bind(&petition.slug)
        .bind(&petition.title)
        .bind(i32::try_from(petition.goal_count).unwrap_or(i32::MAX))
        .bind(petition.is_main)
        .bind(petition.is_active)
        .bind(petition.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn fetch_petition(&self, column: &str, value: &str) -> StoreResult<Option<Petition>> {
        self.bootstrap().await?;
        let row: Option<PetitionRow> = sqlx::query_as(&format!(
            "SELECT {PETITION_COLUMNS} FROM petitions WHERE {column} = $1"
        ))
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(parse_petition_row))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Unavailable(err.to_string()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                Self::DuplicateKey
            }
            other => Self::Backend(other.to_string()),
        }
    }
}

#[async_trait]
impl Store for PgStore {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // Petition operations

    async fn find_petition_by_slug(&self, slug: &str) -> StoreResult<Option<Petition>> {
        self.fetch_petition("slug", slug).await
    }

    async fn get_petition(&self, id: &PetitionId) -> StoreResult<Option<Petition>> {
        self.fetch_petition("id", id.as_str()).await
    }

    async fn list_active_petitions(&self) -> StoreResult<Vec<Petition>> {
        self.bootstrap().await?;
        let rows: Vec<PetitionRow> = sqlx::query_as(&format!(
            "SELECT {PETITION_COLUMNS} FROM petitions WHERE is_active ORDER BY is_main DESC, title"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(parse_petition_row).collect())
    }

    // Signature operations

    async fn insert_signature(&self, signature: NewSignature) -> StoreResult<Signature> {
        self.bootstrap().await?;
        let petition_id = signature.petition_id.clone();

        let row: SignatureRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO signatures (id, petition_id, name, email_hash, zip_code, display_public)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {SIGNATURE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(signature.petition_id.as_str())
        .bind(&signature.name)
        .bind(signature.email_fingerprint.as_str())
        .bind(&signature.zip_code)
        .bind(signature.display_public)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_foreign_key_violation() {
                    return StoreError::UnknownPetition(petition_id);
                }
            }
            StoreError::from(e)
        })?;

        Ok(parse_signature_row(row))
    }

    async fn count_signatures(&self, petition_id: &PetitionId) -> StoreResult<i64> {
        self.bootstrap().await?;
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM signatures WHERE petition_id = $1")
            .bind(petition_id.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn find_signature(
        &self,
        petition_id: &PetitionId,
        fingerprint: &EmailFingerprint,
    ) -> StoreResult<Option<Signature>> {
        self.bootstrap().await?;
        let row: Option<SignatureRow> = sqlx::query_as(&format!(
            "SELECT {SIGNATURE_COLUMNS} FROM signatures WHERE petition_id = $1 AND email_hash = $2"
        ))
        .bind(petition_id.as_str())
        .bind(fingerprint.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(parse_signature_row))
    }

    async fn list_recent_public_signatures(
        &self,
        petition_id: &PetitionId,
        limit: usize,
    ) -> StoreResult<Vec<Signature>> {
        self.bootstrap().await?;
        let rows: Vec<SignatureRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SIGNATURE_COLUMNS} FROM signatures
            WHERE petition_id = $1 AND display_public
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(petition_id.as_str())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(parse_signature_row).collect())
    }

    // Engagement operations

    async fn insert_share(&self, share: SocialShare) -> StoreResult<SocialShare> {
        self.bootstrap().await?;
        sqlx::query(
            r#"
            INSERT INTO social_shares (id, platform, entity_type, entity_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(share.id)
        .bind(&share.platform)
        .bind(&share.entity_type)
        .bind(&share.entity_id)
        .bind(share.created_at)
        .execute(&self.pool)
        .await?;

        Ok(share)
    }

    async fn count_shares(&self, entity_type: &str, entity_id: Option<&str>) -> StoreResult<i64> {
        self.bootstrap().await?;
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM social_shares
            WHERE entity_type = $1 AND ($2::TEXT IS NULL OR entity_id = $2)
            "#,
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn insert_story(&self, story: Story) -> StoreResult<Story> {
        self.bootstrap().await?;
        sqlx::query(
            r#"
            INSERT INTO stories (id, name, location, role, issue, title, story, consent, is_approved, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(story.id)
        .bind(&story.name)
        .bind(&story.location)
        .bind(&story.role)
        .bind(&story.issue)
        .bind(&story.title)
        .bind(&story.body)
        .bind(story.consent)
        .bind(story.is_approved)
        .bind(story.created_at)
        .execute(&self.pool)
        .await?;

        Ok(story)
    }

    async fn list_approved_stories(&self) -> StoreResult<Vec<Story>> {
        self.bootstrap().await?;
        let rows: Vec<StoryRow> = sqlx::query_as(
            r#"
            SELECT id, name, location, role, issue, title, story, consent, is_approved, created_at
            FROM stories WHERE is_approved
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(parse_story_row).collect())
    }

    async fn totals(&self) -> StoreResult<EngagementTotals> {
        self.bootstrap().await?;
        let (signatures, social_shares): (i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM signatures),
                    (SELECT COUNT(*) FROM social_shares)
                "#,
            )
            .fetch_one(&self.pool)
            .await?;

        Ok(EngagementTotals {
            signatures,
            social_shares,
        })
    }
}

fn parse_petition_row(row: PetitionRow) -> Petition {
    let (id, slug, title, goal_count, is_main, is_active, created_at) = row;

    Petition {
        id: PetitionId::new(id),
        slug,
        title,
        goal_count,
        is_main,
        is_active,
        created_at,
    }
}

fn parse_signature_row(row: SignatureRow) -> Signature {
    let (id, petition_id, name, email_hash, zip_code, display_public, created_at) = row;

    Signature {
        id,
        petition_id: PetitionId::new(petition_id),
        name,
        email_fingerprint: EmailFingerprint::from_stored(email_hash),
        zip_code,
        display_public,
        created_at,
    }
}

fn parse_story_row(row: StoryRow) -> Story {
    let (id, name, location, role, issue, title, body, consent, is_approved, created_at) = row;

    Story {
        id,
        name,
        location,
        role,
        issue,
        title,
        body,
        consent,
        is_approved,
        created_at,
    }
}
