use std::sync::Arc;

use crate::share::{NewSocialShare, SocialShare};
use crate::stats::PlatformStats;
use crate::story::{NewStory, Story};
use crate::store::Store;
use crate::Result;

/// Shares, stories and platform-wide totals. Append-only, no deduplication.
#[derive(Clone)]
pub struct EngagementService {
    store: Arc<dyn Store>,
}

impl EngagementService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn record_share(&self, share: NewSocialShare) -> Result<SocialShare> {
        let share = self.store.insert_share(share.into_share()?).await?;
        tracing::debug!(
            platform = %share.platform,
            entity_type = %share.entity_type,
            "social share recorded"
        );
        Ok(share)
    }

    pub async fn share_count(&self, entity_type: &str, entity_id: Option<&str>) -> Result<i64> {
        let entity_type = entity_type.trim().to_lowercase();
        let entity_id = entity_id.map(str::trim).filter(|id| !id.is_empty());
        Ok(self.store.count_shares(&entity_type, entity_id).await?)
    }

    pub async fn submit_story(&self, story: NewStory) -> Result<Story> {
        let story = self.store.insert_story(story.into_story()?).await?;
        tracing::info!(story = %story.id, issue = %story.issue, "story submitted");
        Ok(story)
    }

    pub async fn stories(&self) -> Result<Vec<Story>> {
        Ok(self.store.list_approved_stories().await?)
    }

    pub async fn platform_stats(&self) -> Result<PlatformStats> {
        Ok(PlatformStats::from(self.store.totals().await?))
    }
}
