use serde::Serialize;

use crate::petition::PetitionId;
use crate::{Error, Result};

/// Display-ready progress of one petition toward its goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PetitionStats {
    pub petition_id: PetitionId,
    pub signature_count: i64,
    pub goal_count: i64,
    /// Whole percent, clamped to 100.
    pub progress: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub signature_count: i64,
    pub goal_count: i64,
    pub percent: u8,
}

/// `round(min(100, count / goal * 100))`. A non-positive goal has no defined
/// progress and is reported as an invariant violation.
pub fn aggregate(signature_count: i64, goal_count: i64) -> Result<Progress> {
    if goal_count <= 0 {
        return Err(Error::InvariantViolation(format!(
            "goal count must be positive, got {goal_count}"
        )));
    }

    let ratio = signature_count.max(0) as f64 / goal_count as f64 * 100.0;
    let percent = ratio.min(100.0).round() as u8;

    Ok(Progress {
        signature_count,
        goal_count,
        percent,
    })
}

impl PetitionStats {
    pub fn new(petition_id: PetitionId, signature_count: i64, goal_count: i64) -> Result<Self> {
        let progress = aggregate(signature_count, goal_count)?;
        Ok(Self {
            petition_id,
            signature_count: progress.signature_count,
            goal_count: progress.goal_count,
            progress: progress.percent,
        })
    }
}

/// Raw totals across the whole platform, as counted by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngagementTotals {
    pub signatures: i64,
    pub social_shares: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformStats {
    pub signatures: i64,
    pub social_shares: i64,
    pub total_impact: i64,
}

impl From<EngagementTotals> for PlatformStats {
    fn from(totals: EngagementTotals) -> Self {
        Self {
            signatures: totals.signatures,
            social_shares: totals.social_shares,
            total_impact: totals.signatures + totals.social_shares,
        }
    }
}
