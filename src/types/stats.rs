//! Read-only leaderboard, statistics, match and history records

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::types::wire::lenient_uint;
use crate::types::UserProfile;

/// Leaderboard row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    #[serde(deserialize_with = "lenient_uint")]
    pub rank: u32,
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "lenient_uint")]
    pub age: u32,
    pub elo_rating: f64,
    #[serde(default)]
    pub tier: String,
    #[serde(default)]
    pub photo_url: String,
}

/// App-wide rating statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppStats {
    pub total_users: u64,
    pub highest_elo: f64,
    pub lowest_elo: f64,
    pub average_elo: f64,
}

/// Per-user rating statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserStats {
    pub total_ratings_given: u64,
    pub total_ratings_received: u64,
    pub matches_given: u64,
    pub matches_received: u64,
    pub average_rating_given: f64,
    pub average_rating_received: f64,
    pub match_rate_given: f64,
    pub match_rate_received: f64,
}

/// Profile plus statistics, as returned by the user stats call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStatsReport {
    pub user: UserProfile,
    pub stats: UserStats,
    #[serde(default)]
    pub attractiveness_tier: String,
}

/// A mutual match between two users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub user1_id: String,
    pub user2_id: String,
    #[serde(deserialize_with = "lenient_utc")]
    pub created_at: DateTime<Utc>,
}

impl Match {
    /// The other side of the match from `user_id`'s point of view
    pub fn partner_of(&self, user_id: &str) -> &str {
        if self.user1_id == user_id {
            &self.user2_id
        } else {
            &self.user1_id
        }
    }
}

/// Whether a history entry was given or received by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Given,
    Received,
}

/// One rating in a user's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub rater_id: String,
    pub rated_id: String,
    #[serde(deserialize_with = "lenient_uint")]
    pub rating: u8,
    pub is_match: bool,
    #[serde(rename = "type")]
    pub kind: HistoryKind,
    #[serde(deserialize_with = "lenient_utc")]
    pub created_at: DateTime<Utc>,
}

/// Accepts RFC 3339 or a naive ISO timestamp (taken as UTC)
fn lenient_utc<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("bad timestamp: {raw}")))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
