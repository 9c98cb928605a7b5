//! Rating request/response contracts

use serde::{Deserialize, Serialize};

use crate::types::{PendingIntent, RatingValue};

/// Body of a rating (or rating preview) request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRequest {
    pub rater_id: String,
    pub rated_id: String,
    pub rating: RatingValue,
    pub is_match: bool,
}

impl RatingRequest {
    pub fn from_intent(rater_id: impl Into<String>, intent: &PendingIntent) -> Self {
        Self {
            rater_id: rater_id.into(),
            rated_id: intent.candidate_id.clone(),
            rating: intent.rating,
            is_match: intent.direction.is_match(),
        }
    }
}

/// Result of a submitted rating. Display data only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingOutcome {
    #[serde(default)]
    pub mutual_match: bool,
    #[serde(default)]
    pub rating_change_rater: f64,
    #[serde(default)]
    pub rating_change_rated: Option<f64>,
    #[serde(default)]
    pub new_rater_rating: Option<f64>,
    #[serde(default)]
    pub new_rated_rating: Option<f64>,
    #[serde(default)]
    pub rater_tier: Option<String>,
    #[serde(default)]
    pub rated_tier: Option<String>,
    #[serde(default)]
    pub match_id: Option<String>,
    #[serde(default)]
    pub impact: Option<String>,
}

/// Projected impact of a rating, without submitting it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingPreview {
    pub current_rater_rating: f64,
    pub current_rated_rating: f64,
    pub projected_rater_rating: f64,
    pub projected_rated_rating: f64,
    pub rater_change: f64,
    pub rated_change: f64,
    #[serde(default)]
    pub impact_description: String,
    #[serde(default)]
    pub rater_tier: String,
    #[serde(default)]
    pub rated_tier: String,
}
