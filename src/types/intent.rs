//! Swipe direction, rating value and pending intent

use serde::{Deserialize, Serialize};

use crate::types::ValidationError;
use crate::{DEFAULT_RATING, RATING_MAX, RATING_MIN};

/// Direction of a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Swipe right
    Like,
    /// Swipe left
    Pass,
}

impl Direction {
    /// Whether the rating request carries a match intent
    pub fn is_match(&self) -> bool {
        matches!(self, Direction::Like)
    }

    /// Screen side the card leaves towards
    pub fn side(&self) -> &'static str {
        match self {
            Direction::Like => "right",
            Direction::Pass => "left",
        }
    }

    /// Sign of the horizontal fling (+1 right, -1 left)
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Like => 1.0,
            Direction::Pass => -1.0,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Direction::Like => "LIKE",
            Direction::Pass => "PASS",
        };
        write!(f, "{}", name)
    }
}

/// A rating on the 1-10 scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct RatingValue(u8);

impl RatingValue {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value < i64::from(RATING_MIN) || value > i64::from(RATING_MAX) {
            return Err(ValidationError::RatingOutOfRange(value));
        }
        // Range checked above
        Ok(Self(value as u8))
    }

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl Default for RatingValue {
    fn default() -> Self {
        Self(DEFAULT_RATING)
    }
}

impl TryFrom<i64> for RatingValue {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RatingValue> for u8 {
    fn from(value: RatingValue) -> Self {
        value.0
    }
}

impl std::fmt::Display for RatingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/10", self.0)
    }
}

/// An unconfirmed decision awaiting a rating value. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingIntent {
    pub candidate_id: String,
    pub direction: Direction,
    pub rating: RatingValue,
}

impl PendingIntent {
    /// New intent at the default rating
    pub fn new(candidate_id: impl Into<String>, direction: Direction) -> Self {
        Self {
            candidate_id: candidate_id.into(),
            direction,
            rating: RatingValue::default(),
        }
    }
}
