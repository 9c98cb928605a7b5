//! Candidate and profile records

use serde::{Deserialize, Serialize};

use crate::types::wire::lenient_uint;
use crate::types::ValidationError;
use crate::MIN_PROFILE_AGE;

/// A profile presented for rating. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "lenient_uint")]
    pub age: u32,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub photo_url: String,
    pub elo_rating: f64,
}

/// The signed-in user's own profile has the same shape
pub type UserProfile = Candidate;

/// Fields sent when creating a profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProfile {
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub photo_url: String,
}

impl NewProfile {
    pub fn new(name: impl Into<String>, age: u32) -> Self {
        Self {
            name: name.into(),
            age,
            bio: String::new(),
            photo_url: String::new(),
        }
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = bio.into();
        self
    }

    /// Local checks run before any request is made
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.age < MIN_PROFILE_AGE {
            return Err(ValidationError::UnderAge(self.age));
        }
        Ok(())
    }
}

impl Candidate {
    /// One-line card summary
    pub fn headline(&self) -> String {
        format!("{}, {} ({:.0} Elo)", self.name, self.age, self.elo_rating)
    }
}
