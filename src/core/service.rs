//! Remote service contract
//!
//! One method per backend operation, typed request in, typed response out.
//! Implementations normalize every failure into [`Error`]; the transport
//! behind them is opaque to the session and the reconciler.

use async_trait::async_trait;

use crate::types::{
    AppStats, Candidate, EncodedImage, Error, HistoryEntry, LeaderboardEntry, Match, NewProfile,
    RatingOutcome, RatingPreview, RatingRequest, RemotePhoto, UserProfile, UserStatsReport,
};

pub type ServiceResult<T> = Result<T, Error>;

/// Backend operations consumed by the client core
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Liveness probe; returns the server's greeting
    async fn health(&self) -> ServiceResult<String>;

    /// Create a profile; the returned id becomes the persisted identity
    async fn create_profile(&self, profile: &NewProfile) -> ServiceResult<UserProfile>;

    async fn get_user(&self, user_id: &str) -> ServiceResult<UserProfile>;

    async fn list_users(&self) -> ServiceResult<Vec<UserProfile>>;

    /// Next discovery batch for `rater_id`, in presentation order. May be empty.
    async fn discover(&self, rater_id: &str) -> ServiceResult<Vec<Candidate>>;

    async fn submit_rating(&self, request: &RatingRequest) -> ServiceResult<RatingOutcome>;

    /// Projected impact of a rating, no side effects
    async fn preview_rating(&self, request: &RatingRequest) -> ServiceResult<RatingPreview>;

    /// Authoritative photo snapshot for `owner_id`
    async fn fetch_photos(&self, owner_id: &str) -> ServiceResult<Vec<RemotePhoto>>;

    /// Upload one photo
    async fn upload_photo(&self, owner_id: &str, image: &EncodedImage) -> ServiceResult<RemotePhoto>;

    async fn delete_photo(&self, owner_id: &str, photo_id: &str) -> ServiceResult<()>;

    /// Promote a persisted photo to main
    async fn promote_photo(&self, owner_id: &str, photo_id: &str) -> ServiceResult<()>;

    async fn leaderboard(&self) -> ServiceResult<Vec<LeaderboardEntry>>;

    async fn app_stats(&self) -> ServiceResult<AppStats>;

    async fn user_stats(&self, user_id: &str) -> ServiceResult<UserStatsReport>;

    async fn user_matches(&self, user_id: &str) -> ServiceResult<Vec<Match>>;

    async fn rating_history(&self, user_id: &str, limit: usize) -> ServiceResult<Vec<HistoryEntry>>;
}
