//! In-memory [`RemoteService`]
//!
//! Backs `--offline` mode and the test suite. Mirrors the backend's
//! observable contract (ordering, main-photo rules, error messages) and adds
//! latency simulation, failure injection and call counters.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::core::service::{RemoteService, ServiceResult};
use crate::types::{
    AppStats, Candidate, EncodedImage, Error, HistoryEntry, HistoryKind, LeaderboardEntry, Match,
    NewProfile, RatingOutcome, RatingPreview, RatingRequest, RemotePhoto, UserProfile, UserStats,
    UserStatsReport,
};

const STARTING_ELO: f64 = 1200.0;

/// Sample profiles seeded by [`MemoryService::with_sample_users`]
const SAMPLE_USERS: &[(&str, u32, &str)] = &[
    ("Alice", 25, "Love hiking and photography"),
    ("Bob", 28, "Software engineer who loves cooking"),
    ("Carol", 24, "Artist and yoga enthusiast"),
    ("David", 30, "Musician and coffee lover"),
    ("Emma", 26, "Travel blogger and foodie"),
    ("Frank", 29, "Fitness trainer and outdoor enthusiast"),
    ("Grace", 27, "Doctor who loves reading"),
    ("Henry", 31, "Chef and wine connoisseur"),
];

/// How many times each operation was invoked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounters {
    pub discover: usize,
    pub ratings: usize,
    pub uploads: usize,
    pub deletes: usize,
    pub promotes: usize,
    pub photo_fetches: usize,
}

/// Injected failures
#[derive(Debug, Clone, Default)]
pub struct FailurePlan {
    pub ratings: bool,
    pub discover: bool,
    pub deletes: bool,
    pub promotes: bool,
    pub photo_fetches: bool,
    /// Uploads whose base64 payload is in this set fail
    pub upload_payloads: HashSet<String>,
}

#[derive(Debug, Clone)]
struct StoredRating {
    id: String,
    rater_id: String,
    rated_id: String,
    rating: u8,
    is_match: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct StoredPhoto {
    owner_id: String,
    photo: RemotePhoto,
}

#[derive(Debug, Default)]
struct Backend {
    users: Vec<UserProfile>,
    ratings: Vec<StoredRating>,
    photos: Vec<StoredPhoto>,
    matches: Vec<Match>,
    next_id: u64,
    counters: CallCounters,
    failures: FailurePlan,
}

impl Backend {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn user(&self, id: &str) -> ServiceResult<&UserProfile> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .ok_or_else(|| Error::service(404, Some("User not found".to_string())))
    }

    fn liked(&self, rater_id: &str, rated_id: &str) -> bool {
        self.ratings
            .iter()
            .any(|r| r.rater_id == rater_id && r.rated_id == rated_id && r.is_match)
    }

    fn photos_of(&self, owner_id: &str) -> Vec<RemotePhoto> {
        let mut photos: Vec<RemotePhoto> = self
            .photos
            .iter()
            .filter(|p| p.owner_id == owner_id)
            .map(|p| p.photo.clone())
            .collect();
        // Main first, otherwise creation order (stable sort)
        photos.sort_by_key(|p| !p.is_main);
        photos
    }
}

/// In-memory backend
#[derive(Debug)]
pub struct MemoryService {
    backend: Mutex<Backend>,
    latency: Duration,
    batch_size: Option<usize>,
    rating_delta: f64,
}

impl Default for MemoryService {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryService {
    pub fn new() -> Self {
        Self {
            backend: Mutex::new(Backend::default()),
            latency: Duration::ZERO,
            batch_size: None,
            rating_delta: 0.0,
        }
    }

    /// Seeded with eight sample profiles
    pub fn with_sample_users() -> Self {
        let service = Self::new();
        for (name, age, bio) in SAMPLE_USERS {
            service.add_user(name, *age, bio);
        }
        service
    }

    /// Delay applied to every rating and upload call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Cap discovery batches at `size` candidates
    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = Some(size);
        self
    }

    /// Elo change reported to the rater on every rating
    pub fn with_rating_delta(mut self, delta: f64) -> Self {
        self.rating_delta = delta;
        self
    }

    fn backend(&self) -> MutexGuard<'_, Backend> {
        self.backend.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a profile directly, returning its id
    pub fn add_user(&self, name: &str, age: u32, bio: &str) -> String {
        let mut backend = self.backend();
        let id = backend.next_id("user");
        backend.users.push(Candidate {
            id: id.clone(),
            name: name.to_string(),
            age,
            bio: bio.to_string(),
            photo_url: format!("https://via.placeholder.com/300x400?text={name}"),
            elo_rating: STARTING_ELO,
        });
        id
    }

    /// Insert a persisted photo directly
    pub fn add_photo(&self, owner_id: &str, url: &str) -> RemotePhoto {
        let mut backend = self.backend();
        let id = backend.next_id("photo");
        let is_main = !backend.photos.iter().any(|p| p.owner_id == owner_id);
        let photo = RemotePhoto {
            id,
            url: url.to_string(),
            is_main,
        };
        backend.photos.push(StoredPhoto {
            owner_id: owner_id.to_string(),
            photo: photo.clone(),
        });
        photo
    }

    pub fn user_ids(&self) -> Vec<String> {
        self.backend().users.iter().map(|u| u.id.clone()).collect()
    }

    pub fn counters(&self) -> CallCounters {
        self.backend().counters
    }

    /// Replace the failure plan
    pub fn set_failures(&self, failures: FailurePlan) {
        self.backend().failures = failures;
    }

    /// Adjust the failure plan in place
    pub fn update_failures(&self, f: impl FnOnce(&mut FailurePlan)) {
        f(&mut self.backend().failures);
    }

    /// Server-side photo snapshot, bypassing counters
    pub fn stored_photos(&self, owner_id: &str) -> Vec<RemotePhoto> {
        self.backend().photos_of(owner_id)
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn tier_for(elo: f64) -> &'static str {
    match elo {
        e if e >= 2000.0 => "Elite",
        e if e >= 1700.0 => "Very Attractive",
        e if e >= 1400.0 => "Attractive",
        e if e >= 1100.0 => "Average",
        e if e >= 800.0 => "Below Average",
        _ => "Low",
    }
}

fn check_rating_pair(backend: &Backend, request: &RatingRequest) -> ServiceResult<(f64, f64)> {
    let rater = backend.users.iter().find(|u| u.id == request.rater_id);
    let rated = backend.users.iter().find(|u| u.id == request.rated_id);
    match (rater, rated) {
        (Some(a), Some(b)) => Ok((a.elo_rating, b.elo_rating)),
        _ => Err(Error::service(404, Some("One or both users not found".to_string()))),
    }
}

#[async_trait]
impl RemoteService for MemoryService {
    async fn health(&self) -> ServiceResult<String> {
        Ok("EloVe API is running!".to_string())
    }

    async fn create_profile(&self, profile: &NewProfile) -> ServiceResult<UserProfile> {
        if profile.name.trim().is_empty() {
            return Err(Error::service(400, Some("Name and age are required".to_string())));
        }
        let mut backend = self.backend();
        let id = backend.next_id("user");
        let user = Candidate {
            id,
            name: profile.name.clone(),
            age: profile.age,
            bio: profile.bio.clone(),
            photo_url: profile.photo_url.clone(),
            elo_rating: STARTING_ELO,
        };
        backend.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: &str) -> ServiceResult<UserProfile> {
        self.backend().user(user_id).cloned()
    }

    async fn list_users(&self) -> ServiceResult<Vec<UserProfile>> {
        let mut users = self.backend().users.clone();
        users.sort_by(|a, b| b.elo_rating.total_cmp(&a.elo_rating));
        Ok(users)
    }

    async fn discover(&self, rater_id: &str) -> ServiceResult<Vec<Candidate>> {
        let mut backend = self.backend();
        backend.counters.discover += 1;
        if backend.failures.discover {
            return Err(Error::service(500, Some("discovery unavailable".to_string())));
        }
        backend.user(rater_id)?;

        let rated: HashSet<&str> = backend
            .ratings
            .iter()
            .filter(|r| r.rater_id == rater_id)
            .map(|r| r.rated_id.as_str())
            .collect();
        let unrated = backend
            .users
            .iter()
            .filter(|u| u.id != rater_id && !rated.contains(u.id.as_str()))
            .cloned();
        Ok(match self.batch_size {
            Some(n) => unrated.take(n).collect(),
            None => unrated.collect(),
        })
    }

    async fn submit_rating(&self, request: &RatingRequest) -> ServiceResult<RatingOutcome> {
        self.backend().counters.ratings += 1;
        self.delay().await;

        let mut backend = self.backend();
        if backend.failures.ratings {
            return Err(Error::service(500, Some("Failed to submit rating".to_string())));
        }
        let (rater_elo, rated_elo) = check_rating_pair(&backend, request)?;

        let id = backend.next_id("rating");
        backend.ratings.push(StoredRating {
            id,
            rater_id: request.rater_id.clone(),
            rated_id: request.rated_id.clone(),
            rating: request.rating.get(),
            is_match: request.is_match,
            created_at: Utc::now(),
        });
        if let Some(rater) = backend.users.iter_mut().find(|u| u.id == request.rater_id) {
            rater.elo_rating += self.rating_delta;
        }

        let mutual_match = request.is_match && backend.liked(&request.rated_id, &request.rater_id);
        let match_id = if mutual_match {
            let id = backend.next_id("match");
            backend.matches.push(Match {
                id: id.clone(),
                user1_id: request.rater_id.clone(),
                user2_id: request.rated_id.clone(),
                created_at: Utc::now(),
            });
            Some(id)
        } else {
            None
        };

        let new_rater = rater_elo + self.rating_delta;
        Ok(RatingOutcome {
            mutual_match,
            rating_change_rater: self.rating_delta,
            rating_change_rated: Some(0.0),
            new_rater_rating: Some(new_rater),
            new_rated_rating: Some(rated_elo),
            rater_tier: Some(tier_for(new_rater).to_string()),
            rated_tier: Some(tier_for(rated_elo).to_string()),
            match_id,
            impact: None,
        })
    }

    async fn preview_rating(&self, request: &RatingRequest) -> ServiceResult<RatingPreview> {
        let backend = self.backend();
        let (rater_elo, rated_elo) = check_rating_pair(&backend, request)?;
        Ok(RatingPreview {
            current_rater_rating: rater_elo,
            current_rated_rating: rated_elo,
            projected_rater_rating: rater_elo + self.rating_delta,
            projected_rated_rating: rated_elo,
            rater_change: self.rating_delta,
            rated_change: 0.0,
            impact_description: String::new(),
            rater_tier: tier_for(rater_elo + self.rating_delta).to_string(),
            rated_tier: tier_for(rated_elo).to_string(),
        })
    }

    async fn fetch_photos(&self, owner_id: &str) -> ServiceResult<Vec<RemotePhoto>> {
        let mut backend = self.backend();
        backend.counters.photo_fetches += 1;
        if backend.failures.photo_fetches {
            return Err(Error::Transport("connection reset".to_string()));
        }
        Ok(backend.photos_of(owner_id))
    }

    async fn upload_photo(&self, owner_id: &str, image: &EncodedImage) -> ServiceResult<RemotePhoto> {
        self.backend().counters.uploads += 1;
        self.delay().await;

        let should_fail = self.backend().failures.upload_payloads.contains(&image.base64);
        if should_fail {
            return Err(Error::service(500, Some("Failed to save photo".to_string())));
        }
        let id = self.backend().next_id("upload");
        Ok(self.add_photo(owner_id, &format!("/uploads/{owner_id}_{id}.jpg")))
    }

    async fn delete_photo(&self, owner_id: &str, photo_id: &str) -> ServiceResult<()> {
        let mut backend = self.backend();
        backend.counters.deletes += 1;
        if backend.failures.deletes {
            return Err(Error::service(500, Some("Failed to delete photo".to_string())));
        }
        backend
            .photos
            .retain(|p| !(p.owner_id == owner_id && p.photo.id == photo_id));
        Ok(())
    }

    async fn promote_photo(&self, owner_id: &str, photo_id: &str) -> ServiceResult<()> {
        let mut backend = self.backend();
        backend.counters.promotes += 1;
        if backend.failures.promotes {
            return Err(Error::service(500, Some("Failed to update main photo".to_string())));
        }
        for stored in backend.photos.iter_mut().filter(|p| p.owner_id == owner_id) {
            stored.photo.is_main = stored.photo.id == photo_id;
        }
        Ok(())
    }

    async fn leaderboard(&self) -> ServiceResult<Vec<LeaderboardEntry>> {
        let users = self.list_users().await?;
        Ok(users
            .into_iter()
            .enumerate()
            .map(|(i, u)| LeaderboardEntry {
                rank: (i + 1) as u32,
                tier: tier_for(u.elo_rating).to_string(),
                id: u.id,
                name: u.name,
                age: u.age,
                elo_rating: u.elo_rating,
                photo_url: u.photo_url,
            })
            .collect())
    }

    async fn app_stats(&self) -> ServiceResult<AppStats> {
        let backend = self.backend();
        if backend.users.is_empty() {
            return Ok(AppStats::default());
        }
        let elos: Vec<f64> = backend.users.iter().map(|u| u.elo_rating).collect();
        let total = elos.len() as f64;
        Ok(AppStats {
            total_users: backend.users.len() as u64,
            highest_elo: elos.iter().copied().fold(f64::MIN, f64::max),
            lowest_elo: elos.iter().copied().fold(f64::MAX, f64::min),
            average_elo: (elos.iter().sum::<f64>() / total * 100.0).round() / 100.0,
        })
    }

    async fn user_stats(&self, user_id: &str) -> ServiceResult<UserStatsReport> {
        let backend = self.backend();
        let user = backend.user(user_id)?.clone();

        let given: Vec<&StoredRating> = backend.ratings.iter().filter(|r| r.rater_id == user_id).collect();
        let received: Vec<&StoredRating> = backend.ratings.iter().filter(|r| r.rated_id == user_id).collect();
        let average = |items: &[&StoredRating]| {
            if items.is_empty() {
                0.0
            } else {
                items.iter().map(|r| f64::from(r.rating)).sum::<f64>() / items.len() as f64
            }
        };
        let matches = |items: &[&StoredRating]| items.iter().filter(|r| r.is_match).count() as u64;
        let rate = |m: u64, n: usize| if n == 0 { 0.0 } else { m as f64 / n as f64 * 100.0 };

        let stats = UserStats {
            total_ratings_given: given.len() as u64,
            total_ratings_received: received.len() as u64,
            matches_given: matches(given.as_slice()),
            matches_received: matches(received.as_slice()),
            average_rating_given: average(given.as_slice()),
            average_rating_received: average(received.as_slice()),
            match_rate_given: rate(matches(given.as_slice()), given.len()),
            match_rate_received: rate(matches(received.as_slice()), received.len()),
        };
        Ok(UserStatsReport {
            attractiveness_tier: tier_for(user.elo_rating).to_string(),
            user,
            stats,
        })
    }

    async fn user_matches(&self, user_id: &str) -> ServiceResult<Vec<Match>> {
        let backend = self.backend();
        backend.user(user_id)?;
        Ok(backend
            .matches
            .iter()
            .filter(|m| m.user1_id == user_id || m.user2_id == user_id)
            .cloned()
            .collect())
    }

    async fn rating_history(&self, user_id: &str, limit: usize) -> ServiceResult<Vec<HistoryEntry>> {
        let backend = self.backend();
        backend.user(user_id)?;
        let mut history: Vec<HistoryEntry> = backend
            .ratings
            .iter()
            .filter_map(|r| {
                let kind = if r.rater_id == user_id {
                    HistoryKind::Given
                } else if r.rated_id == user_id {
                    HistoryKind::Received
                } else {
                    return None;
                };
                Some(HistoryEntry {
                    id: r.id.clone(),
                    rater_id: r.rater_id.clone(),
                    rated_id: r.rated_id.clone(),
                    rating: r.rating,
                    is_match: r.is_match,
                    kind,
                    created_at: r.created_at,
                })
            })
            .collect();
        history.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        history.truncate(limit);
        Ok(history)
    }
}
