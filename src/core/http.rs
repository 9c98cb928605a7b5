//! HTTP implementation of [`RemoteService`]
//!
//! Every backend response is a JSON object with a `success` flag and, on
//! failure, an `error` string. Decoding maps the three ways a call can go
//! wrong onto the error taxonomy:
//! - no response at all → `Transport`
//! - non-2xx status, or `success: false` → `Service`
//! - a body matching no known shape → `Unknown`

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::ClientConfig;
use crate::core::service::{RemoteService, ServiceResult};
use crate::types::{
    AppStats, Candidate, EncodedImage, Error, HistoryEntry, LeaderboardEntry, Match, NewProfile,
    RatingOutcome, RatingPreview, RatingRequest, RemotePhoto, UserProfile, UserStatsReport,
};

/// Typed client for the EloVe backend
#[derive(Debug, Clone)]
pub struct HttpService {
    client: Client,
    base_url: String,
    upload_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct HealthBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct UserBody {
    user: UserProfile,
}

#[derive(Debug, Deserialize)]
struct UsersBody {
    users: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct PhotosBody {
    photos: Vec<RemotePhoto>,
}

#[derive(Debug, Deserialize)]
struct PhotoBody {
    photo: RemotePhoto,
}

#[derive(Debug, Deserialize)]
struct LeaderboardBody {
    leaderboard: Vec<LeaderboardEntry>,
}

#[derive(Debug, Deserialize)]
struct StatsBody {
    stats: AppStats,
}

#[derive(Debug, Deserialize)]
struct MatchesBody {
    matches: Vec<Match>,
}

#[derive(Debug, Deserialize)]
struct HistoryBody {
    history: Vec<HistoryEntry>,
}

/// Success with no payload worth keeping
#[derive(Debug, Deserialize)]
struct Ack {}

impl HttpService {
    /// Create a client for `base_url` (e.g. `http://host:5000/api`)
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        upload_timeout: Duration,
    ) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| Error::Unknown(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            upload_timeout,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, Error> {
        Self::new(
            config.base_url.clone(),
            Duration::from_millis(config.request_timeout_ms),
            Duration::from_millis(config.upload_timeout_ms),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ServiceResult<T> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport_error)?;
        debug!("response status={} bytes={}", status, body.len());
        decode(status, &body)
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_builder() {
        Error::Unknown(err.to_string())
    } else {
        Error::Transport(err.to_string())
    }
}

/// Map a status + body onto a typed payload or an error
pub(crate) fn decode<T: DeserializeOwned>(status: u16, body: &[u8]) -> ServiceResult<T> {
    let parsed: Option<Value> = serde_json::from_slice(body).ok();

    if !(200..300).contains(&status) {
        let message = parsed
            .as_ref()
            .and_then(|v| v.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string);
        return Err(Error::service(status, message));
    }

    let value = parsed.ok_or_else(|| Error::Unknown("response body is not JSON".to_string()))?;
    match value.get("success").and_then(Value::as_bool) {
        Some(true) => {}
        Some(false) => {
            let message = value
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string);
            return Err(Error::service(status, message));
        }
        None => return Err(Error::Unknown("response has no success flag".to_string())),
    }

    serde_json::from_value(value).map_err(|e| Error::Unknown(format!("unexpected response shape: {e}")))
}

#[async_trait]
impl RemoteService for HttpService {
    async fn health(&self) -> ServiceResult<String> {
        let body: HealthBody = self.send(self.client.get(self.url("/health"))).await?;
        Ok(body.message)
    }

    async fn create_profile(&self, profile: &NewProfile) -> ServiceResult<UserProfile> {
        let body: UserBody = self
            .send(self.client.post(self.url("/users")).json(profile))
            .await?;
        Ok(body.user)
    }

    async fn get_user(&self, user_id: &str) -> ServiceResult<UserProfile> {
        let body: UserBody = self
            .send(self.client.get(self.url(&format!("/users/{user_id}"))))
            .await?;
        Ok(body.user)
    }

    async fn list_users(&self) -> ServiceResult<Vec<UserProfile>> {
        let body: UsersBody = self.send(self.client.get(self.url("/users"))).await?;
        Ok(body.users)
    }

    async fn discover(&self, rater_id: &str) -> ServiceResult<Vec<Candidate>> {
        let body: UsersBody = self
            .send(self.client.get(self.url(&format!("/users/{rater_id}/discover"))))
            .await?;
        Ok(body.users)
    }

    async fn submit_rating(&self, request: &RatingRequest) -> ServiceResult<RatingOutcome> {
        self.send(self.client.post(self.url("/rate")).json(request)).await
    }

    async fn preview_rating(&self, request: &RatingRequest) -> ServiceResult<RatingPreview> {
        self.send(self.client.post(self.url("/rate/preview")).json(request))
            .await
    }

    async fn fetch_photos(&self, owner_id: &str) -> ServiceResult<Vec<RemotePhoto>> {
        let body: PhotosBody = self
            .send(self.client.get(self.url(&format!("/users/{owner_id}/photos"))))
            .await?;
        Ok(body.photos)
    }

    async fn upload_photo(&self, owner_id: &str, image: &EncodedImage) -> ServiceResult<RemotePhoto> {
        let payload = json!({
            "user_id": owner_id,
            "photo": image.to_data_uri(),
        });
        let body: PhotoBody = self
            .send(
                self.client
                    .post(self.url("/photos/upload"))
                    .timeout(self.upload_timeout)
                    .json(&payload),
            )
            .await?;
        Ok(body.photo)
    }

    async fn delete_photo(&self, owner_id: &str, photo_id: &str) -> ServiceResult<()> {
        let _: Ack = self
            .send(
                self.client
                    .delete(self.url(&format!("/photos/{photo_id}")))
                    .json(&json!({ "user_id": owner_id })),
            )
            .await?;
        Ok(())
    }

    async fn promote_photo(&self, owner_id: &str, photo_id: &str) -> ServiceResult<()> {
        let _: Ack = self
            .send(
                self.client
                    .put(self.url(&format!("/photos/{photo_id}/main")))
                    .json(&json!({ "user_id": owner_id })),
            )
            .await?;
        Ok(())
    }

    async fn leaderboard(&self) -> ServiceResult<Vec<LeaderboardEntry>> {
        let body: LeaderboardBody = self.send(self.client.get(self.url("/leaderboard"))).await?;
        Ok(body.leaderboard)
    }

    async fn app_stats(&self) -> ServiceResult<AppStats> {
        let body: StatsBody = self.send(self.client.get(self.url("/stats"))).await?;
        Ok(body.stats)
    }

    async fn user_stats(&self, user_id: &str) -> ServiceResult<UserStatsReport> {
        self.send(self.client.get(self.url(&format!("/users/{user_id}/stats"))))
            .await
    }

    async fn user_matches(&self, user_id: &str) -> ServiceResult<Vec<Match>> {
        let body: MatchesBody = self
            .send(self.client.get(self.url(&format!("/users/{user_id}/matches"))))
            .await?;
        Ok(body.matches)
    }

    async fn rating_history(&self, user_id: &str, limit: usize) -> ServiceResult<Vec<HistoryEntry>> {
        let body: HistoryBody = self
            .send(
                self.client
                    .get(self.url(&format!("/users/{user_id}/history")))
                    .query(&[("limit", limit)]),
            )
            .await?;
        Ok(body.history)
    }
}
