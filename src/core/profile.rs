//! Profile onboarding
//!
//! Validate locally, create remotely, persist the id, then upload the
//! photos settle-all. Upload failures are reported, never fatal.

use futures_util::future::join_all;
use log::{info, warn};
use serde::Serialize;

use crate::core::identity::{Identity, KeyValueStore};
use crate::core::service::RemoteService;
use crate::types::{EncodedImage, ErrorInfo, NewProfile, RemotePhoto, Result, UserProfile, ValidationError};

/// Placeholder URL sent with a profile that will get uploaded photos
const PENDING_PHOTO_URL: &str = "temp_placeholder";

/// Outcome of onboarding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileReport {
    pub user: UserProfile,
    pub uploaded: Vec<RemotePhoto>,
    pub failed: Vec<ErrorInfo>,
}

impl ProfileReport {
    pub fn welcome(&self) -> String {
        format!(
            "Welcome to EloVe, {}! Your starting Elo rating is {:.0}.",
            self.user.name, self.user.elo_rating
        )
    }
}

/// Create a profile and upload its first photos
pub async fn create_profile<S: RemoteService + ?Sized>(
    service: &S,
    store: &dyn KeyValueStore,
    mut profile: NewProfile,
    photos: Vec<EncodedImage>,
) -> Result<ProfileReport> {
    profile.validate()?;
    if photos.is_empty() {
        return Err(ValidationError::NoPhotos.into());
    }
    if profile.photo_url.is_empty() {
        profile.photo_url = PENDING_PHOTO_URL.to_string();
    }

    let user = service.create_profile(&profile).await?;
    Identity::new(store).remember(&user.id)?;
    info!("created profile {} ({})", user.id, user.name);

    let results = join_all(photos.iter().map(|photo| service.upload_photo(&user.id, photo))).await;
    let mut uploaded = Vec::new();
    let mut failed = Vec::new();
    for result in results {
        match result {
            Ok(photo) => uploaded.push(photo),
            Err(err) => {
                warn!("photo upload for new profile {} failed: {}", user.id, err);
                failed.push(err.info());
            }
        }
    }

    Ok(ProfileReport {
        user,
        uploaded,
        failed,
    })
}
