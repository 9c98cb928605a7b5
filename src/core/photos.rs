//! Photo collection reconciler
//!
//! Two consistency rules live side by side:
//! - new photos (no server identity yet) are edited locally only
//! - persisted photos are written through to the server first, and the
//!   local collection changes only after the call succeeds
//!
//! `commit_new_photos` is the single reconciliation point: it uploads every
//! new photo concurrently (settle-all), then reloads the authoritative list.
//! The main photo is whatever sits at index 0.

use std::sync::Arc;

use futures_util::future::join_all;
use log::{debug, info, warn};

use crate::core::service::RemoteService;
use crate::types::{
    CommitReport, EncodedImage, FailedUpload, PhotoDescriptor, Result, UploadOutcome,
    ValidationError,
};
use crate::MAX_PHOTOS;

/// Local photo collection for one profile
pub struct PhotoReconciler<S: RemoteService + ?Sized> {
    service: Arc<S>,
    photos: Vec<PhotoDescriptor>,
    cap: usize,
    local_seq: u64,
}

impl<S: RemoteService + ?Sized> PhotoReconciler<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self::with_cap(service, MAX_PHOTOS)
    }

    pub fn with_cap(service: Arc<S>, cap: usize) -> Self {
        Self {
            service,
            photos: Vec::new(),
            cap,
            local_seq: 0,
        }
    }

    pub fn photos(&self) -> &[PhotoDescriptor] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Photos awaiting upload
    pub fn new_count(&self) -> usize {
        self.photos.iter().filter(|p| p.is_new).count()
    }

    /// Id of the photo at position 0
    pub fn main_photo_id(&self) -> Option<&str> {
        self.photos.first().map(|p| p.id.as_str())
    }

    pub fn get(&self, id: &str) -> Option<&PhotoDescriptor> {
        self.photos.iter().find(|p| p.id == id)
    }

    fn position(&self, id: &str) -> std::result::Result<usize, ValidationError> {
        self.photos
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| ValidationError::UnknownPhoto(id.to_string()))
    }

    /// Replace the collection with the server's list, main photo first
    pub async fn load_all(&mut self, owner_id: &str) -> Result<usize> {
        let mut remote = self.service.fetch_photos(owner_id).await?;
        // stable, so the rest keep server order
        remote.sort_by_key(|p| !p.is_main);
        self.photos = remote.into_iter().map(PhotoDescriptor::from).collect();
        debug!("loaded {} photos for {}", self.photos.len(), owner_id);
        Ok(self.photos.len())
    }

    /// Append a locally captured photo
    pub fn add_local(
        &mut self,
        uri: impl Into<String>,
        payload: EncodedImage,
    ) -> std::result::Result<&PhotoDescriptor, ValidationError> {
        if self.photos.len() >= self.cap {
            return Err(ValidationError::CapacityExceeded { cap: self.cap });
        }
        self.local_seq += 1;
        let id = format!("local-{}-{}", chrono::Utc::now().timestamp_millis(), self.local_seq);
        self.photos.push(PhotoDescriptor::local(id, uri, payload));
        Ok(&self.photos[self.photos.len() - 1])
    }

    /// Remove a photo. Persisted photos are deleted remotely first; on
    /// failure the collection is untouched.
    pub async fn remove(&mut self, owner_id: &str, id: &str) -> Result<PhotoDescriptor> {
        let index = self.position(id)?;
        if !self.photos[index].is_new {
            self.service.delete_photo(owner_id, id).await?;
            info!("deleted photo {} for {}", id, owner_id);
        }
        let index = self.position(id)?;
        Ok(self.photos.remove(index))
    }

    /// Move a photo to position 0. Persisted photos are promoted remotely
    /// first; new photos are reordered locally.
    pub async fn set_main(&mut self, owner_id: &str, id: &str) -> Result<()> {
        let index = self.position(id)?;
        if !self.photos[index].is_new {
            self.service.promote_photo(owner_id, id).await?;
        }
        let index = self.position(id)?;
        let photo = self.photos.remove(index);
        self.photos.insert(0, photo);
        Ok(())
    }

    /// Upload every new photo concurrently, then reload from the server.
    ///
    /// No upload is cancelled by another's failure. A failed reload is
    /// carried in the report: uploaded entries are swapped for their
    /// persisted form and failed ones stay new.
    pub async fn commit_new_photos(&mut self, owner_id: &str) -> Result<CommitReport> {
        let pending: Vec<(String, EncodedImage)> = self
            .photos
            .iter()
            .filter(|p| p.is_new)
            .filter_map(|p| p.payload.clone().map(|payload| (p.id.clone(), payload)))
            .collect();
        if pending.is_empty() {
            return Ok(CommitReport::default());
        }

        let service = self.service.as_ref();
        let outcomes: Vec<(String, UploadOutcome)> =
            join_all(pending.into_iter().map(|(local_id, payload)| async move {
                let outcome = match service.upload_photo(owner_id, &payload).await {
                    Ok(photo) => UploadOutcome::Uploaded(photo),
                    Err(err) => {
                        warn!("upload of {} failed: {}", local_id, err);
                        UploadOutcome::Failed(err.info())
                    }
                };
                (local_id, outcome)
            }))
            .await;

        let mut report = CommitReport::default();
        for (local_id, outcome) in &outcomes {
            match outcome {
                UploadOutcome::Uploaded(_) => report.uploaded_count += 1,
                UploadOutcome::Failed(error) => {
                    report.failed_count += 1;
                    report.failed_items.push(FailedUpload {
                        local_id: local_id.clone(),
                        error: error.clone(),
                    });
                }
            }
        }
        info!(
            "photo commit for {}: {} uploaded, {} failed",
            owner_id, report.uploaded_count, report.failed_count
        );

        if let Err(err) = self.load_all(owner_id).await {
            warn!("reload after commit failed: {}", err);
            report.reload_error = Some(err.info());
            for (local_id, outcome) in outcomes {
                if let UploadOutcome::Uploaded(photo) = outcome {
                    if let Some(entry) = self.photos.iter_mut().find(|p| p.id == local_id) {
                        *entry = PhotoDescriptor::from(photo);
                    }
                }
            }
        }
        Ok(report)
    }
}
