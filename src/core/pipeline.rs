//! Rating submission pipeline
//!
//! Serializes confirm → submit: a [`Submission`] can only be obtained while
//! no other one is alive, and dropping it clears the in-flight flag. Failed
//! submissions are surfaced once and never retried here.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{info, warn};

use crate::core::service::RemoteService;
use crate::types::{RatingOutcome, RatingRequest, Result, ValidationError};

/// Owns the single in-flight slot for a session
pub struct RatingPipeline<S: RemoteService + ?Sized> {
    service: Arc<S>,
    in_flight: AtomicBool,
}

/// An acquired submission slot. At most one exists per pipeline.
pub struct Submission<'a, S: RemoteService + ?Sized> {
    service: &'a S,
    flag: &'a AtomicBool,
}

impl<S: RemoteService + ?Sized> RatingPipeline<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self {
            service,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether a submission is outstanding
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Claim the in-flight slot, or fail if it is taken
    pub fn begin(&self) -> std::result::Result<Submission<'_, S>, ValidationError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ValidationError::SubmissionInFlight)?;
        Ok(Submission {
            service: self.service.as_ref(),
            flag: &self.in_flight,
        })
    }
}

impl<S: RemoteService + ?Sized> Submission<'_, S> {
    /// Send exactly one rating request
    pub async fn send(&self, request: &RatingRequest) -> Result<RatingOutcome> {
        match self.service.submit_rating(request).await {
            Ok(outcome) => {
                info!(
                    "rated {} {} (match intent: {}, mutual: {}, delta: {:+.1})",
                    request.rated_id,
                    request.rating,
                    request.is_match,
                    outcome.mutual_match,
                    outcome.rating_change_rater
                );
                Ok(outcome)
            }
            Err(err) => {
                warn!("rating for {} failed: {}", request.rated_id, err);
                Err(err)
            }
        }
    }
}

impl<S: RemoteService + ?Sized> Drop for Submission<'_, S> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
