//! Swipe session: queue + gesture translator + submission pipeline
//!
//! Flow: the queue presents a candidate, a drag or explicit action opens a
//! pending intent, `confirm` submits it and (only after success) advances the
//! queue, refetching when the batch is exhausted. `cancel` drops the intent
//! and puts the card back at rest without any request.
//!
//! Methods take `&self` so a UI can fire them from callbacks; the only
//! suspension points are the service calls, and no lock is held across them.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::ClientConfig;
use crate::core::gesture::{CardTransform, GesturePhase, GestureTranslator};
use crate::core::pipeline::RatingPipeline;
use crate::core::queue::{Advance, SessionQueue};
use crate::core::service::RemoteService;
use crate::types::{
    Candidate, Direction, ErrorInfo, PendingIntent, QueueState, RatingOutcome, RatingPreview,
    RatingRequest, RatingValue, Result, ValidationError,
};

/// Display data for a successful submission. Not stored in the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReport {
    pub candidate: Candidate,
    pub direction: Direction,
    pub rating: RatingValue,
    pub outcome: RatingOutcome,
    /// Where the card animates to before the next one appears
    #[serde(skip)]
    pub fling: CardTransform,
    /// Queue state after advancing (and refilling, if that happened)
    pub next_state: QueueState,
    /// Set when the batch ran out and the refetch failed
    pub refill_error: Option<ErrorInfo>,
}

impl SubmissionReport {
    /// Human-readable summary
    pub fn message(&self) -> String {
        let mut message = format!("You rated {} {}", self.candidate.name, self.rating);
        if self.outcome.mutual_match {
            message.push_str("\nIT'S A MUTUAL MATCH!");
        }
        if self.outcome.rating_change_rater != 0.0 {
            message.push_str(&format!("\nYour Elo: {:+.1}", self.outcome.rating_change_rater));
        }
        message
    }
}

/// Read-only view of the session for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: QueueState,
    pub cursor: Option<usize>,
    pub batch_len: usize,
    pub current: Option<Candidate>,
    pub pending: Option<PendingIntent>,
    pub submitting: bool,
}

#[derive(Debug)]
struct SessionInner {
    queue: SessionQueue,
    gesture: GestureTranslator,
}

/// One rater's swipe session
pub struct SwipeSession<S: RemoteService + ?Sized> {
    service: Arc<S>,
    rater_id: String,
    pipeline: RatingPipeline<S>,
    inner: Mutex<SessionInner>,
}

impl<S: RemoteService + ?Sized> SwipeSession<S> {
    pub fn new(service: Arc<S>, rater_id: impl Into<String>, surface_width: f64) -> Self {
        Self::with_gesture(service, rater_id, GestureTranslator::new(surface_width))
    }

    pub fn from_config(service: Arc<S>, rater_id: impl Into<String>, config: &ClientConfig) -> Self {
        let gesture =
            GestureTranslator::with_threshold_ratio(config.surface_width, config.swipe_threshold_ratio);
        Self::with_gesture(service, rater_id, gesture)
    }

    fn with_gesture(service: Arc<S>, rater_id: impl Into<String>, gesture: GestureTranslator) -> Self {
        Self {
            pipeline: RatingPipeline::new(service.clone()),
            service,
            rater_id: rater_id.into(),
            inner: Mutex::new(SessionInner {
                queue: SessionQueue::new(),
                gesture,
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn rater_id(&self) -> &str {
        &self.rater_id
    }

    pub fn state(&self) -> QueueState {
        self.inner().queue.state()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.inner().queue.cursor()
    }

    pub fn current(&self) -> Option<Candidate> {
        self.inner().queue.current().cloned()
    }

    pub fn pending(&self) -> Option<PendingIntent> {
        self.inner().queue.pending().cloned()
    }

    pub fn transform(&self) -> CardTransform {
        self.inner().gesture.transform()
    }

    pub fn gesture_phase(&self) -> GesturePhase {
        self.inner().gesture.phase()
    }

    pub fn is_submitting(&self) -> bool {
        self.pipeline.is_busy()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner();
        SessionSnapshot {
            state: inner.queue.state(),
            cursor: inner.queue.cursor(),
            batch_len: inner.queue.len(),
            current: inner.queue.current().cloned(),
            pending: inner.queue.pending().cloned(),
            submitting: self.pipeline.is_busy(),
        }
    }

    // ── Loading ──

    /// Fetch a fresh discovery batch. Used for the first load and for
    /// user-triggered retry; any pending intent is discarded.
    pub async fn refresh(&self) -> Result<usize> {
        {
            let mut inner = self.inner();
            inner.queue.begin_loading();
            inner.gesture.restore();
        }
        self.fetch_batch().await
    }

    async fn fetch_batch(&self) -> Result<usize> {
        let fetched = self.service.discover(&self.rater_id).await;
        let mut inner = self.inner();
        if inner.queue.state() != QueueState::Loading {
            debug!("discarding batch: queue left LOADING meanwhile");
            return Ok(0);
        }
        match fetched {
            Ok(batch) => {
                let count = batch.len();
                inner.queue.receive_batch(batch);
                info!("loaded {} candidates for {}", count, self.rater_id);
                Ok(count)
            }
            Err(err) => {
                inner.queue.load_failed();
                warn!("discovery for {} failed: {}", self.rater_id, err);
                Err(err)
            }
        }
    }

    // ── Gesture ──

    /// Drag start on the current card
    pub fn drag_start(&self) -> bool {
        let mut inner = self.inner();
        if inner.queue.current().is_none() || inner.queue.pending().is_some() {
            return false;
        }
        inner.gesture.begin()
    }

    /// Drag move sample; returns the card's visual transform
    pub fn drag_move(&self, dx: f64, dy: f64) -> CardTransform {
        self.inner().gesture.update(dx, dy)
    }

    /// Drag end. Beyond the threshold this opens a pending intent;
    /// otherwise the card snaps back and `None` is returned.
    pub fn drag_end(&self, dx: f64, dy: f64) -> Result<Option<PendingIntent>> {
        let mut inner = self.inner();
        let Some(direction) = inner.gesture.release(dx, dy) else {
            return Ok(None);
        };
        let opened = inner.queue.open_intent(direction).map(|intent| intent.clone());
        match opened {
            Ok(intent) => Ok(Some(intent)),
            Err(err) => {
                inner.gesture.restore();
                Err(err.into())
            }
        }
    }

    /// Explicit like/pass button; same intent as a drag, default rating
    pub fn action(&self, direction: Direction) -> Result<PendingIntent> {
        let mut inner = self.inner();
        let intent = inner.queue.open_intent(direction)?.clone();
        inner.gesture.trigger(direction);
        Ok(intent)
    }

    // ── Confirmation ──

    /// Adjust the rating of the pending intent (1-10)
    pub fn set_rating(&self, value: i64) -> Result<()> {
        let rating = RatingValue::new(value)?;
        if self.pipeline.is_busy() {
            return Err(ValidationError::SubmissionInFlight.into());
        }
        self.inner().queue.set_rating(rating)?;
        Ok(())
    }

    /// Abandon the pending intent and put the card back at rest.
    /// No request is made. In-flight submissions cannot be cancelled.
    pub fn cancel(&self) -> Result<Option<PendingIntent>> {
        if self.pipeline.is_busy() {
            return Err(ValidationError::SubmissionInFlight.into());
        }
        let mut inner = self.inner();
        let dropped = inner.queue.discard_intent();
        inner.gesture.restore();
        if let Some(intent) = &dropped {
            debug!("intent on {} cancelled", intent.candidate_id);
        }
        Ok(dropped)
    }

    /// Projected impact of the pending intent; changes nothing
    pub async fn preview(&self) -> Result<RatingPreview> {
        let intent = self.pending().ok_or(ValidationError::NoPendingIntent)?;
        let request = RatingRequest::from_intent(self.rater_id.as_str(), &intent);
        self.service.preview_rating(&request).await
    }

    /// Submit the pending intent, then advance.
    ///
    /// Rejected with `SubmissionInFlight` while another confirm is
    /// outstanding. On failure the intent is dropped, the candidate stays at
    /// the cursor and the error is returned for the caller to retry.
    pub async fn confirm(&self) -> Result<SubmissionReport> {
        let submission = self.pipeline.begin()?;

        let (intent, candidate) = {
            let inner = self.inner();
            let intent = inner.queue.pending().cloned().ok_or(ValidationError::NoPendingIntent)?;
            let candidate = inner.queue.current().cloned().ok_or(ValidationError::NoCandidate)?;
            (intent, candidate)
        };
        let request = RatingRequest::from_intent(self.rater_id.as_str(), &intent);

        let outcome = match submission.send(&request).await {
            Ok(outcome) => outcome,
            Err(err) => {
                let mut inner = self.inner();
                if inner
                    .queue
                    .pending()
                    .is_some_and(|p| p.candidate_id == intent.candidate_id)
                {
                    inner.queue.discard_intent();
                    inner.gesture.restore();
                }
                return Err(err);
            }
        };

        let (advance, fling) = {
            let mut inner = self.inner();
            let fling = inner.gesture.fling(intent.direction);
            inner.gesture.restore();
            (inner.queue.advance(&intent.candidate_id), fling)
        };

        let refill_error = match advance {
            Advance::Exhausted => self.fetch_batch().await.err().map(|e| e.info()),
            Advance::Next(_) | Advance::Stale => None,
        };
        drop(submission);

        Ok(SubmissionReport {
            candidate,
            direction: intent.direction,
            rating: intent.rating,
            outcome,
            fling,
            next_state: self.state(),
            refill_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::memory::MemoryService;

    const WIDTH: f64 = 400.0;

    async fn session() -> (Arc<MemoryService>, SwipeSession<MemoryService>) {
        let service = Arc::new(MemoryService::with_sample_users());
        let rater = service.user_ids()[0].clone();
        let session = SwipeSession::new(service.clone(), rater, WIDTH);
        session.refresh().await.unwrap();
        (service, session)
    }

    #[tokio::test]
    async fn test_refresh_presents_first_candidate() {
        let (_, s) = session().await;
        assert_eq!(s.state(), QueueState::Presenting);
        assert_eq!(s.cursor(), Some(0));
        assert_eq!(s.current().unwrap().name, "Bob");
    }

    #[tokio::test]
    async fn test_short_drag_opens_nothing() {
        let (_, s) = session().await;
        assert!(s.drag_start());
        s.drag_move(50.0, 0.0);
        assert_eq!(s.drag_end(50.0, 0.0).unwrap(), None);
        assert!(s.pending().is_none());
        assert!(s.transform().is_rest());
    }

    #[tokio::test]
    async fn test_drag_then_cancel_restores_card() {
        let (service, s) = session().await;
        let before = s.snapshot();

        s.drag_start();
        s.drag_move(200.0, 30.0);
        let intent = s.drag_end(200.0, 30.0).unwrap().unwrap();
        assert_eq!(intent.direction, Direction::Like);
        assert_eq!(s.gesture_phase(), GesturePhase::Held(Direction::Like));

        let dropped = s.cancel().unwrap();
        assert_eq!(dropped, Some(intent));
        assert_eq!(s.snapshot(), before);
        assert!(s.transform().is_rest());
        assert_eq!(service.counters().ratings, 0);
    }

    #[tokio::test]
    async fn test_cannot_drag_while_intent_open() {
        let (_, s) = session().await;
        s.action(Direction::Pass).unwrap();
        assert!(!s.drag_start());
        assert!(s.action(Direction::Like).is_err());
    }

    #[tokio::test]
    async fn test_confirm_advances() {
        let (_, s) = session().await;
        s.action(Direction::Like).unwrap();
        s.set_rating(8).unwrap();

        let report = s.confirm().await.unwrap();
        assert_eq!(report.candidate.name, "Bob");
        assert_eq!(report.rating.get(), 8);
        assert_eq!(report.fling.dx, WIDTH);
        assert_eq!(s.cursor(), Some(1));
        assert!(s.pending().is_none());
    }

    #[tokio::test]
    async fn test_confirm_without_intent() {
        let (_, s) = session().await;
        let err = s.confirm().await.unwrap_err();
        assert_eq!(err, ValidationError::NoPendingIntent.into());
        assert!(!s.is_submitting());
    }

    #[tokio::test]
    async fn test_rating_out_of_range_rejected() {
        let (_, s) = session().await;
        s.action(Direction::Like).unwrap();
        assert!(s.set_rating(0).is_err());
        assert!(s.set_rating(11).is_err());
        assert_eq!(s.pending().unwrap().rating.get(), 5);
    }

    #[tokio::test]
    async fn test_report_message() {
        let (_, s) = session().await;
        s.action(Direction::Like).unwrap();
        s.set_rating(7).unwrap();
        let report = s.confirm().await.unwrap();
        assert_eq!(report.message(), "You rated Bob 7/10");
    }
}
