//! Session queue: ordered candidate batch, cursor, pending intent
//!
//! State transitions:
//! - EMPTY → LOADING: fetch of a discovery batch starts
//! - LOADING → PRESENTING: non-empty batch arrives (cursor = 0)
//! - LOADING → EMPTY: empty batch arrives, or the fetch failed
//! - PRESENTING → ADVANCING: a rating for the current candidate succeeded
//! - ADVANCING → PRESENTING: cursor still inside the batch
//! - ADVANCING → LOADING: batch exhausted, refetch required
//!
//! Candidates are never removed or reordered inside a batch, and an
//! exhausted batch is never replayed.

use log::{debug, warn};

use crate::types::{Candidate, Direction, PendingIntent, QueueState, RatingValue, ValidationError};

/// Result of moving past a rated candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Presenting the candidate at this cursor
    Next(usize),
    /// Batch exhausted; the queue is now LOADING
    Exhausted,
    /// The rated candidate is no longer current (queue was reloaded meanwhile)
    Stale,
}

/// Ordered candidate queue for one session
#[derive(Debug, Clone)]
pub struct SessionQueue {
    state: QueueState,
    candidates: Vec<Candidate>,
    cursor: usize,
    pending: Option<PendingIntent>,
    batches_loaded: u64,
}

impl Default for SessionQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionQueue {
    pub fn new() -> Self {
        Self {
            state: QueueState::Empty,
            candidates: Vec::new(),
            cursor: 0,
            pending: None,
            batches_loaded: 0,
        }
    }

    pub fn state(&self) -> QueueState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Number of batches received so far
    pub fn batches_loaded(&self) -> u64 {
        self.batches_loaded
    }

    /// Cursor, defined only while a candidate is presented
    pub fn cursor(&self) -> Option<usize> {
        match self.state {
            QueueState::Presenting | QueueState::Advancing => Some(self.cursor),
            QueueState::Empty | QueueState::Loading => None,
        }
    }

    /// Candidate at the cursor
    pub fn current(&self) -> Option<&Candidate> {
        self.cursor().and_then(|i| self.candidates.get(i))
    }

    /// Candidates still to be shown in this batch, current included
    pub fn remaining(&self) -> usize {
        self.cursor().map_or(0, |i| self.candidates.len() - i)
    }

    pub fn pending(&self) -> Option<&PendingIntent> {
        self.pending.as_ref()
    }

    /// Start a fetch. Any pending intent is discarded.
    pub fn begin_loading(&mut self) {
        if let Some(intent) = self.pending.take() {
            warn!("discarding pending intent for {} on reload", intent.candidate_id);
        }
        self.candidates.clear();
        self.cursor = 0;
        self.state = QueueState::Loading;
        debug!("queue → {}", self.state);
    }

    /// A fetched batch arrived
    pub fn receive_batch(&mut self, batch: Vec<Candidate>) {
        self.batches_loaded += 1;
        self.candidates = batch;
        self.cursor = 0;
        self.pending = None;
        self.state = if self.candidates.is_empty() {
            QueueState::Empty
        } else {
            QueueState::Presenting
        };
        debug!("queue → {} ({} candidates)", self.state, self.candidates.len());
    }

    /// The fetch failed; nothing to present until the caller retries
    pub fn load_failed(&mut self) {
        self.candidates.clear();
        self.cursor = 0;
        self.pending = None;
        self.state = QueueState::Empty;
        debug!("queue → {} (load failed)", self.state);
    }

    /// Open a decision on the current candidate at the default rating
    pub fn open_intent(&mut self, direction: Direction) -> Result<&PendingIntent, ValidationError> {
        if self.state != QueueState::Presenting {
            return Err(ValidationError::NoCandidate);
        }
        let candidate_id = self
            .current()
            .map(|c| c.id.clone())
            .ok_or(ValidationError::NoCandidate)?;
        if let Some(existing) = &self.pending {
            return Err(ValidationError::IntentAlreadyOpen(existing.candidate_id.clone()));
        }
        debug!("intent opened: {} on {}", direction, candidate_id);
        Ok(self.pending.insert(PendingIntent::new(candidate_id, direction)))
    }

    /// Adjust the rating of the open decision
    pub fn set_rating(&mut self, rating: RatingValue) -> Result<(), ValidationError> {
        let intent = self.pending.as_mut().ok_or(ValidationError::NoPendingIntent)?;
        intent.rating = rating;
        Ok(())
    }

    /// Drop the open decision; the candidate stays current
    pub fn discard_intent(&mut self) -> Option<PendingIntent> {
        self.pending.take()
    }

    /// Move past `rated_id` after its rating succeeded
    pub fn advance(&mut self, rated_id: &str) -> Advance {
        let is_current = self.state == QueueState::Presenting
            && self.current().is_some_and(|c| c.id == rated_id);
        if !is_current {
            debug!("advance for {} ignored: no longer current", rated_id);
            return Advance::Stale;
        }

        self.pending = None;
        self.state = QueueState::Advancing;
        self.cursor += 1;

        if self.cursor >= self.candidates.len() {
            debug!("batch exhausted after {} candidates", self.candidates.len());
            self.begin_loading();
            Advance::Exhausted
        } else {
            self.state = QueueState::Presenting;
            debug!("queue → {} at cursor {}", self.state, self.cursor);
            Advance::Next(self.cursor)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(n: usize) -> Vec<Candidate> {
        (0..n)
            .map(|i| Candidate {
                id: format!("c{i}"),
                name: format!("Candidate {i}"),
                age: 25,
                bio: String::new(),
                photo_url: String::new(),
                elo_rating: 1200.0,
            })
            .collect()
    }

    #[test]
    fn test_new_queue_is_empty_without_cursor() {
        let q = SessionQueue::new();
        assert_eq!(q.state(), QueueState::Empty);
        assert_eq!(q.cursor(), None);
        assert!(q.current().is_none());
    }

    #[test]
    fn test_batch_arrival_presents_first() {
        let mut q = SessionQueue::new();
        q.begin_loading();
        assert_eq!(q.state(), QueueState::Loading);
        q.receive_batch(batch(3));
        assert_eq!(q.state(), QueueState::Presenting);
        assert_eq!(q.cursor(), Some(0));
        assert_eq!(q.current().unwrap().id, "c0");
    }

    #[test]
    fn test_empty_batch_is_empty_state() {
        let mut q = SessionQueue::new();
        q.begin_loading();
        q.receive_batch(Vec::new());
        assert_eq!(q.state(), QueueState::Empty);
        assert_eq!(q.cursor(), None);
    }

    #[test]
    fn test_advance_walks_then_exhausts() {
        let mut q = SessionQueue::new();
        q.begin_loading();
        q.receive_batch(batch(2));

        q.open_intent(Direction::Like).unwrap();
        assert_eq!(q.advance("c0"), Advance::Next(1));
        assert!(q.pending().is_none());

        q.open_intent(Direction::Pass).unwrap();
        assert_eq!(q.advance("c1"), Advance::Exhausted);
        assert_eq!(q.state(), QueueState::Loading);
        assert_eq!(q.cursor(), None);
    }

    #[test]
    fn test_cursor_stays_in_range() {
        let mut q = SessionQueue::new();
        q.begin_loading();
        q.receive_batch(batch(4));
        for i in 0..4 {
            let cursor = q.cursor().unwrap();
            assert!(cursor < q.len());
            q.advance(&format!("c{i}"));
        }
        assert_eq!(q.cursor(), None);
    }

    #[test]
    fn test_stale_advance_ignored() {
        let mut q = SessionQueue::new();
        q.begin_loading();
        q.receive_batch(batch(2));
        assert_eq!(q.advance("c1"), Advance::Stale);
        assert_eq!(q.cursor(), Some(0));
    }

    #[test]
    fn test_reload_discards_intent() {
        let mut q = SessionQueue::new();
        q.begin_loading();
        q.receive_batch(batch(2));
        q.open_intent(Direction::Like).unwrap();

        q.begin_loading();
        assert!(q.pending().is_none());
    }

    #[test]
    fn test_one_intent_at_a_time() {
        let mut q = SessionQueue::new();
        q.begin_loading();
        q.receive_batch(batch(2));
        q.open_intent(Direction::Like).unwrap();
        assert_eq!(
            q.open_intent(Direction::Pass).unwrap_err(),
            ValidationError::IntentAlreadyOpen("c0".into())
        );
    }

    #[test]
    fn test_intent_requires_presenting() {
        let mut q = SessionQueue::new();
        assert_eq!(q.open_intent(Direction::Like).unwrap_err(), ValidationError::NoCandidate);
        assert_eq!(
            q.set_rating(RatingValue::new(3).unwrap()).unwrap_err(),
            ValidationError::NoPendingIntent
        );
    }

    #[test]
    fn test_discard_keeps_cursor() {
        let mut q = SessionQueue::new();
        q.begin_loading();
        q.receive_batch(batch(3));
        q.open_intent(Direction::Like).unwrap();
        q.set_rating(RatingValue::new(9).unwrap()).unwrap();

        let dropped = q.discard_intent().unwrap();
        assert_eq!(dropped.rating.get(), 9);
        assert_eq!(q.cursor(), Some(0));
        assert_eq!(q.state(), QueueState::Presenting);
    }
}
