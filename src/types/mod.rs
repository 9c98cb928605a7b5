//! Core types for the EloVe client

mod candidate;
mod error;
mod intent;
mod photo;
mod rating;
mod state;
mod stats;
mod wire;

pub use candidate::{Candidate, NewProfile, UserProfile};
pub use error::{Error, ErrorInfo, Result, ValidationError, STATUS_TRANSPORT, STATUS_UNKNOWN, STATUS_VALIDATION};
pub use intent::{Direction, PendingIntent, RatingValue};
pub use photo::{CommitReport, EncodedImage, FailedUpload, PhotoDescriptor, RemotePhoto, UploadOutcome};
pub use rating::{RatingOutcome, RatingPreview, RatingRequest};
pub use state::QueueState;
pub use stats::{AppStats, HistoryEntry, HistoryKind, LeaderboardEntry, Match, UserStats, UserStatsReport};
