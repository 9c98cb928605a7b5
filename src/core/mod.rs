//! Core modules for the EloVe client

pub mod service;
pub mod http;
pub mod memory;
pub mod gesture;
pub mod queue;
pub mod pipeline;
pub mod session;
pub mod photos;
pub mod identity;
pub mod profile;

pub use service::{RemoteService, ServiceResult};
pub use http::HttpService;
pub use memory::{CallCounters, FailurePlan, MemoryService};
pub use gesture::{classify, rotation_for, CardTransform, GesturePhase, GestureTranslator};
pub use queue::{Advance, SessionQueue};
pub use pipeline::{RatingPipeline, Submission};
pub use session::{SessionSnapshot, SubmissionReport, SwipeSession};
pub use photos::PhotoReconciler;
pub use identity::{FileStore, Identity, KeyValueStore, MemoryStore, StoreError};
pub use profile::{create_profile, ProfileReport};
