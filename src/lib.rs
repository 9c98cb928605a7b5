//! EloVe client core
//!
//! Swipe session engine (gesture → intent → confirmed rating → queue advance)
//! and the photo collection reconciler, on top of a typed remote service.

pub mod config;
pub mod core;
pub mod types;

// =============================================================================
// GESTURE [C]
// =============================================================================

/// Fraction of the presentation surface width a drag must exceed to
/// produce an intent. Strict: exactly at the threshold is no intent.
pub const DRAG_THRESHOLD_RATIO: f64 = 0.30;

/// Rotation input units per pixel of horizontal displacement
pub const ROTATION_PER_PX: f64 = 0.1;

/// Rotation input that maps to the maximum tilt
pub const ROTATION_INPUT_RANGE: f64 = 200.0;

/// Maximum card tilt in degrees (either side)
pub const MAX_ROTATION_DEG: f64 = 15.0;

/// Default surface width when the caller does not provide one (points)
pub const DEFAULT_SURFACE_WIDTH: f64 = 390.0;

// =============================================================================
// RATING [C]
// =============================================================================

pub const RATING_MIN: u8 = 1;
pub const RATING_MAX: u8 = 10;

/// Rating value a fresh intent starts with
pub const DEFAULT_RATING: u8 = 5;

// =============================================================================
// PHOTOS & IDENTITY [C]
// =============================================================================

/// Maximum photos per profile
pub const MAX_PHOTOS: usize = 6;

/// Minimum age accepted at profile creation
pub const MIN_PROFILE_AGE: u32 = 18;

/// Well-known key for the persisted identity token
pub const CURRENT_USER_KEY: &str = "currentUserId";

// =============================================================================
// REMOTE SERVICE [C]
// =============================================================================

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000/api";

/// Timeout for ordinary requests (milliseconds)
pub const REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Timeout for a single photo upload (milliseconds)
pub const UPLOAD_TIMEOUT_MS: u64 = 30_000;

/// Default page size for rating history
pub const HISTORY_DEFAULT_LIMIT: usize = 50;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "0.1.0";
