//! Gesture translator: drag samples → pending like/pass decision
//!
//! Phases:
//! - RESTING → DRAGGING: drag start
//! - DRAGGING → HELD(dir): release beyond ±threshold, or explicit action
//! - DRAGGING → RESTING: release within threshold (snap back, no intent)
//! - HELD → RESTING: confirmation cancelled, or candidate consumed
//!
//! Rotation is visual feedback only and never feeds a decision.

use log::debug;

use crate::types::Direction;
use crate::{DRAG_THRESHOLD_RATIO, MAX_ROTATION_DEG, ROTATION_INPUT_RANGE, ROTATION_PER_PX};

/// Where the card is in the drag lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Resting,
    Dragging,
    /// A decision is open and awaiting confirmation
    Held(Direction),
}

/// Visual transform of the presented card
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CardTransform {
    pub dx: f64,
    pub dy: f64,
    pub rotation_deg: f64,
}

impl CardTransform {
    pub const REST: CardTransform = CardTransform {
        dx: 0.0,
        dy: 0.0,
        rotation_deg: 0.0,
    };

    pub fn is_rest(&self) -> bool {
        *self == Self::REST
    }
}

/// Gesture state machine for one presented card
#[derive(Debug, Clone)]
pub struct GestureTranslator {
    surface_width: f64,
    threshold_ratio: f64,
    phase: GesturePhase,
    transform: CardTransform,
}

impl GestureTranslator {
    pub fn new(surface_width: f64) -> Self {
        Self::with_threshold_ratio(surface_width, DRAG_THRESHOLD_RATIO)
    }

    pub fn with_threshold_ratio(surface_width: f64, threshold_ratio: f64) -> Self {
        Self {
            surface_width,
            threshold_ratio,
            phase: GesturePhase::Resting,
            transform: CardTransform::REST,
        }
    }

    /// Horizontal displacement a release must exceed
    pub fn threshold(&self) -> f64 {
        self.surface_width * self.threshold_ratio
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn transform(&self) -> CardTransform {
        self.transform
    }

    pub fn surface_width(&self) -> f64 {
        self.surface_width
    }

    /// Drag start. Ignored while a decision is held; returns whether a drag began.
    pub fn begin(&mut self) -> bool {
        match self.phase {
            GesturePhase::Held(_) => false,
            _ => {
                self.phase = GesturePhase::Dragging;
                self.transform = CardTransform::REST;
                true
            }
        }
    }

    /// Move sample relative to the drag origin
    pub fn update(&mut self, dx: f64, dy: f64) -> CardTransform {
        if self.phase == GesturePhase::Dragging {
            self.transform = CardTransform {
                dx,
                dy,
                rotation_deg: rotation_for(dx),
            };
        }
        self.transform
    }

    /// Drag end. Returns the decision, or `None` after snapping back.
    pub fn release(&mut self, dx: f64, dy: f64) -> Option<Direction> {
        if self.phase != GesturePhase::Dragging {
            return None;
        }
        self.update(dx, dy);

        match classify(dx, self.threshold()) {
            Some(direction) => {
                debug!("drag released at dx={:.1}: {}", dx, direction);
                self.phase = GesturePhase::Held(direction);
                Some(direction)
            }
            None => {
                debug!("drag released at dx={:.1}: within threshold, snapping back", dx);
                self.restore();
                None
            }
        }
    }

    /// Explicit like/pass action, bypassing the drag
    pub fn trigger(&mut self, direction: Direction) -> bool {
        if let GesturePhase::Held(_) = self.phase {
            return false;
        }
        self.phase = GesturePhase::Held(direction);
        true
    }

    /// Return the card to its resting position
    pub fn restore(&mut self) {
        self.phase = GesturePhase::Resting;
        self.transform = CardTransform::REST;
    }

    /// Off-screen transform the card animates to once consumed
    pub fn fling(&self, direction: Direction) -> CardTransform {
        let dx = direction.sign() * self.surface_width;
        CardTransform {
            dx,
            dy: 0.0,
            rotation_deg: rotation_for(dx),
        }
    }
}

/// Decision for a release at horizontal displacement `dx`.
/// Strict on both sides: exactly ±threshold is no decision.
pub fn classify(dx: f64, threshold: f64) -> Option<Direction> {
    if dx > threshold {
        Some(Direction::Like)
    } else if dx < -threshold {
        Some(Direction::Pass)
    } else {
        None
    }
}

/// Tilt in degrees for horizontal displacement `dx`, clamped to ±15°
pub fn rotation_for(dx: f64) -> f64 {
    let input = (dx * ROTATION_PER_PX).clamp(-ROTATION_INPUT_RANGE, ROTATION_INPUT_RANGE);
    input / ROTATION_INPUT_RANGE * MAX_ROTATION_DEG
}

// =============================================================================
// TESTS
// =============================================================================
