//! Swipe gesture state machine
//!
//! Converts a pointer/touch sequence over a stacked profile card into a
//! discrete decision (`like`/`dislike`) or a snap-back, and sequences the
//! exit animation before the owning screen advances to the next card.
//!
//! The machine is split in two layers:
//!
//! - [`SwipeGesture`] is pure: it holds the state (`Idle`, `Dragging`,
//!   `Committing`) and the presentational derivations (offset, rotation,
//!   opacity). Every transition is a plain method call, which is what the
//!   property tests drive.
//! - [`SwipeController`] wraps a gesture with the caller-supplied
//!   [`SwipeOutcomes`] callbacks and owns the timed commit sequence:
//!   decision first, then the exit animation period, then advance.
//!
//! The machine is driven by UI events on one logical task; a new
//! pointer-down is only accepted from `Idle`, so two gestures can never be
//! active at once.

use core::fmt;

use crate::config::GestureConfig;

// ----------------------------------------------------------------------------
// Directions and Actions
// ----------------------------------------------------------------------------

/// Physical direction of a committed swipe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
}

impl SwipeDirection {
    /// The domain action this direction maps to
    pub fn action(self) -> SwipeAction {
        match self {
            SwipeDirection::Right => SwipeAction::Like,
            SwipeDirection::Left => SwipeAction::Dislike,
        }
    }

    /// Sign of the horizontal axis for this direction
    fn sign(self) -> f32 {
        match self {
            SwipeDirection::Right => 1.0,
            SwipeDirection::Left => -1.0,
        }
    }
}

/// Domain decision recorded against the backend by the owning screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeAction {
    Like,
    Dislike,
}

impl fmt::Display for SwipeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Matches the strings the swipe API expects
        match self {
            SwipeAction::Like => write!(f, "like"),
            SwipeAction::Dislike => write!(f, "dislike"),
        }
    }
}

// ----------------------------------------------------------------------------
// Gesture State
// ----------------------------------------------------------------------------

/// Current state of the gesture machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    /// No active pointer; card at rest
    Idle,
    /// Pointer is down and tracking
    Dragging { start_x: f32, current_x: f32 },
    /// Threshold was crossed on release; exit animation is running
    Committing { direction: SwipeDirection },
}

/// Outcome of a pointer release
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Threshold crossed; the decision is committed
    Committed(SwipeDirection),
    /// Below threshold; card snaps back to rest, no callback fires
    SnappedBack,
    /// Release arrived outside `Dragging` (tap-up without down, or during
    /// an exit animation) and was ignored
    Ignored,
}

/// Presentational pose of the card, consumed by the rendering layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardTransform {
    pub translate_x: f32,
    pub rotation_deg: f32,
    pub opacity: f32,
}

impl CardTransform {
    /// The rest pose: centered, unrotated, fully opaque
    pub const REST: Self = Self {
        translate_x: 0.0,
        rotation_deg: 0.0,
        opacity: 1.0,
    };
}

// ----------------------------------------------------------------------------
// Swipe Gesture (pure machine)
// ----------------------------------------------------------------------------

/// Pure swipe state machine: pointer events in, poses and releases out.
#[derive(Debug, Clone)]
pub struct SwipeGesture {
    config: GestureConfig,
    state: GestureState,
}

impl SwipeGesture {
    /// Create a machine with the given tunables
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            state: GestureState::Idle,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, GestureState::Dragging { .. })
    }

    pub fn is_committing(&self) -> bool {
        matches!(self.state, GestureState::Committing { .. })
    }

    /// Horizontal drag distance; zero outside `Dragging`
    pub fn delta(&self) -> f32 {
        match self.state {
            GestureState::Dragging { start_x, current_x } => current_x - start_x,
            _ => 0.0,
        }
    }

    /// Begin tracking a pointer. Accepted only from `Idle`; returns whether
    /// the machine took the pointer.
    pub fn pointer_down(&mut self, x: f32) -> bool {
        match self.state {
            GestureState::Idle => {
                self.state = GestureState::Dragging {
                    start_x: x,
                    current_x: x,
                };
                true
            }
            _ => false,
        }
    }

    /// Track pointer movement. Ignored outside `Dragging`.
    pub fn pointer_move(&mut self, x: f32) {
        if let GestureState::Dragging { start_x, .. } = self.state {
            self.state = GestureState::Dragging {
                start_x,
                current_x: x,
            };
        }
    }

    /// Release the pointer and resolve the gesture.
    ///
    /// Crossing the commit threshold moves the machine to `Committing`; the
    /// caller (normally [`SwipeController`]) runs the exit animation and then
    /// calls [`SwipeGesture::finish_exit`]. Below threshold the machine
    /// returns to `Idle` with all derived values at rest.
    pub fn pointer_up(&mut self) -> Release {
        let delta = match self.state {
            GestureState::Dragging { start_x, current_x } => current_x - start_x,
            _ => return Release::Ignored,
        };

        if delta.abs() >= self.config.commit_threshold {
            let direction = if delta > 0.0 {
                SwipeDirection::Right
            } else {
                SwipeDirection::Left
            };
            self.state = GestureState::Committing { direction };
            Release::Committed(direction)
        } else {
            self.state = GestureState::Idle;
            Release::SnappedBack
        }
    }

    /// Cancel an in-flight drag (pointer capture lost, card unmounted)
    pub fn cancel(&mut self) {
        if self.is_dragging() {
            self.state = GestureState::Idle;
        }
    }

    /// Mark the exit animation finished, returning the machine to `Idle`
    /// so the next card can take a pointer.
    pub fn finish_exit(&mut self) {
        if self.is_committing() {
            self.state = GestureState::Idle;
        }
    }

    /// Current pose of the card
    pub fn transform(&self) -> CardTransform {
        match self.state {
            GestureState::Idle => CardTransform::REST,
            GestureState::Dragging { start_x, current_x } => {
                let delta = current_x - start_x;
                CardTransform {
                    translate_x: delta,
                    rotation_deg: delta * self.config.rotation_factor,
                    opacity: (1.0 - delta.abs() / self.config.fade_distance)
                        .max(self.config.min_opacity),
                }
            }
            GestureState::Committing { direction } => CardTransform {
                translate_x: direction.sign() * self.config.exit_distance,
                rotation_deg: direction.sign() * self.config.exit_rotation,
                opacity: 0.0,
            },
        }
    }
}

impl Default for SwipeGesture {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

// ----------------------------------------------------------------------------
// Swipe Outcomes
// ----------------------------------------------------------------------------

/// Callbacks the owning screen injects into the gesture layer.
///
/// `on_decision` records the like/dislike against the backend;
/// `on_advance` moves the screen to the next card. The gesture layer itself
/// performs no network I/O and has no knowledge of queue exhaustion.
pub trait SwipeOutcomes: Send {
    fn on_decision(&mut self, action: SwipeAction);
    fn on_advance(&mut self);
}

// ----------------------------------------------------------------------------
// Swipe Controller (timed commit sequencing)
// ----------------------------------------------------------------------------

/// Drives a [`SwipeGesture`] against the screen's callbacks.
///
/// On commit the controller fires `on_decision` immediately, waits out the
/// exit animation, then fires `on_advance` exactly once. The exit animation
/// always completes regardless of what the decision call does with the
/// backend; restoring a card on a failed decision is the screen's call.
pub struct SwipeController<O: SwipeOutcomes> {
    gesture: SwipeGesture,
    outcomes: O,
}

impl<O: SwipeOutcomes> SwipeController<O> {
    pub fn new(config: GestureConfig, outcomes: O) -> Self {
        Self {
            gesture: SwipeGesture::new(config),
            outcomes,
        }
    }

    pub fn gesture(&self) -> &SwipeGesture {
        &self.gesture
    }

    /// Current pose of the card
    pub fn transform(&self) -> CardTransform {
        self.gesture.transform()
    }

    pub fn pointer_down(&mut self, x: f32) -> bool {
        self.gesture.pointer_down(x)
    }

    pub fn pointer_move(&mut self, x: f32) {
        self.gesture.pointer_move(x)
    }

    /// Release the pointer and, on commit, run the decision/animation/advance
    /// sequence to completion.
    pub async fn pointer_up(&mut self) -> Release {
        let release = self.gesture.pointer_up();
        if let Release::Committed(direction) = release {
            self.outcomes.on_decision(direction.action());
            tokio::time::sleep(self.gesture.config().exit_duration).await;
            self.outcomes.on_advance();
            self.gesture.finish_exit();
        }
        release
    }

    /// Cancel an in-flight drag
    pub fn cancel(&mut self) {
        self.gesture.cancel();
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
