//! Gesture subsystem for card swipes
//!
//! Implements a two-stage pipeline on top of raw pointer input:
//!
//! 1. [`pointer_tracker`] - Single-pointer capture and axis-intent lock
//! 2. [`classifier`] - Release decision from the terminal sample
//!
//! # Architecture
//!
//! ```text
//! PointerEvent ──► PointerTracker ──► Release ──► GestureClassifier ──► ReleaseDecision
//!                  (axis lock, dx)   (dx, ms)     (flick / threshold)   (SnapBack | Commit)
//! ```
//!
//! Vertical intent drops the gesture so the surrounding page can scroll;
//! horizontal intent keeps feeding `dx` to the animation sequencer.

pub mod classifier;
pub mod pointer_tracker;

pub use classifier::{drag_progress, GestureClassifier, GestureSettings, ReleaseDecision};
pub use pointer_tracker::{
    AxisLock, GestureState, MoveStatus, PointerEvent, PointerId, PointerTracker, Release,
};
