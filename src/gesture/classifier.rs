use crate::deck::VoteDirection;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Thresholds for axis locking and vote commitment
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureSettings {
    /// Movement on either axis beyond this distance decides the axis lock
    pub axis_lock_px: f32,
    /// Distance at which a slow drag commits
    pub commit_threshold_px: f32,
    /// A release faster than this counts as a flick
    pub flick_max_ms: i64,
    /// Minimum distance for a flick to commit
    pub flick_min_px: f32,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            axis_lock_px: 10.0,
            commit_threshold_px: 170.0,
            flick_max_ms: 120,
            flick_min_px: 60.0,
        }
    }
}

/// Outcome of a released horizontal drag
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReleaseDecision {
    SnapBack,
    Commit(VoteDirection),
}

#[derive(Clone, Debug, Default)]
pub struct GestureClassifier {
    settings: GestureSettings,
}

impl GestureClassifier {
    pub fn new(settings: GestureSettings) -> Self {
        Self { settings }
    }

    /// Decides from the terminal sample only: a fast flick commits first,
    /// otherwise the distance threshold applies.
    pub fn decide_on_release(&self, dx: f32, elapsed_ms: i64) -> ReleaseDecision {
        let direction = match VoteDirection::from_offset(dx) {
            Some(direction) if dx.is_finite() => direction,
            _ => return ReleaseDecision::SnapBack,
        };
        let distance = dx.abs();

        if elapsed_ms < self.settings.flick_max_ms && distance > self.settings.flick_min_px {
            debug!(
                "Flick commit: {:.1}px in {}ms -> {}",
                dx, elapsed_ms, direction
            );
            return ReleaseDecision::Commit(direction);
        }

        if distance >= self.settings.commit_threshold_px {
            debug!("Threshold commit: {:.1}px -> {}", dx, direction);
            return ReleaseDecision::Commit(direction);
        }

        debug!("Snap back: {:.1}px after {}ms", dx, elapsed_ms);
        ReleaseDecision::SnapBack
    }

    /// Fraction of the commit distance covered, for live feedback
    pub fn progress(&self, dx: f32) -> f32 {
        drag_progress(dx, self.settings.commit_threshold_px)
    }
}

pub fn drag_progress(dx: f32, commit_threshold_px: f32) -> f32 {
    if commit_threshold_px <= 0.0 || !dx.is_finite() {
        return 0.0;
    }
    (dx.abs() / commit_threshold_px).clamp(0.0, 1.0)
}
