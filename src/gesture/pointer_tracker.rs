use chrono::{DateTime, Local};
use statum::{machine, state};
use tracing::{debug, info};

pub type PointerId = u64;

// Raw pointer input with wall-clock timestamps
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Down {
        x: f32,
        y: f32,
        pointer_id: PointerId,
        timestamp: DateTime<Local>,
    },
    Move {
        x: f32,
        y: f32,
        pointer_id: PointerId,
        timestamp: DateTime<Local>,
    },
    Up {
        pointer_id: PointerId,
        timestamp: DateTime<Local>,
    },
    Cancel {
        pointer_id: PointerId,
        timestamp: DateTime<Local>,
    },
}

impl PointerEvent {
    pub fn pointer_id(&self) -> PointerId {
        match self {
            PointerEvent::Down { pointer_id, .. }
            | PointerEvent::Move { pointer_id, .. }
            | PointerEvent::Up { pointer_id, .. }
            | PointerEvent::Cancel { pointer_id, .. } => *pointer_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        match self {
            PointerEvent::Down { timestamp, .. }
            | PointerEvent::Move { timestamp, .. }
            | PointerEvent::Up { timestamp, .. }
            | PointerEvent::Cancel { timestamp, .. } => *timestamp,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AxisLock {
    #[default]
    None,
    Horizontal,
    Vertical,
}

impl AxisLock {
    fn decide(dx: f32, dy: f32, threshold: f32) -> Self {
        if dx.abs() <= threshold && dy.abs() <= threshold {
            AxisLock::None
        } else if dx.abs() > dy.abs() {
            AxisLock::Horizontal
        } else {
            AxisLock::Vertical
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MoveStatus {
    /// Not enough movement to pick an axis yet
    Pending,
    /// Horizontal swipe; the caller must suppress default scrolling
    LockedHorizontal { dx: f32 },
    /// Vertical scroll; the gesture has been dropped
    LockedVertical,
}

/// Terminal sample of a gesture, consumed by the classifier
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Release {
    pub dx: f32,
    pub elapsed_ms: i64,
}

/// Snapshot of the live gesture
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GestureState {
    pub origin_x: Option<f32>,
    pub origin_y: Option<f32>,
    pub current_dx: f32,
    pub pointer_id: Option<PointerId>,
    pub axis_lock: AxisLock,
    pub gesture_started_at: Option<DateTime<Local>>,
}

// Capture lifecycle using statum's state macro
#[state]
#[derive(Debug, Clone)]
pub enum TrackingState {
    Undecided,
    Swiping,
}

#[machine]
#[derive(Debug)]
pub struct GestureSession<S: TrackingState> {
    pointer_id: PointerId,
    origin_x: f32,
    origin_y: f32,
    current_dx: f32,
    started_at: DateTime<Local>,
}

impl<S: TrackingState> GestureSession<S> {
    pub fn pointer_id(&self) -> PointerId {
        self.pointer_id
    }

    fn elapsed_ms(&self, at: DateTime<Local>) -> i64 {
        (at - self.started_at).num_milliseconds().max(0)
    }
}

impl GestureSession<Undecided> {
    pub fn start(x: f32, y: f32, pointer_id: PointerId, started_at: DateTime<Local>) -> Self {
        Self::new(pointer_id, x, y, 0.0, started_at)
    }

    pub fn lock_horizontal(self) -> GestureSession<Swiping> {
        self.transition()
    }
}

impl GestureSession<Swiping> {
    fn track(&mut self, x: f32) -> f32 {
        self.current_dx = x - self.origin_x;
        self.current_dx
    }
}

#[derive(Debug, Default)]
enum Capture {
    #[default]
    Released,
    Undecided(GestureSession<Undecided>),
    Swiping(GestureSession<Swiping>),
}

/// Owns the single captured pointer and its axis decision.
///
/// A second pointer is ignored until the captured one ends. Moves, releases
/// and cancels from any other pointer id are ignored as well.
#[derive(Debug)]
pub struct PointerTracker {
    capture: Capture,
    axis_lock_px: f32,
}

impl Default for PointerTracker {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl PointerTracker {
    pub fn new(axis_lock_px: f32) -> Self {
        Self {
            capture: Capture::Released,
            axis_lock_px,
        }
    }

    pub fn is_captured(&self) -> bool {
        !matches!(self.capture, Capture::Released)
    }

    fn owns(&self, pointer_id: PointerId) -> bool {
        match &self.capture {
            Capture::Released => false,
            Capture::Undecided(session) => session.pointer_id() == pointer_id,
            Capture::Swiping(session) => session.pointer_id() == pointer_id,
        }
    }

    /// Returns false when another pointer already owns the gesture
    pub fn on_pointer_down(
        &mut self,
        x: f32,
        y: f32,
        pointer_id: PointerId,
        timestamp: DateTime<Local>,
    ) -> bool {
        if self.is_captured() {
            debug!("Ignoring pointer {} while another is captured", pointer_id);
            return false;
        }
        debug!("Captured pointer {} at ({:.1}, {:.1})", pointer_id, x, y);
        self.capture = Capture::Undecided(GestureSession::start(x, y, pointer_id, timestamp));
        true
    }

    pub fn on_pointer_move(&mut self, x: f32, y: f32, pointer_id: PointerId) -> Option<MoveStatus> {
        if !self.owns(pointer_id) {
            return None;
        }

        match std::mem::take(&mut self.capture) {
            Capture::Released => None,
            Capture::Undecided(session) => {
                let dx = x - session.origin_x;
                let dy = y - session.origin_y;
                match AxisLock::decide(dx, dy, self.axis_lock_px) {
                    AxisLock::None => {
                        self.capture = Capture::Undecided(session);
                        Some(MoveStatus::Pending)
                    }
                    AxisLock::Horizontal => {
                        debug!("Pointer {} locked horizontal", pointer_id);
                        let mut session = session.lock_horizontal();
                        let dx = session.track(x);
                        self.capture = Capture::Swiping(session);
                        Some(MoveStatus::LockedHorizontal { dx })
                    }
                    AxisLock::Vertical => {
                        info!("Pointer {} locked vertical, releasing to scroll", pointer_id);
                        Some(MoveStatus::LockedVertical)
                    }
                }
            }
            Capture::Swiping(mut session) => {
                let dx = session.track(x);
                self.capture = Capture::Swiping(session);
                Some(MoveStatus::LockedHorizontal { dx })
            }
        }
    }

    /// Ends the gesture and hands back the terminal sample
    pub fn on_pointer_up(
        &mut self,
        pointer_id: PointerId,
        timestamp: DateTime<Local>,
    ) -> Option<Release> {
        if !self.owns(pointer_id) {
            return None;
        }

        let release = match std::mem::take(&mut self.capture) {
            Capture::Released => return None,
            Capture::Undecided(session) => Release {
                dx: 0.0,
                elapsed_ms: session.elapsed_ms(timestamp),
            },
            Capture::Swiping(session) => Release {
                dx: session.current_dx,
                elapsed_ms: session.elapsed_ms(timestamp),
            },
        };
        debug!(
            "Pointer {} released: dx={:.1} after {}ms",
            pointer_id, release.dx, release.elapsed_ms
        );
        Some(release)
    }

    /// Drops the gesture without a terminal sample
    pub fn on_pointer_cancel(&mut self, pointer_id: PointerId) -> bool {
        if !self.owns(pointer_id) {
            return false;
        }
        debug!("Pointer {} cancelled", pointer_id);
        self.capture = Capture::Released;
        true
    }

    pub fn reset(&mut self) {
        if self.is_captured() {
            debug!("Dropping live gesture capture");
        }
        self.capture = Capture::Released;
    }

    pub fn current_dx(&self) -> f32 {
        match &self.capture {
            Capture::Swiping(session) => session.current_dx,
            _ => 0.0,
        }
    }

    pub fn state(&self) -> GestureState {
        match &self.capture {
            Capture::Released => GestureState::default(),
            Capture::Undecided(session) => GestureState {
                origin_x: Some(session.origin_x),
                origin_y: Some(session.origin_y),
                current_dx: 0.0,
                pointer_id: Some(session.pointer_id),
                axis_lock: AxisLock::None,
                gesture_started_at: Some(session.started_at),
            },
            Capture::Swiping(session) => GestureState {
                origin_x: Some(session.origin_x),
                origin_y: Some(session.origin_y),
                current_dx: session.current_dx,
                pointer_id: Some(session.pointer_id),
                axis_lock: AxisLock::Horizontal,
                gesture_started_at: Some(session.started_at),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn t0() -> DateTime<Local> {
        Local::now()
    }

    #[test]
    fn small_moves_stay_pending() {
        let mut tracker = PointerTracker::default();
        assert!(tracker.on_pointer_down(100.0, 100.0, 1, t0()));

        assert_eq!(tracker.on_pointer_move(105.0, 96.0, 1), Some(MoveStatus::Pending));
        assert_eq!(tracker.on_pointer_move(110.0, 110.0, 1), Some(MoveStatus::Pending));
        assert_eq!(tracker.state().axis_lock, AxisLock::None);
        assert_eq!(tracker.current_dx(), 0.0);
    }

    #[test]
    fn horizontal_lock_tracks_dx() {
        let mut tracker = PointerTracker::default();
        tracker.on_pointer_down(100.0, 100.0, 1, t0());

        assert_eq!(
            tracker.on_pointer_move(115.0, 104.0, 1),
            Some(MoveStatus::LockedHorizontal { dx: 15.0 })
        );
        // Once locked, vertical drift no longer matters
        assert_eq!(
            tracker.on_pointer_move(60.0, 180.0, 1),
            Some(MoveStatus::LockedHorizontal { dx: -40.0 })
        );

        let state = tracker.state();
        assert_eq!(state.axis_lock, AxisLock::Horizontal);
        assert_eq!(state.current_dx, -40.0);
        assert_eq!(state.pointer_id, Some(1));
    }

    #[test]
    fn vertical_lock_disengages() {
        let mut tracker = PointerTracker::default();
        tracker.on_pointer_down(100.0, 100.0, 1, t0());

        assert_eq!(
            tracker.on_pointer_move(108.0, 130.0, 1),
            Some(MoveStatus::LockedVertical)
        );
        assert!(!tracker.is_captured());
        assert_eq!(tracker.state(), GestureState::default());
        assert_eq!(tracker.on_pointer_move(300.0, 130.0, 1), None);
        assert_eq!(tracker.on_pointer_up(1, t0()), None);
    }

    #[test]
    fn diagonal_tie_locks_vertical() {
        let mut tracker = PointerTracker::default();
        tracker.on_pointer_down(0.0, 0.0, 1, t0());
        assert_eq!(
            tracker.on_pointer_move(20.0, -20.0, 1),
            Some(MoveStatus::LockedVertical)
        );
    }

    #[test]
    fn second_pointer_is_ignored() {
        let mut tracker = PointerTracker::default();
        let start = t0();
        tracker.on_pointer_down(0.0, 0.0, 1, start);

        assert!(!tracker.on_pointer_down(50.0, 50.0, 2, start));
        assert_eq!(tracker.on_pointer_move(200.0, 50.0, 2), None);
        assert_eq!(tracker.on_pointer_up(2, start), None);
        assert!(!tracker.on_pointer_cancel(2));
        assert_eq!(tracker.state().pointer_id, Some(1));
    }

    #[test]
    fn release_reports_dx_and_duration() {
        let mut tracker = PointerTracker::default();
        let start = t0();
        tracker.on_pointer_down(10.0, 10.0, 7, start);
        tracker.on_pointer_move(60.0, 12.0, 7);
        tracker.on_pointer_move(210.0, 15.0, 7);

        let release = tracker
            .on_pointer_up(7, start + Duration::milliseconds(250))
            .unwrap();
        assert_eq!(release, Release { dx: 200.0, elapsed_ms: 250 });
        assert!(!tracker.is_captured());
    }

    #[test]
    fn release_while_pending_has_no_displacement() {
        let mut tracker = PointerTracker::default();
        let start = t0();
        tracker.on_pointer_down(10.0, 10.0, 1, start);
        tracker.on_pointer_move(14.0, 12.0, 1);

        let release = tracker
            .on_pointer_up(1, start + Duration::milliseconds(40))
            .unwrap();
        assert_eq!(release.dx, 0.0);
        assert_eq!(release.elapsed_ms, 40);
    }

    #[test]
    fn cancel_frees_the_capture() {
        let mut tracker = PointerTracker::default();
        tracker.on_pointer_down(0.0, 0.0, 1, t0());
        tracker.on_pointer_move(40.0, 0.0, 1);

        assert!(tracker.on_pointer_cancel(1));
        assert!(tracker.on_pointer_down(0.0, 0.0, 2, t0()));
    }
}
