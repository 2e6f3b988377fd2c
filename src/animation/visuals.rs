//! Derived card visuals.
//!
//! Nothing here is stored: every value is recomputed from the phase, the
//! displacement and how far the phase has progressed.

use super::sequencer::{AnimationPhase, AnimationSettings};
use crate::deck::VoteDirection;
use crate::gesture::drag_progress;

const THROW_ROTATION_BOOST: f32 = 1.18;
const DRAG_LIFT_SCALE: f32 = 1.012;
const ENTER_START_SCALE: f32 = 0.93;
const ENTER_START_OPACITY: f32 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameInput {
    pub phase: AnimationPhase,
    pub dx: f32,
    pub committed: Option<VoteDirection>,
    /// Elapsed share of the current phase, 0..=1
    pub phase_progress: f32,
    pub viewport_width: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stamp {
    pub direction: VoteDirection,
    pub opacity: f32,
    pub scale: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuraTint {
    Yes,
    No,
    Neutral,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aura {
    pub tint: AuraTint,
    pub opacity: f32,
    pub scale: f32,
    pub offset_x: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CardVisual {
    pub translate_x: f32,
    pub rotation_deg: f32,
    pub scale: f32,
    pub opacity: f32,
    pub interactive: bool,
    pub stamp: Option<Stamp>,
    pub aura: Aura,
}

pub fn rotation_deg(dx: f32, viewport_width: f32, settings: &AnimationSettings) -> f32 {
    let span = viewport_width * settings.rotation_span_ratio;
    if span <= 0.0 || !dx.is_finite() {
        return 0.0;
    }
    (dx / span).clamp(-1.0, 1.0) * settings.max_rotation_deg
}

fn ease_out(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

fn ease_in(t: f32) -> f32 {
    t * t
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

fn hidden_aura() -> Aura {
    Aura {
        tint: AuraTint::Neutral,
        opacity: 0.0,
        scale: 1.0,
        offset_x: 0.0,
    }
}

fn drag_aura(dx: f32, progress: f32) -> Aura {
    let tint = match VoteDirection::from_offset(dx) {
        Some(VoteDirection::Yes) => AuraTint::Yes,
        Some(VoteDirection::No) => AuraTint::No,
        None => AuraTint::Neutral,
    };
    Aura {
        tint,
        opacity: 0.07 + progress * 0.13,
        scale: 1.0 + progress * 0.08,
        offset_x: dx * 0.08,
    }
}

fn at_rest(interactive: bool) -> CardVisual {
    CardVisual {
        translate_x: 0.0,
        rotation_deg: 0.0,
        scale: 1.0,
        opacity: 1.0,
        interactive,
        stamp: None,
        aura: hidden_aura(),
    }
}

pub fn card_visual(
    input: &FrameInput,
    settings: &AnimationSettings,
    commit_threshold_px: f32,
) -> CardVisual {
    let t = if input.phase_progress.is_finite() {
        input.phase_progress.clamp(0.0, 1.0)
    } else {
        1.0
    };

    match input.phase {
        AnimationPhase::Idle => at_rest(true),
        AnimationPhase::Dragging => {
            let progress = drag_progress(input.dx, commit_threshold_px);
            let stamp = VoteDirection::from_offset(input.dx).map(|direction| Stamp {
                direction,
                opacity: progress,
                scale: 0.9 + progress * 0.1,
            });
            CardVisual {
                translate_x: input.dx,
                rotation_deg: rotation_deg(input.dx, input.viewport_width, settings),
                scale: DRAG_LIFT_SCALE,
                opacity: 1.0,
                interactive: true,
                stamp,
                aura: drag_aura(input.dx, progress),
            }
        }
        AnimationPhase::SnappingBack => {
            let x = input.dx * (1.0 - ease_out(t));
            CardVisual {
                translate_x: x,
                rotation_deg: rotation_deg(x, input.viewport_width, settings),
                ..at_rest(false)
            }
        }
        AnimationPhase::ThrowingOut => {
            let sign = input
                .committed
                .map(VoteDirection::sign)
                .unwrap_or_else(|| input.dx.signum());
            let x = lerp(input.dx, sign * settings.throw_distance_px, ease_in(t));
            CardVisual {
                translate_x: x,
                rotation_deg: rotation_deg(x, input.viewport_width, settings)
                    * THROW_ROTATION_BOOST,
                ..at_rest(false)
            }
        }
        AnimationPhase::Exiting => CardVisual {
            translate_x: input.dx,
            rotation_deg: rotation_deg(input.dx, input.viewport_width, settings)
                * THROW_ROTATION_BOOST,
            ..at_rest(false)
        },
        AnimationPhase::Entering => {
            let eased = ease_out(t);
            CardVisual {
                scale: lerp(ENTER_START_SCALE, 1.0, eased),
                opacity: lerp(ENTER_START_OPACITY, 1.0, eased),
                ..at_rest(false)
            }
        }
    }
}
