//! # Swipe Deck Front-End
//!
//! Thin eframe/egui shell around the engine. Each frame it:
//!
//! 1. forwards primary-pointer input and arrow keys as [`EngineInput`]s
//! 2. reads the latest [`DeckView`] from the watch channel
//! 3. paints the card from [`card_visual`], interpolating the current phase
//!    on a local clock that restarts whenever the phase generation changes
//!
//! No deck or animation state lives here; everything shown is derived from the
//! snapshot. Engine inputs are sent with `try_send` so a slow engine never
//! blocks a frame.

pub mod card_painter;

use crate::animation::{card_visual, AnimationPhase, FrameInput};
use crate::deck::{DeckStatus, VoteDirection, IDEA_MAX_CHARS};
use crate::engine::{DeckView, EngineInput, EngineSettings, SubmitOutcome, SubmitReceipt};
use crate::gesture::{PointerEvent, PointerId};
use chrono::Local;
use eframe::egui::{self, Color32, Event, Key, PointerButton, Pos2, Rect, Sense, Vec2};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, warn};

/// The mouse or primary touch; egui folds touches into this pointer
const PRIMARY_POINTER: PointerId = 0;
const CARD_ASPECT: f32 = 1.35;
const MAX_CARD_WIDTH: f32 = 360.0;

/// Restarts whenever a new phase begins
#[derive(Debug, Clone, Copy)]
struct PhaseClock {
    generation: u64,
    started: Instant,
}

impl PhaseClock {
    fn new(now: Instant) -> Self {
        Self {
            generation: 0,
            started: now,
        }
    }

    fn progress(&mut self, generation: u64, duration: Duration, now: Instant) -> f32 {
        if generation != self.generation {
            self.generation = generation;
            self.started = now;
        }
        if duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started);
        (elapsed.as_secs_f32() / duration.as_secs_f32()).clamp(0.0, 1.0)
    }
}

fn starts_gesture(card_rect: Option<Rect>, interactive: bool, pos: Pos2) -> bool {
    interactive && card_rect.is_some_and(|rect| rect.contains(pos))
}

/// Idea text being typed, kept until the engine confirms it was accepted
#[derive(Debug, Default)]
struct IdeaDraft {
    text: String,
    /// Attempt number of the `SubmitIdea` we are waiting on
    awaiting: Option<u64>,
}

impl IdeaDraft {
    fn can_submit(&self, view: &DeckView) -> bool {
        !self.text.trim().is_empty() && !view.submitting && self.awaiting.is_none()
    }

    /// Claims the next attempt number and returns the text to send
    fn submit(&mut self, view: &DeckView) -> String {
        self.awaiting = Some(view.submit_attempts + 1);
        self.text.clone()
    }

    fn settle(&mut self, receipt: Option<SubmitReceipt>) {
        let (Some(expected), Some(receipt)) = (self.awaiting, receipt) else {
            return;
        };
        if receipt.attempt < expected || receipt.outcome == SubmitOutcome::Pending {
            return;
        }
        if receipt.attempt == expected && receipt.outcome == SubmitOutcome::Accepted {
            self.text.clear();
        }
        self.awaiting = None;
    }
}

pub struct SwipeDeckUI {
    input: mpsc::Sender<EngineInput>,
    view: watch::Receiver<DeckView>,
    settings: EngineSettings,
    draft: IdeaDraft,
    last_width: f32,
    clock: PhaseClock,
    /// Card bounds from the last frame, for hit-testing pointer-down
    card_rect: Option<Rect>,
    /// Whether the card painted last frame accepts a new gesture
    card_interactive: bool,
}

impl SwipeDeckUI {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        input: mpsc::Sender<EngineInput>,
        view: watch::Receiver<DeckView>,
        settings: EngineSettings,
    ) -> Self {
        cc.egui_ctx.set_theme(egui::Theme::Dark);
        Self {
            input,
            view,
            last_width: settings.viewport_width,
            settings,
            draft: IdeaDraft::default(),
            clock: PhaseClock::new(Instant::now()),
            card_rect: None,
            card_interactive: false,
        }
    }

    fn send(&self, input: EngineInput) -> bool {
        match self.input.try_send(input) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(input)) => {
                warn!("Engine input queue full, dropping {:?}", input);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!("Engine is not running");
                false
            }
        }
    }

    fn clear_card(&mut self) {
        self.card_rect = None;
        self.card_interactive = false;
    }

    fn forward_pointer_events(&self, ctx: &egui::Context) {
        let events = ctx.input(|i| i.events.clone());
        for event in events {
            let timestamp = Local::now();
            let pointer = match event {
                Event::PointerButton {
                    pos,
                    button: PointerButton::Primary,
                    pressed: true,
                    ..
                } => {
                    if !starts_gesture(self.card_rect, self.card_interactive, pos) {
                        continue;
                    }
                    PointerEvent::Down {
                        x: pos.x,
                        y: pos.y,
                        pointer_id: PRIMARY_POINTER,
                        timestamp,
                    }
                }
                Event::PointerButton {
                    button: PointerButton::Primary,
                    pressed: false,
                    ..
                } => PointerEvent::Up {
                    pointer_id: PRIMARY_POINTER,
                    timestamp,
                },
                Event::PointerMoved(pos) => PointerEvent::Move {
                    x: pos.x,
                    y: pos.y,
                    pointer_id: PRIMARY_POINTER,
                    timestamp,
                },
                Event::PointerGone => PointerEvent::Cancel {
                    pointer_id: PRIMARY_POINTER,
                    timestamp,
                },
                _ => continue,
            };
            self.send(EngineInput::Pointer(pointer));
        }
    }

    fn forward_keys(&self, ctx: &egui::Context) {
        if ctx.memory(|m| m.focused().is_some()) {
            return;
        }
        let (left, right) = ctx.input(|i| {
            (
                i.key_pressed(Key::ArrowLeft),
                i.key_pressed(Key::ArrowRight),
            )
        });
        if left {
            self.send(EngineInput::Vote(VoteDirection::No));
        }
        if right {
            self.send(EngineInput::Vote(VoteDirection::Yes));
        }
    }

    fn render_idea_form(&mut self, ui: &mut egui::Ui, view: &DeckView) {
        self.draft.settle(view.last_submit);
        ui.horizontal(|ui| {
            let field = egui::TextEdit::singleline(&mut self.draft.text)
                .char_limit(IDEA_MAX_CHARS)
                .hint_text("Suggest an idea")
                .desired_width(ui.available_width() - 90.0);
            let response = ui.add(field);
            let enabled = self.draft.can_submit(view);
            let submit = ui.add_enabled(enabled, egui::Button::new("Submit"));
            let entered = response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));
            if (submit.clicked() || entered) && enabled {
                let text = self.draft.submit(view);
                if !self.send(EngineInput::SubmitIdea(text)) {
                    self.draft.awaiting = None;
                }
            }
        });
        ui.label(format!(
            "{}/{}",
            self.draft.text.chars().count(),
            IDEA_MAX_CHARS
        ));
        if let Some(notice) = &view.notice {
            let color = if notice.is_error() {
                Color32::LIGHT_RED
            } else {
                Color32::LIGHT_GREEN
            };
            ui.colored_label(color, notice.message());
        }
    }

    fn render_deck(&mut self, ui: &mut egui::Ui, view: &DeckView) {
        match &view.status {
            DeckStatus::Loading => {
                self.clear_card();
                ui.vertical_centered(|ui| {
                    ui.spinner();
                    ui.label("Loading ideas...");
                });
            }
            DeckStatus::Failed(message) => {
                self.clear_card();
                ui.vertical_centered(|ui| {
                    ui.colored_label(Color32::LIGHT_RED, message);
                    if ui.button("Retry").clicked() {
                        self.send(EngineInput::Reload);
                    }
                });
            }
            DeckStatus::Exhausted => {
                self.clear_card();
                ui.vertical_centered(|ui| {
                    ui.heading("You've reviewed every idea");
                    if ui.button("Reload").clicked() {
                        self.send(EngineInput::Reload);
                    }
                });
            }
            DeckStatus::Reviewing => self.render_card(ui, view),
        }
    }

    fn render_card(&mut self, ui: &mut egui::Ui, view: &DeckView) {
        ui.vertical_centered(|ui| {
            ui.label(format!("{} / {}", view.position + 1, view.total));

            let width = (ui.available_width() * 0.85).min(MAX_CARD_WIDTH);
            let (rect, _) =
                ui.allocate_exact_size(Vec2::new(width, width * CARD_ASPECT), Sense::hover());
            self.card_rect = Some(rect);
            self.card_interactive = false;

            if let Some(card) = &view.current {
                let progress = self.clock.progress(
                    view.phase_generation,
                    view.phase_duration,
                    Instant::now(),
                );
                let frame = FrameInput {
                    phase: view.phase,
                    dx: view.dx,
                    committed: view.committed,
                    phase_progress: progress,
                    viewport_width: view.viewport_width,
                };
                let visual = card_visual(
                    &frame,
                    &self.settings.animation,
                    self.settings.gesture.commit_threshold_px,
                );
                self.card_interactive = visual.interactive;
                card_painter::paint_card(ui.painter(), rect, card, &visual);
            }

            ui.add_space(12.0);
            ui.horizontal(|ui| {
                let enabled = view.accepts_votes();
                if ui
                    .add_enabled(enabled, egui::Button::new("👎 Nope"))
                    .clicked()
                {
                    self.send(EngineInput::Vote(VoteDirection::No));
                }
                if ui
                    .add_enabled(enabled, egui::Button::new("👍 Yes"))
                    .clicked()
                {
                    self.send(EngineInput::Vote(VoteDirection::Yes));
                }
            });
        });
    }
}

impl eframe::App for SwipeDeckUI {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.forward_pointer_events(ctx);
        self.forward_keys(ctx);

        let view = self.view.borrow_and_update().clone();

        egui::TopBottomPanel::bottom("idea_panel").show(ctx, |ui| {
            self.render_idea_form(ui, &view);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let width = ui.available_width();
            if (width - self.last_width).abs() > 0.5 {
                debug!("Viewport resized to {:.0}", width);
                self.last_width = width;
                self.send(EngineInput::Resize {
                    viewport_width: width,
                });
            }
            self.render_deck(ui, &view);
        });

        if view.phase != AnimationPhase::Idle {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(Duration::from_millis(33));
        }
    }
}
