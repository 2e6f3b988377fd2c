use crate::animation::{AuraTint, CardVisual};
use crate::deck::{Card, VoteDirection};
use eframe::egui::emath::Rot2;
use eframe::egui::epaint::TextShape;
use eframe::egui::{Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, Vec2};

const CARD_FILL: Color32 = Color32::from_rgb(38, 41, 48);
const CARD_STROKE: Color32 = Color32::from_rgb(70, 75, 86);
const YES_COLOR: Color32 = Color32::from_rgb(46, 204, 113);
const NO_COLOR: Color32 = Color32::from_rgb(231, 76, 60);
const NEUTRAL_COLOR: Color32 = Color32::from_rgb(120, 130, 150);

/// Corners of the card outline after scaling, rotating and translating
pub fn card_corners(rect: Rect, visual: &CardVisual) -> [Pos2; 4] {
    let center = rect.center() + Vec2::new(visual.translate_x, 0.0);
    let half = rect.size() * 0.5 * visual.scale;
    let rot = Rot2::from_angle(visual.rotation_deg.to_radians());
    [
        Vec2::new(-half.x, -half.y),
        Vec2::new(half.x, -half.y),
        Vec2::new(half.x, half.y),
        Vec2::new(-half.x, half.y),
    ]
    .map(|corner| center + rot * corner)
}

fn tint_color(tint: AuraTint) -> Color32 {
    match tint {
        AuraTint::Yes => YES_COLOR,
        AuraTint::No => NO_COLOR,
        AuraTint::Neutral => NEUTRAL_COLOR,
    }
}

fn paint_aura(painter: &Painter, rect: Rect, visual: &CardVisual) {
    let aura = visual.aura;
    if aura.opacity <= 0.0 {
        return;
    }
    let center = rect.center() + Vec2::new(aura.offset_x, 0.0);
    let radius = rect.width().max(rect.height()) * 0.6 * aura.scale;
    painter.circle_filled(
        center,
        radius,
        tint_color(aura.tint).gamma_multiply(aura.opacity),
    );
}

// Text laid out around `offset` from the card center, following the card rotation
fn paint_rotated_text(
    painter: &Painter,
    rect: Rect,
    visual: &CardVisual,
    text: String,
    font: FontId,
    color: Color32,
    offset: Vec2,
) {
    let rot = Rot2::from_angle(visual.rotation_deg.to_radians());
    let center = rect.center() + Vec2::new(visual.translate_x, 0.0);
    let wrap_width = rect.width() * 0.8 * visual.scale;
    let galley = painter.layout(text, font, color, wrap_width);
    let anchor = offset * visual.scale - galley.size() * 0.5;
    let pos = center + rot * anchor;
    painter.add(Shape::Text(
        TextShape::new(pos, galley, color).with_angle(visual.rotation_deg.to_radians()),
    ));
}

pub fn paint_card(painter: &Painter, rect: Rect, card: &Card, visual: &CardVisual) {
    paint_aura(painter, rect, visual);

    let corners = card_corners(rect, visual);
    painter.add(Shape::convex_polygon(
        corners.to_vec(),
        CARD_FILL.gamma_multiply(visual.opacity),
        Stroke::new(1.5, CARD_STROKE.gamma_multiply(visual.opacity)),
    ));

    let text_color = Color32::WHITE.gamma_multiply(visual.opacity);
    paint_rotated_text(
        painter,
        rect,
        visual,
        card.text.clone(),
        FontId::proportional(24.0),
        text_color,
        Vec2::ZERO,
    );
    paint_rotated_text(
        painter,
        rect,
        visual,
        format!("👍 {}    👎 {}", card.yes_count, card.no_count),
        FontId::proportional(16.0),
        Color32::GRAY.gamma_multiply(visual.opacity),
        Vec2::new(0.0, rect.height() * 0.38),
    );

    if let Some(stamp) = visual.stamp {
        let (label, color, side) = match stamp.direction {
            VoteDirection::Yes => ("YES", YES_COLOR, -1.0),
            VoteDirection::No => ("NOPE", NO_COLOR, 1.0),
        };
        paint_rotated_text(
            painter,
            rect,
            visual,
            label.to_string(),
            FontId::proportional(36.0 * stamp.scale),
            color.gamma_multiply(stamp.opacity),
            Vec2::new(side * rect.width() * 0.25, -rect.height() * 0.36),
        );
    }
}
