pub mod image_cache;
pub mod panels;
pub mod text;

use std::path::{Path, PathBuf};

use eframe::egui::{self, Color32, Stroke};

use crate::animation::{RevealState, ease_out};
use crate::color::{Contrast, Gradient};
use crate::navigation::{EXIT_DELAY_MS, INCOMING_MS, SlideFlags};
use crate::schedule::Millis;
use crate::theme::Theme;
use crate::view::{Element, Node, SlideView, TextRole};

use image_cache::ImageCache;

const GRID_COLS: usize = 16;
const GRID_ROWS: usize = 9;
const SLIDE_SHIFT: f32 = 60.0;
const REVEAL_RISE: f32 = 28.0;
const PULSE_PERIOD_MS: Millis = 1200;

/// Reference 1920x1080 scale factor for `rect`.
pub fn compute_scale(rect: egui::Rect) -> f32 {
    let ref_w = 1920.0;
    let ref_h = 1080.0;
    (rect.width() / ref_w).min(rect.height() / ref_h)
}

/// Whole-slide opacity and horizontal offset (in reference pixels) for the
/// exit and entrance phases.
pub fn slide_motion(flags: SlideFlags, now: Millis) -> (f32, f32) {
    if let Some(since) = flags.exiting_since {
        let t = (now.saturating_sub(since) as f32 / EXIT_DELAY_MS as f32).min(1.0);
        (1.0 - t, -SLIDE_SHIFT * ease_out(t))
    } else if let Some(since) = flags.incoming_since {
        let t = (now.saturating_sub(since) as f32 / INCOMING_MS as f32).min(1.0);
        let e = ease_out(t);
        (e, SLIDE_SHIFT * (1.0 - e))
    } else {
        (1.0, 0.0)
    }
}

/// Opacity and downward offset (reference pixels) of one element.
fn element_motion(element: &Element, slide: usize, reveal: &RevealState, now: Millis) -> (f32, f32) {
    match element.stagger {
        Some(slot) => {
            let p = reveal.progress(slide, slot, now);
            (p, REVEAL_RISE * (1.0 - p))
        }
        None => (1.0, 0.0),
    }
}

/// Largest rect with the texture's aspect ratio that fits `available`,
/// centered.
pub fn fit_rect(tex_size: egui::Vec2, available: egui::Rect) -> egui::Rect {
    if tex_size.x <= 0.0 || tex_size.y <= 0.0 {
        return available;
    }
    let scale = (available.width() / tex_size.x).min(available.height() / tex_size.y);
    egui::Rect::from_center_size(available.center(), tex_size * scale)
}

/// Paint the slide's gradient as a vertex-colored grid.
pub fn draw_background(ui: &egui::Ui, gradient: &Gradient, rect: egui::Rect, opacity: f32) {
    let mut mesh = egui::Mesh::default();
    let (w, h) = (rect.width(), rect.height());
    for row in 0..=GRID_ROWS {
        for col in 0..=GRID_COLS {
            let x = w * col as f32 / GRID_COLS as f32;
            let y = h * row as f32 / GRID_ROWS as f32;
            let color: Color32 = gradient.sample(gradient.position(x, y, w, h)).into();
            mesh.colored_vertex(
                egui::pos2(rect.left() + x, rect.top() + y),
                Theme::with_opacity(color, opacity),
            );
        }
    }
    let stride = (GRID_COLS + 1) as u32;
    for row in 0..GRID_ROWS as u32 {
        for col in 0..GRID_COLS as u32 {
            let tl = row * stride + col;
            let tr = tl + 1;
            let bl = tl + stride;
            let br = bl + 1;
            mesh.add_triangle(tl, bl, tr);
            mesh.add_triangle(tr, bl, br);
        }
    }
    ui.painter().add(egui::Shape::mesh(mesh));
}

/// Render one slide. Returns the path of a video the user clicked.
#[allow(clippy::too_many_arguments)]
pub fn render_slide(
    ui: &egui::Ui,
    view: &SlideView,
    flags: SlideFlags,
    reveal: &RevealState,
    theme: &Theme,
    rect: egui::Rect,
    image_cache: &ImageCache,
    now: Millis,
    scale: f32,
) -> Option<PathBuf> {
    let (slide_opacity, shift) = slide_motion(flags, now);
    if slide_opacity <= 0.0 {
        return None;
    }
    draw_background(ui, &view.background, rect, slide_opacity);

    let padding = 80.0 * scale;
    let inner = rect
        .shrink(padding)
        .translate(egui::vec2(shift * scale, 0.0));
    let (content_rect, image_rect) = if view.image.is_some() {
        let split = inner.left() + inner.width() * 0.56;
        (
            egui::Rect::from_min_max(inner.left_top(), egui::pos2(split, inner.bottom())),
            Some(egui::Rect::from_min_max(
                egui::pos2(split + 40.0 * scale, inner.top()),
                inner.right_bottom(),
            )),
        )
    } else {
        (inner, None)
    };

    let mut clicked = None;
    let mut y = content_rect.top();
    for (i, element) in view.content.iter().enumerate() {
        let (opacity, rise) = element_motion(element, view.index, reveal, now);
        let opacity = opacity * slide_opacity;
        let pos = egui::pos2(content_rect.left(), y + rise * scale);
        let width = content_rect.width();

        let used = match &element.node {
            Node::Text { role, inlines } => {
                let (size, alpha) = match role {
                    TextRole::Title => (theme.title_size, 1.0),
                    TextRole::Subtitle => (theme.subtitle_size, 0.85),
                    TextRole::Body => (theme.body_size, 0.95),
                };
                let color = Theme::with_opacity(Theme::ink(view.contrast), opacity * alpha);
                let h = text::draw_inlines(ui, inlines, pos, size * scale, color, width);
                if h > 0.0 {
                    egui::Rect::from_min_size(pos, egui::vec2(width, h + 20.0 * scale))
                } else {
                    egui::Rect::from_min_size(pos, egui::Vec2::ZERO)
                }
            }
            Node::Point { inlines } => {
                let h = text::draw_point(
                    ui,
                    inlines,
                    view.contrast,
                    pos,
                    width,
                    theme.point_size * scale,
                    opacity,
                    scale,
                );
                egui::Rect::from_min_size(pos, egui::vec2(width, h + 12.0 * scale))
            }
            Node::Image { src, alt, fallback } => {
                let available =
                    egui::Rect::from_min_size(pos, egui::vec2(width, 260.0 * scale));
                let drawn = draw_image(
                    ui,
                    image_cache,
                    src,
                    fallback.as_deref(),
                    alt,
                    view.contrast,
                    available,
                    opacity,
                    scale,
                );
                pulse_ring(ui, element, view.index, reveal, drawn, theme, now, scale);
                available.expand2(egui::vec2(0.0, 10.0 * scale))
            }
            Node::Video { src } => {
                let card = egui::Rect::from_min_size(
                    pos,
                    egui::vec2(width.min(420.0 * scale), 236.0 * scale),
                );
                let response = ui.interact(
                    card,
                    ui.id().with(("video", view.index, i)),
                    egui::Sense::click(),
                );
                let name = src
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                text::draw_video_card(
                    ui,
                    &name,
                    view.contrast,
                    card,
                    opacity,
                    response.hovered(),
                    scale,
                );
                pulse_ring(ui, element, view.index, reveal, card, theme, now, scale);
                if response.clicked() && opacity > 0.5 {
                    clicked = Some(src.clone());
                }
                card.expand2(egui::vec2(0.0, 10.0 * scale))
            }
        };
        y += used.height();
    }

    if let (Some(element), Some(area)) = (view.image.as_ref(), image_rect) {
        let Node::Image { src, alt, fallback } = &element.node else {
            return clicked;
        };
        let (opacity, rise) = element_motion(element, view.index, reveal, now);
        let area = area.translate(egui::vec2(0.0, rise * scale));
        draw_image(
            ui,
            image_cache,
            src,
            fallback.as_deref(),
            alt,
            view.contrast,
            area,
            opacity * slide_opacity,
            scale,
        );
    }

    clicked
}

/// Draw an image fitted into `available`, falling back to `fallback` and
/// then to a drawn card. Returns the drawn rect.
#[allow(clippy::too_many_arguments)]
fn draw_image(
    ui: &egui::Ui,
    image_cache: &ImageCache,
    src: &Path,
    fallback: Option<&Path>,
    alt: &str,
    contrast: Contrast,
    available: egui::Rect,
    opacity: f32,
    scale: f32,
) -> egui::Rect {
    match image_cache.get_with_fallback(ui.ctx(), src, fallback) {
        Some(texture) => {
            let draw_rect = fit_rect(texture.size_vec2(), available);
            let alpha = (opacity.clamp(0.0, 1.0) * 255.0) as u8;
            let tint = Color32::from_rgba_unmultiplied(255, 255, 255, alpha);
            let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
            ui.painter().image(texture.id(), draw_rect, uv, tint);
            draw_rect
        }
        None => {
            text::draw_image_placeholder(ui, alt, contrast, available, opacity, scale);
            available
        }
    }
}

/// Accent ring around a media element while its pulse flag is set.
#[allow(clippy::too_many_arguments)]
fn pulse_ring(
    ui: &egui::Ui,
    element: &Element,
    slide: usize,
    reveal: &RevealState,
    rect: egui::Rect,
    theme: &Theme,
    now: Millis,
    scale: f32,
) {
    let Some(slot) = element.stagger else {
        return;
    };
    if !element.media || !reveal.is_pulsing(slide, slot) {
        return;
    }
    let phase = (now % PULSE_PERIOD_MS) as f32 / PULSE_PERIOD_MS as f32;
    let wave = (phase * std::f32::consts::TAU).sin() * 0.5 + 0.5;
    let color = Theme::with_opacity(theme.accent, 0.35 + 0.5 * wave);
    ui.painter().rect_stroke(
        rect.expand((4.0 + 8.0 * wave) * scale),
        14.0 * scale,
        Stroke::new(3.0 * scale, color),
        egui::StrokeKind::Outside,
    );
}
