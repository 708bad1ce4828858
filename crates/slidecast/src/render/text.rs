use crate::color::Contrast;
use crate::deck::Inline;
use crate::theme::Theme;
use eframe::egui::{self, Color32, FontFamily, FontId, Pos2, Stroke};

/// Create a LayoutJob from inline elements.
pub fn inlines_to_job(
    inlines: &[Inline],
    font_size: f32,
    color: Color32,
    max_width: f32,
) -> egui::text::LayoutJob {
    let mut job = egui::text::LayoutJob::default();
    job.wrap.max_width = max_width;
    append_inlines(&mut job, inlines, font_size, color, false, false);
    job
}

fn append_inlines(
    job: &mut egui::text::LayoutJob,
    inlines: &[Inline],
    font_size: f32,
    color: Color32,
    bold: bool,
    italic: bool,
) {
    for inline in inlines {
        match inline {
            Inline::Text(s) => {
                let size = if bold { font_size + 1.0 } else { font_size };
                let format = egui::text::TextFormat {
                    font_id: FontId::new(size, FontFamily::Proportional),
                    color,
                    italics: italic,
                    ..Default::default()
                };
                job.append(s, 0.0, format);
            }
            Inline::Bold(children) => {
                append_inlines(job, children, font_size, color, true, italic);
            }
            Inline::Italic(children) => {
                append_inlines(job, children, font_size, color, bold, true);
            }
            Inline::LineBreak => {
                let format = egui::text::TextFormat {
                    font_id: FontId::new(font_size, FontFamily::Proportional),
                    color,
                    ..Default::default()
                };
                job.append("\n", 0.0, format);
            }
        }
    }
}

/// Layout and paint inlines, returning the height used.
pub fn draw_inlines(
    ui: &egui::Ui,
    inlines: &[Inline],
    pos: Pos2,
    font_size: f32,
    color: Color32,
    max_width: f32,
) -> f32 {
    if inlines.is_empty() {
        return 0.0;
    }
    let job = inlines_to_job(inlines, font_size, color, max_width);
    let galley = ui.painter().layout_job(job);
    let height = galley.rect.height();
    ui.painter().galley(pos, galley, color);
    height
}

/// Draw one bullet point on a translucent backdrop. Returns height used.
#[allow(clippy::too_many_arguments)]
pub fn draw_point(
    ui: &egui::Ui,
    inlines: &[Inline],
    contrast: Contrast,
    pos: Pos2,
    max_width: f32,
    font_size: f32,
    opacity: f32,
    scale: f32,
) -> f32 {
    let ink = Theme::with_opacity(Theme::ink(contrast), opacity);
    let pad = 14.0 * scale;
    let marker_width = 36.0 * scale;
    let text_width = (max_width - marker_width - pad * 2.0).max(1.0);

    let job = inlines_to_job(inlines, font_size, ink, text_width);
    let galley = ui.painter().layout_job(job);
    let height = galley.rect.height() + pad * 2.0;

    let backdrop = Theme::backdrop(contrast).gamma_multiply(opacity);
    let rect = egui::Rect::from_min_size(pos, egui::vec2(max_width, height));
    ui.painter().rect_filled(rect, 10.0 * scale, backdrop);

    let marker = ui.painter().layout_no_wrap(
        "\u{2022}".to_string(),
        FontId::proportional(font_size),
        ink,
    );
    ui.painter()
        .galley(Pos2::new(pos.x + pad, pos.y + pad), marker, ink);
    ui.painter()
        .galley(Pos2::new(pos.x + pad + marker_width, pos.y + pad), galley, ink);
    height
}

/// A drawn card standing in for an image that could not be loaded.
pub fn draw_image_placeholder(
    ui: &egui::Ui,
    alt: &str,
    contrast: Contrast,
    rect: egui::Rect,
    opacity: f32,
    scale: f32,
) {
    let ink = Theme::ink(contrast);
    let bg = Theme::backdrop(contrast).gamma_multiply(opacity);
    let color = Theme::with_opacity(ink, opacity * 0.6);

    ui.painter().rect_filled(rect, 8.0 * scale, bg);
    ui.painter().rect_stroke(
        rect,
        8.0 * scale,
        Stroke::new(1.0, color),
        egui::StrokeKind::Outside,
    );

    let label = if alt.is_empty() {
        "[Image]".to_string()
    } else {
        format!("[Image: {alt}]")
    };
    let galley = ui.painter().layout(
        label,
        FontId::proportional(28.0 * scale),
        color,
        rect.width(),
    );
    let text_pos = Pos2::new(
        rect.center().x - galley.rect.width() / 2.0,
        rect.center().y - galley.rect.height() / 2.0,
    );
    ui.painter().galley(text_pos, galley, color);
}

/// Poster card for a video: a play symbol over the file name.
pub fn draw_video_card(
    ui: &egui::Ui,
    name: &str,
    contrast: Contrast,
    rect: egui::Rect,
    opacity: f32,
    hovered: bool,
    scale: f32,
) {
    let ink = Theme::ink(contrast);
    let shade = if hovered { 0.55 } else { 0.4 };
    let fill = Theme::with_opacity(Color32::BLACK, shade * opacity);
    let color = Theme::with_opacity(ink, opacity * 0.85);
    ui.painter().rect_filled(rect, 12.0 * scale, fill);

    let r = (rect.height() * 0.18).min(48.0 * scale);
    let c = rect.center() - egui::vec2(0.0, r * 0.4);
    ui.painter().circle_stroke(c, r, Stroke::new(3.0 * scale, color));
    let tri = vec![
        Pos2::new(c.x - r * 0.35, c.y - r * 0.5),
        Pos2::new(c.x + r * 0.55, c.y),
        Pos2::new(c.x - r * 0.35, c.y + r * 0.5),
    ];
    ui.painter()
        .add(egui::Shape::convex_polygon(tri, color, Stroke::NONE));

    let galley = ui.painter().layout_no_wrap(
        name.to_string(),
        FontId::proportional(22.0 * scale),
        color,
    );
    let pos = Pos2::new(
        rect.center().x - galley.rect.width() / 2.0,
        c.y + r + 12.0 * scale,
    );
    ui.painter().galley(pos, galley, color);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_flattens_styles() {
        let inlines = vec![
            Inline::Text("Plain ".into()),
            Inline::Bold(vec![Inline::Italic(vec![Inline::Text("both".into())])]),
            Inline::LineBreak,
            Inline::Text("next".into()),
        ];
        let job = inlines_to_job(&inlines, 20.0, Color32::WHITE, 500.0);
        assert_eq!(job.text, "Plain both\nnext");
        assert_eq!(job.sections.len(), 4);
        assert!(!job.sections[0].format.italics);
        assert!(job.sections[1].format.italics);
        assert_eq!(job.sections[1].format.font_id.size, 21.0);
        assert_eq!(job.wrap.max_width, 500.0);
    }

    #[test]
    fn test_empty_job() {
        let job = inlines_to_job(&[], 20.0, Color32::WHITE, 100.0);
        assert!(job.text.is_empty());
    }
}
