//! Presenter chrome around the slide: progress bar, control bar, thumbnail
//! index, speaker notes and the introduction overlay.

use eframe::egui::{self, Color32, RichText, Stroke};

use crate::color::{self, Contrast};
use crate::navigation::Navigator;
use crate::prefs::IntroOverlay;
use crate::schedule::Millis;
use crate::session::Session;
use crate::theme::Theme;

const THUMBNAIL_PANEL_WIDTH: f32 = 210.0;
const NOTES_PANEL_WIDTH: f32 = 340.0;

/// Something the presenter asked for through the chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Previous,
    Next,
    JumpTo(usize),
    ToggleFullscreen,
    ToggleTheme,
    ToggleNarration,
    ToggleNotes,
    DismissIntro,
}

/// Thin accent bar along the top edge, `percent` of the way across.
pub fn draw_progress(ui: &egui::Ui, rect: egui::Rect, percent: f32, theme: &Theme) {
    let height = 6.0;
    let track = egui::Rect::from_min_size(rect.left_top(), egui::vec2(rect.width(), height));
    ui.painter()
        .rect_filled(track, 0.0, Theme::with_opacity(theme.muted, 0.25));
    let fill = egui::Rect::from_min_size(
        rect.left_top(),
        egui::vec2(rect.width() * (percent / 100.0).clamp(0.0, 1.0), height),
    );
    ui.painter().rect_filled(fill, 0.0, theme.accent);
}

pub fn control_bar(
    ctx: &egui::Context,
    session: &Session,
    fullscreen: bool,
    theme: &Theme,
    actions: &mut Vec<UiAction>,
) {
    let nav = session.nav();
    egui::TopBottomPanel::bottom("controls")
        .resizable(false)
        .frame(egui::Frame::new().fill(theme.panel_background).inner_margin(10.0))
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(nav.prev_enabled(), egui::Button::new("\u{25C0} Prev"))
                    .clicked()
                {
                    actions.push(UiAction::Previous);
                }
                ui.label(
                    RichText::new(nav.counter_text())
                        .monospace()
                        .color(theme.foreground),
                );
                if ui
                    .add_enabled(nav.next_enabled(), egui::Button::new("Next \u{25B6}"))
                    .clicked()
                {
                    actions.push(UiAction::Next);
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let label = if fullscreen { "Exit fullscreen" } else { "Fullscreen" };
                    if ui.button(label).clicked() {
                        actions.push(UiAction::ToggleFullscreen);
                    }
                    let theme_label = if theme.is_dark() { "Light theme" } else { "Dark theme" };
                    if ui.button(theme_label).clicked() {
                        actions.push(UiAction::ToggleTheme);
                    }
                    let speaking = session.prefs().speak_enabled();
                    if ui
                        .add(egui::Button::new("Narration").selected(speaking))
                        .clicked()
                    {
                        actions.push(UiAction::ToggleNarration);
                    }
                    if ui
                        .add(egui::Button::new("Notes").selected(session.panels().notes))
                        .clicked()
                    {
                        actions.push(UiAction::ToggleNotes);
                    }
                });
            });
        });
}

/// One button per slide, tinted with the slide's base color.
pub fn thumbnail_panel(
    ctx: &egui::Context,
    nav: &Navigator,
    theme: &Theme,
    actions: &mut Vec<UiAction>,
) {
    egui::SidePanel::left("thumbnails")
        .exact_width(THUMBNAIL_PANEL_WIDTH)
        .resizable(false)
        .frame(egui::Frame::new().fill(theme.panel_background).inner_margin(10.0))
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                for thumb in nav.thumbnails() {
                    let base = color::palette_hex(thumb.index);
                    let fill: Color32 = color::slide_background(thumb.index).base.into();
                    let ink = Theme::ink(Contrast::for_background(base));
                    let stroke = if thumb.is_active(nav.current()) {
                        Stroke::new(3.0, theme.accent)
                    } else {
                        Stroke::NONE
                    };
                    let button = egui::Button::new(
                        RichText::new(format!("{}  {}", thumb.number, thumb.label)).color(ink),
                    )
                    .fill(fill)
                    .stroke(stroke)
                    .min_size(egui::vec2(ui.available_width(), 44.0));
                    if ui.add(button).clicked() {
                        actions.push(UiAction::JumpTo(thumb.index));
                    }
                    ui.add_space(4.0);
                }
            });
        });
}

pub fn notes_panel(ctx: &egui::Context, session: &Session, now: Millis, theme: &Theme) {
    let nav = session.nav();
    egui::SidePanel::right("notes")
        .exact_width(NOTES_PANEL_WIDTH)
        .resizable(false)
        .frame(egui::Frame::new().fill(theme.panel_background).inner_margin(14.0))
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("Speaker notes").strong().color(theme.foreground));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        RichText::new(session.clock().format(now))
                            .monospace()
                            .color(theme.accent),
                    );
                });
            });
            ui.label(
                RichText::new(format!(
                    "This slide viewed {} time(s), {} views in total",
                    session.stats().views_of(nav.current()),
                    session.stats().total()
                ))
                .small()
                .color(theme.muted),
            );
            ui.separator();
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.label(
                    RichText::new(nav.notes_text())
                        .size(18.0)
                        .color(theme.foreground),
                );
            });
        });
}

pub fn intro_window(
    ctx: &egui::Context,
    intro: &mut IntroOverlay,
    theme: &Theme,
    actions: &mut Vec<UiAction>,
) {
    if !intro.is_open() {
        return;
    }
    egui::Window::new("Welcome")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .frame(egui::Frame::window(&ctx.style()).fill(theme.panel_background))
        .show(ctx, |ui| {
            ui.label(RichText::new("Navigating this presentation").strong().size(20.0));
            ui.add_space(8.0);
            for (keys, what) in [
                ("\u{2192} / \u{2190}", "Next / previous slide"),
                ("F", "Toggle fullscreen"),
                ("T", "Show slide thumbnails"),
                ("Q", "Quit"),
            ] {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(keys).monospace().color(theme.accent));
                    ui.label(what);
                });
            }
            ui.add_space(8.0);
            ui.checkbox(&mut intro.dont_show_again, "Don't show this again");
            ui.add_space(8.0);
            if ui.button("Get started").clicked() {
                actions.push(UiAction::DismissIntro);
            }
        });
}
