use eframe::egui::{self, Color32};

use crate::color::{Contrast, Rgb};

/// Colors and type sizes for the presenter chrome and slide text. Sizes are
/// in reference pixels at 1920x1080 and scaled at draw time.
#[derive(Debug, Clone)]
pub struct Theme {
    pub dark: bool,
    pub background: Color32,
    pub foreground: Color32,
    pub accent: Color32,
    pub panel_background: Color32,
    pub muted: Color32,
    pub title_size: f32,
    pub subtitle_size: f32,
    pub body_size: f32,
    pub point_size: f32,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            dark: true,
            background: Color32::from_rgb(0x0B, 0x0B, 0x16),
            foreground: Color32::from_rgb(0xE6, 0xE6, 0xF0),
            accent: Color32::from_rgb(0xE9, 0x45, 0x60),
            panel_background: Color32::from_rgb(0x16, 0x16, 0x2A),
            muted: Color32::from_rgb(0x8A, 0x8A, 0xA3),
            title_size: 84.0,
            subtitle_size: 48.0,
            body_size: 36.0,
            point_size: 34.0,
        }
    }

    pub fn light() -> Self {
        Self {
            dark: false,
            background: Color32::from_rgb(0xF4, 0xF1, 0xEE),
            foreground: Color32::from_rgb(0x1A, 0x1A, 0x2E),
            accent: Color32::from_rgb(0x0F, 0x34, 0x60),
            panel_background: Color32::WHITE,
            muted: Color32::from_rgb(0x5C, 0x5C, 0x70),
            title_size: 84.0,
            subtitle_size: 48.0,
            body_size: 36.0,
            point_size: 34.0,
        }
    }

    pub fn from_dark_flag(dark: bool) -> Self {
        if dark { Self::dark() } else { Self::light() }
    }

    pub fn is_dark(&self) -> bool {
        self.dark
    }

    /// egui visuals for panels and widgets around the slide.
    pub fn visuals(&self) -> egui::Visuals {
        let mut visuals = if self.is_dark() {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        visuals.panel_fill = self.panel_background;
        visuals.window_fill = self.panel_background;
        visuals.selection.bg_fill = self.accent;
        visuals
    }

    /// Apply opacity to a color
    pub fn with_opacity(color: Color32, opacity: f32) -> Color32 {
        Color32::from_rgba_unmultiplied(
            color.r(),
            color.g(),
            color.b(),
            (opacity.clamp(0.0, 1.0) * 255.0) as u8,
        )
    }

    /// Ink for text drawn directly on a slide background.
    pub fn ink(contrast: Contrast) -> Color32 {
        match contrast {
            Contrast::LightBackground => Color32::from_rgb(0x1A, 0x1A, 0x2E),
            Contrast::DarkBackground => Color32::from_rgb(0xF8, 0xF8, 0xFF),
        }
    }

    /// Translucent panel placed behind bullet text so it stays readable over
    /// the gradient's accent end.
    pub fn backdrop(contrast: Contrast) -> Color32 {
        match contrast {
            Contrast::LightBackground => Color32::from_rgba_unmultiplied(255, 255, 255, 140),
            Contrast::DarkBackground => Color32::from_rgba_unmultiplied(0, 0, 0, 90),
        }
    }
}

impl From<Rgb> for Color32 {
    fn from(rgb: Rgb) -> Self {
        Color32::from_rgb(rgb.r, rgb.g, rgb.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dark_flag_selects_theme() {
        assert!(Theme::from_dark_flag(true).is_dark());
        assert!(!Theme::from_dark_flag(false).is_dark());
    }

    #[test]
    fn test_visuals_follow_theme_flag() {
        let mut theme = Theme::light();
        assert!(!theme.visuals().dark_mode);
        theme.dark = true;
        assert!(theme.visuals().dark_mode);
        assert_eq!(theme.visuals().panel_fill, Color32::WHITE);
    }

    #[test]
    fn test_ink_contrasts_with_background() {
        let on_light = Theme::ink(Contrast::LightBackground);
        let on_dark = Theme::ink(Contrast::DarkBackground);
        assert!(on_light.r() < 0x80);
        assert!(on_dark.r() > 0x80);
    }

    #[test]
    fn test_with_opacity_clamps() {
        assert_eq!(Theme::with_opacity(Color32::WHITE, 2.0).a(), 255);
        assert_eq!(Theme::with_opacity(Color32::WHITE, -1.0).a(), 0);
    }
}
