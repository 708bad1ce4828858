use anyhow::{Result, bail};

/// Base colors cycled across slides, indexed by `slide_index % PALETTE.len()`.
pub const PALETTE: [&str; 17] = [
    "#1a1a2e", "#0f3460", "#16213e", "#e94560", "#16213e", "#0f3460", "#e94560", "#f2e9e4",
    "#0f3460", "#e94560", "#1a1a2e", "#f2e9e4", "#0f3460", "#e94560", "#16213e", "#0f3460",
    "#f2e9e4",
];

/// Accent every slide gradient blends into.
pub const ACCENT: &str = "#e94560";

const GRADIENT_ANGLE: f32 = 120.0;
const BASE_STOP: f32 = 0.55;
const LIGHT_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb`, `rrggbb` or the `#rgb` shorthand.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            bail!("Invalid hex color: {hex}");
        }
        let expanded: String = match digits.len() {
            6 => digits.to_string(),
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            _ => bail!("Invalid hex color: {hex}"),
        };
        let value = u32::from_str_radix(&expanded, 16)?;
        Ok(Self {
            r: ((value >> 16) & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: (value & 0xFF) as u8,
        })
    }

    /// Linear blend towards `other`, `t` in [0, 1].
    pub fn lerp(self, other: Rgb, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgb::new(
            mix(self.r, other.r),
            mix(self.g, other.g),
            mix(self.b, other.b),
        )
    }
}

fn linearize(channel: u8) -> f64 {
    let v = channel as f64 / 255.0;
    if v <= 0.03928 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// WCAG relative luminance in [0, 1].
pub fn relative_luminance(color: Rgb) -> f64 {
    0.2126 * linearize(color.r) + 0.7152 * linearize(color.g) + 0.0722 * linearize(color.b)
}

/// Whether text over `hex` should be dark. Malformed input counts as dark.
pub fn is_color_light(hex: &str) -> bool {
    match Rgb::from_hex(hex) {
        Ok(rgb) => relative_luminance(rgb) > LIGHT_THRESHOLD,
        Err(_) => false,
    }
}

/// Which kind of background a slide sits on, used to pick the ink color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contrast {
    LightBackground,
    DarkBackground,
}

impl Contrast {
    pub fn for_background(hex: &str) -> Self {
        if is_color_light(hex) {
            Contrast::LightBackground
        } else {
            Contrast::DarkBackground
        }
    }
}

/// A two-stop linear gradient: solid `base` up to `base_stop`, then blending
/// into `accent` at the far edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    pub angle_deg: f32,
    pub base: Rgb,
    pub accent: Rgb,
    pub base_stop: f32,
}

impl Gradient {
    /// Color at normalized position `t` along the gradient line.
    pub fn sample(&self, t: f32) -> Rgb {
        if t <= self.base_stop {
            self.base
        } else {
            let span = (1.0 - self.base_stop).max(f32::EPSILON);
            self.base.lerp(self.accent, (t - self.base_stop) / span)
        }
    }

    /// Project a point in a `width` x `height` box onto the gradient line,
    /// following CSS `linear-gradient` angle semantics (0deg points up,
    /// angles grow clockwise).
    pub fn position(&self, x: f32, y: f32, width: f32, height: f32) -> f32 {
        let rad = self.angle_deg.to_radians();
        let (dx, dy) = (rad.sin(), -rad.cos());
        let half_len = (width * dx.abs() + height * dy.abs()) / 2.0;
        if half_len <= f32::EPSILON {
            return 0.0;
        }
        let cx = x - width / 2.0;
        let cy = y - height / 2.0;
        ((cx * dx + cy * dy) / half_len + 1.0) / 2.0
    }
}

pub fn palette_hex(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Background gradient for the slide at `index`.
pub fn slide_background(index: usize) -> Gradient {
    let fallback = Rgb::new(0x1a, 0x1a, 0x2e);
    Gradient {
        angle_deg: GRADIENT_ANGLE,
        base: Rgb::from_hex(palette_hex(index)).unwrap_or(fallback),
        accent: Rgb::from_hex(ACCENT).unwrap_or(fallback),
        base_stop: BASE_STOP,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_white_is_light_black_is_dark() {
        assert!(is_color_light("#ffffff"));
        assert!(!is_color_light("#000000"));
    }

    #[test]
    fn test_malformed_defaults_to_dark() {
        assert!(!is_color_light("not a color"));
        assert!(!is_color_light("#12345"));
        assert!(!is_color_light(""));
        assert!(!is_color_light("#gggggg"));
    }

    #[test]
    fn test_shorthand_and_missing_hash() {
        assert_eq!(Rgb::from_hex("#fff").unwrap(), Rgb::new(255, 255, 255));
        assert_eq!(Rgb::from_hex("e94560").unwrap(), Rgb::new(0xe9, 0x45, 0x60));
    }

    #[test]
    fn test_luminance_bounds() {
        for hex in PALETTE {
            let lum = relative_luminance(Rgb::from_hex(hex).unwrap());
            assert!((0.0..=1.0).contains(&lum), "{hex} -> {lum}");
        }
        assert!((relative_luminance(Rgb::new(255, 255, 255)) - 1.0).abs() < 1e-9);
        assert_eq!(relative_luminance(Rgb::new(0, 0, 0)), 0.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        // Mid gray sits well below 0.5 luminance despite being 50% brightness.
        assert!(!is_color_light("#808080"));
        assert!(is_color_light("#f2e9e4"));
        assert!(!is_color_light("#e94560"));
    }

    #[test]
    fn test_palette_contrast() {
        assert_eq!(Contrast::for_background(palette_hex(0)), Contrast::DarkBackground);
        assert_eq!(Contrast::for_background(palette_hex(7)), Contrast::LightBackground);
        // Wraps around the palette.
        assert_eq!(palette_hex(17), palette_hex(0));
        assert_eq!(palette_hex(24), palette_hex(7));
    }

    #[test]
    fn test_gradient_stops() {
        let g = slide_background(0);
        assert_eq!(g.sample(0.0), g.base);
        assert_eq!(g.sample(0.55), g.base);
        assert_eq!(g.sample(1.0), Rgb::from_hex(ACCENT).unwrap());
    }

    #[test]
    fn test_gradient_position_corners() {
        let g = slide_background(3);
        // 120deg runs from the top-left towards the bottom-right.
        let start = g.position(0.0, 0.0, 1600.0, 900.0);
        let end = g.position(1600.0, 900.0, 1600.0, 900.0);
        assert!(start.abs() < 1e-4, "start {start}");
        assert!((end - 1.0).abs() < 1e-4, "end {end}");
    }
}
