use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Series palette
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues,
/// starting at `start_hue` degrees.
pub fn generate_palette(n: usize, start_hue: f32) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (start_hue + (i as f32 / n as f32) * 360.0) % 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.5);
            let rgb: Srgb = hsl.into_color();
            to_color32(rgb)
        })
        .collect()
}

/// Blue and red for the first two trend lines, then evenly spaced hues.
pub fn trend_colors(n: usize) -> Vec<Color32> {
    const FIXED: [Color32; 2] = [
        Color32::from_rgb(31, 119, 180),
        Color32::from_rgb(214, 39, 40),
    ];
    let mut colours: Vec<Color32> = FIXED.iter().copied().take(n).collect();
    colours.extend(generate_palette(n.saturating_sub(FIXED.len()), 120.0));
    colours
}

fn to_color32(rgb: Srgb) -> Color32 {
    let rgb: Srgb<u8> = rgb.into_format();
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

// ---------------------------------------------------------------------------
// Diverging colour map for correlation coefficients
// ---------------------------------------------------------------------------

/// Blue → neutral → red map over `[-1, 1]`, in the spirit of "coolwarm".
#[derive(Debug, Clone, Copy)]
pub struct DivergingMap {
    cold: LinSrgb,
    neutral: LinSrgb,
    warm: LinSrgb,
}

impl Default for DivergingMap {
    fn default() -> Self {
        let lin = |r: u8, g: u8, b: u8| Srgb::new(r, g, b).into_format::<f32>().into_linear();
        DivergingMap {
            cold: lin(59, 76, 192),
            neutral: lin(221, 221, 221),
            warm: lin(180, 4, 38),
        }
    }
}

impl DivergingMap {
    /// Colour for `value`, clamped to `[-1, 1]`. NaN maps to gray.
    pub fn color_for(&self, value: f64) -> Color32 {
        if value.is_nan() {
            return Color32::GRAY;
        }
        let t = value.clamp(-1.0, 1.0) as f32;
        let mixed = if t < 0.0 {
            self.neutral.mix(self.cold, -t)
        } else {
            self.neutral.mix(self.warm, t)
        };
        to_color32(Srgb::from_linear(mixed))
    }

    /// Black or white, whichever reads better on `background`.
    pub fn text_color_on(background: Color32) -> Color32 {
        let luma = 0.299 * background.r() as f32
            + 0.587 * background.g() as f32
            + 0.114 * background.b() as f32;
        if luma > 140.0 {
            Color32::BLACK
        } else {
            Color32::WHITE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size_and_distinct_colours() {
        let colours = generate_palette(4, 220.0);
        assert_eq!(colours.len(), 4);
        for (i, a) in colours.iter().enumerate() {
            for b in &colours[i + 1..] {
                assert_ne!(a, b);
            }
        }
        assert!(generate_palette(0, 0.0).is_empty());
    }

    #[test]
    fn trend_lines_start_blue_then_red() {
        let colours = trend_colors(3);
        assert_eq!(colours.len(), 3);
        assert!(colours[0].b() > colours[0].r());
        assert!(colours[1].r() > colours[1].b());
        assert_eq!(trend_colors(1), vec![colours[0]]);
    }

    #[test]
    fn diverging_map_hits_endpoints() {
        let map = DivergingMap::default();
        assert_eq!(map.color_for(-1.0), Color32::from_rgb(59, 76, 192));
        assert_eq!(map.color_for(0.0), Color32::from_rgb(221, 221, 221));
        assert_eq!(map.color_for(1.0), Color32::from_rgb(180, 4, 38));
        assert_eq!(map.color_for(3.0), map.color_for(1.0));
        assert_eq!(map.color_for(f64::NAN), Color32::GRAY);
    }

    #[test]
    fn positive_values_lean_red() {
        let c = DivergingMap::default().color_for(0.6);
        assert!(c.r() > c.b());
    }
}
