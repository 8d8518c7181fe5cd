use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Mix, Srgb};

// ---------------------------------------------------------------------------
// Categorical palette (pie sectors)
// ---------------------------------------------------------------------------

fn to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| to_color32(Hsl::new(i as f32 / n as f32 * 360.0, 0.75, 0.55)))
        .collect()
}

// ---------------------------------------------------------------------------
// Continuous scale (scatter colour = count)
// ---------------------------------------------------------------------------

/// Maps a numeric range onto a dark-blue → yellow gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScale {
    min: f64,
    max: f64,
}

impl ColorScale {
    const LOW: (f32, f32, f32) = (250.0, 0.65, 0.30);
    const HIGH: (f32, f32, f32) = (55.0, 0.95, 0.55);

    /// Scale spanning `values`; an empty slice gives `[0, 1]`.
    pub fn from_values(values: &[f64]) -> Self {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if min.is_finite() && max.is_finite() {
            ColorScale { min, max }
        } else {
            ColorScale { min: 0.0, max: 1.0 }
        }
    }

    /// Position of `value` in the range, clamped to `[0, 1]`.
    pub fn fraction(&self, value: f64) -> f32 {
        let span = self.max - self.min;
        if span.abs() < f64::EPSILON {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0) as f32
    }

    pub fn color_for(&self, value: f64) -> Color32 {
        let (h0, s0, l0) = Self::LOW;
        let (h1, s1, l1) = Self::HIGH;
        let low: Hsl = Hsl::new(h0, s0, l0);
        let high: Hsl = Hsl::new(h1, s1, l1);
        to_color32(low.mix(high, self.fraction(value)))
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
