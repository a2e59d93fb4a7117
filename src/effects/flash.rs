use crate::composer::{self, Pixel, PixelComposer};

/// Rises linearly from 0 to 1 at the halfway point and falls back to 0.
pub fn intensity(fraction: f32) -> f32 {
    2.0 * fraction.min(1.0 - fraction).max(0.0)
}

pub fn render(composer: &mut PixelComposer, color: Pixel, fraction: f32) {
    composer.add_const(composer::scale(color, intensity(fraction)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nearly_equal(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn peaks_in_the_middle() {
        assert_eq!(intensity(0.0), 0.0);
        assert!(nearly_equal(intensity(0.5), 1.0));
        assert!(nearly_equal(intensity(1.0), 0.0));
        assert!(nearly_equal(intensity(0.25), 0.5));
    }

    #[test]
    fn symmetric_around_midpoint() {
        for step in 0..=50 {
            let p = step as f32 / 100.0;
            assert!(nearly_equal(intensity(p), intensity(1.0 - p)), "p = {p}");
        }
    }

    #[test]
    fn never_negative_past_the_end() {
        assert_eq!(intensity(1.2), 0.0);
    }
}
