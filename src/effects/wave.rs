use std::f32::consts::PI;

use crate::composer::{self, Pixel, PixelComposer};

/// Amplitude of a travelling sine at `pos`, clipped at 0 so the dark half of
/// the wave adds nothing.
pub fn amplitude(pos: f32, length: f32, freq: f32, seconds: f32) -> f32 {
    let phase = 2.0 * PI * freq * (pos / length);
    (2.0 * PI * freq * seconds - phase).sin().max(0.0)
}

/// Half-sine window `length` pixels wide. Its leading edge moves from pixel 0
/// to past the end of the strip as `sweep` goes from 0 to 1.
pub fn window(pos: f32, length: f32, pixel_count: usize, sweep: f32) -> f32 {
    let leading_edge = sweep * (pixel_count as f32 + length);
    let offset = leading_edge - pos;
    if offset <= 0.0 || offset > length {
        return 0.0;
    }
    (PI * offset / length).sin()
}

/// Renders a wave across the whole strip, or a wavelet when `sweep` is set.
pub fn render(
    composer: &mut PixelComposer,
    color: Pixel,
    length: f32,
    freq: f32,
    seconds: f32,
    sweep: Option<f32>,
) {
    let length = length.max(1.0);
    let pixel_count = composer.len();

    for index in 0..pixel_count {
        let pos = index as f32;
        let mut level = amplitude(pos, length, freq, seconds);
        if let Some(sweep) = sweep {
            level *= window(pos, length, pixel_count, sweep);
        }
        if level > 0.0 {
            composer.add(index, composer::scale(color, level));
        }
    }
}
