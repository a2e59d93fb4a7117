use std::fmt;

use palette::{Mix, Srgb};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::composer::{Pixel, PixelComposer};

pub const DEFAULT_COOLING: u32 = 55;
pub const MAX_COOLING: u32 = 255;
const SPARKING: u8 = 120;
const SPARK_CELLS: usize = 7;

/// Fire simulation over the first `heat.len()` pixels of the strip. Heat
/// rises towards higher indices.
pub struct Flame {
    heat: Vec<u8>,
    cooling: u32,
    rng: StdRng,
}

impl Flame {
    pub fn new(pixel_count: usize, cooling: u32) -> Flame {
        Flame::with_rng(pixel_count, cooling, StdRng::from_entropy())
    }

    pub fn with_rng(pixel_count: usize, cooling: u32, rng: StdRng) -> Flame {
        Flame {
            heat: vec![0; pixel_count],
            cooling,
            rng,
        }
    }

    #[cfg(test)]
    pub fn heat(&self) -> &[u8] {
        &self.heat
    }

    pub fn step(&mut self) {
        let count = self.heat.len();
        if count == 0 {
            return;
        }

        let max_cooldown = (self.cooling.saturating_mul(10) / count as u32).saturating_add(2);
        for cell in &mut self.heat {
            let cooldown = self.rng.gen_range(0..=max_cooldown).min(u8::MAX as u32) as u8;
            *cell = cell.saturating_sub(cooldown);
        }

        for k in (2..count).rev() {
            let sum = self.heat[k] as u16 + self.heat[k - 1] as u16 + 2 * self.heat[k - 2] as u16;
            self.heat[k] = (sum / 4) as u8;
        }

        if self.rng.gen::<u8>() < SPARKING {
            let y = self.rng.gen_range(0..SPARK_CELLS.min(count));
            let spark = self.rng.gen_range(160..=255u8);
            self.heat[y] = self.heat[y].saturating_add(spark);
        }
    }

    pub fn render(&mut self, composer: &mut PixelComposer, color: Pixel) {
        self.step();
        for (index, heat) in self.heat.iter().enumerate() {
            composer.add(index, heat_color(*heat, color));
        }
    }
}

impl fmt::Debug for Flame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flame")
            .field("pixels", &self.heat.len())
            .field("cooling", &self.cooling)
            .finish()
    }
}

/// Maps heat onto a three band ramp: black to `base`, `base` to a lighter
/// tint of it, and that tint to white.
pub fn heat_color(heat: u8, base: Pixel) -> Pixel {
    let t192 = (heat as u16 * 191 / 255) as u8;
    let ramp = (t192 & 0x3F) << 2;
    let factor = ramp as f32 / 255.0;

    let black = Srgb::new(0.0, 0.0, 0.0);
    let white = Srgb::new(1.0, 1.0, 1.0);
    let base: Srgb<f32> = base.into_format();
    let warm = base.mix(white, 0.5);

    let color = if t192 & 0x80 != 0 {
        warm.mix(white, factor)
    } else if t192 & 0x40 != 0 {
        base.mix(warm, factor)
    } else {
        black.mix(base, factor)
    };
    color.into_format()
}
