pub(crate) mod flame;
pub(crate) mod flash;
pub(crate) mod wave;

use crate::composer::{Pixel, PixelComposer};

pub use flame::Flame;

#[derive(Debug)]
pub enum Effect {
    Flash,
    Wave { length: f32, freq: f32 },
    Wavelet { length: f32, freq: f32 },
    Flame(Flame),
}

/// One running effect and how far along it is.
#[derive(Debug)]
pub struct Action {
    effect: Effect,
    color: Pixel,
    progress_ms: u32,
    duration_ms: u32,
}

impl Action {
    pub fn new(effect: Effect, color: Pixel, duration_ms: u32) -> Action {
        Action {
            effect,
            color,
            progress_ms: 0,
            duration_ms,
        }
    }

    #[cfg(test)]
    pub fn effect(&self) -> &Effect {
        &self.effect
    }

    #[cfg(test)]
    pub fn progress_ms(&self) -> u32 {
        self.progress_ms
    }

    /// Adds this tick's contribution to `composer` and advances the clock.
    /// Returns true once the action has run past its duration.
    pub fn render(&mut self, composer: &mut PixelComposer, elapsed_ms: u32) -> bool {
        if self.duration_ms == 0 {
            return true;
        }

        let fraction = self.progress_ms as f32 / self.duration_ms as f32;
        let seconds = self.progress_ms as f32 / 1000.0;

        match &mut self.effect {
            Effect::Flash => flash::render(composer, self.color, fraction),
            Effect::Wave { length, freq } => {
                wave::render(composer, self.color, *length, *freq, seconds, None)
            }
            Effect::Wavelet { length, freq } => {
                wave::render(composer, self.color, *length, *freq, seconds, Some(fraction))
            }
            Effect::Flame(flame) => flame.render(composer, self.color),
        }

        self.progress_ms = self.progress_ms.saturating_add(elapsed_ms);
        self.progress_ms > self.duration_ms
    }
}
