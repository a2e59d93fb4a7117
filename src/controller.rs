use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use palette::{Mix, Srgb};

use crate::commands::{Command, PanelEffect};
use crate::composer::{Pixel, PixelComposer};
use crate::effects::{Effect, Flame};
use crate::scheduler::Scheduler;

pub const MIN_BRIGHTNESS: f32 = 0.01;
pub const MAX_BRIGHTNESS: f32 = 100.0;
/// Longest tick period a flame command may ask for.
pub const MAX_TICK_PERIOD_MS: u32 = 1000;

pub fn validate_brightness(value: f32) -> Result<f32, String> {
    // NaN fails both comparisons.
    if value > MIN_BRIGHTNESS && value < MAX_BRIGHTNESS {
        Ok(value)
    } else {
        Err(format!(
            "Brightness {value} outside of ({MIN_BRIGHTNESS}, {MAX_BRIGHTNESS})"
        ))
    }
}

/// Everything the render loop and the command handlers share.
pub struct LightController {
    composer: PixelComposer,
    scheduler: Scheduler,
    brightness: f32,
    tick_period: Duration,
    default_tick_period: Duration,
}

impl LightController {
    pub fn new(
        composer: PixelComposer,
        brightness: f32,
        tick_period: Duration,
    ) -> Result<LightController, String> {
        Ok(LightController {
            composer,
            scheduler: Scheduler::new(),
            brightness: validate_brightness(brightness)?,
            tick_period,
            default_tick_period: tick_period,
        })
    }

    #[cfg(test)]
    pub fn composer(&self) -> &PixelComposer {
        &self.composer
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    pub fn set_brightness(&mut self, value: f32) -> Result<(), String> {
        self.brightness = validate_brightness(value)?;
        log::info!("Brightness set to {value}");
        Ok(())
    }

    pub fn tick(&mut self) {
        let elapsed_ms = self.tick_period.as_millis() as u32;
        if self.scheduler.tick(&mut self.composer, elapsed_ms) {
            self.composer.flush(self.brightness);
        }
        if !self.scheduler.is_enabled() && self.tick_period != self.default_tick_period {
            self.tick_period = self.default_tick_period;
        }
    }

    /// Stops all animations and blanks the strip.
    pub fn kill(&mut self) {
        self.stop_animations();
        self.composer.flush(self.brightness);
    }

    fn stop_animations(&mut self) {
        self.scheduler.kill(&mut self.composer);
        self.tick_period = self.default_tick_period;
    }

    pub fn apply(&mut self, command: Command) -> Result<(), String> {
        match command {
            Command::SetAll(color) => {
                self.stop_animations();
                for index in 0..self.composer.len() {
                    self.composer.set(index, color);
                }
            }
            Command::SetOne { index, color } => {
                self.stop_animations();
                if !self.composer.set(index, color) {
                    self.composer.flush(self.brightness);
                    return Err(format!(
                        "Pixel {index} is outside of the strip ({} pixels)",
                        self.composer.len()
                    ));
                }
            }
            Command::SetList(colors) => {
                self.stop_animations();
                if colors.len() > self.composer.len() {
                    log::warn!(
                        "Got {} colors for {} pixels, ignoring the rest",
                        colors.len(),
                        self.composer.len()
                    );
                }
                for (index, color) in colors.into_iter().enumerate().take(self.composer.len()) {
                    self.composer.set(index, color);
                }
            }
            Command::Gradient {
                start,
                count,
                from,
                to,
            } => {
                self.stop_animations();
                let count = count.min(self.composer.len());
                for (offset, color) in gradient(from, to, count).into_iter().enumerate() {
                    self.composer.set(start.saturating_add(offset), color);
                }
            }
            Command::Brightness(value) => return self.set_brightness(value),
            Command::PanelOff => self.stop_animations(),
            Command::Panel {
                effect,
                duration_ms,
                length,
                freq,
                color,
            } => {
                let effect = match effect {
                    PanelEffect::Flash => Effect::Flash,
                    PanelEffect::Wave => Effect::Wave { length, freq },
                    PanelEffect::Wavelet => Effect::Wavelet { length, freq },
                };
                self.scheduler.add(effect, color, duration_ms);
                // The next tick renders and flushes.
                return Ok(());
            }
            Command::Flame {
                duration_ms,
                period_ms,
                color,
                randomness,
                count,
            } => {
                if period_ms > MAX_TICK_PERIOD_MS {
                    return Err(format!(
                        "Tick period {period_ms} ms above {MAX_TICK_PERIOD_MS} ms"
                    ));
                }
                self.stop_animations();
                let count = count.min(self.composer.len());
                self.scheduler
                    .add(Effect::Flame(Flame::new(count, randomness)), color, duration_ms);
                if period_ms > 0 {
                    log::info!("Tick period set to {period_ms} ms");
                    self.tick_period = Duration::from_millis(period_ms as u64);
                }
                return Ok(());
            }
        }

        self.composer.flush(self.brightness);
        Ok(())
    }
}

/// `count` colors evenly spaced from `from` to `to`, both ends included.
pub fn gradient(from: Pixel, to: Pixel, count: usize) -> Vec<Pixel> {
    let from: Srgb<f32> = from.into_format();
    let to: Srgb<f32> = to.into_format();
    let steps = count.saturating_sub(1).max(1) as f32;

    (0..count)
        .map(|i| from.mix(to, i as f32 / steps).into_format())
        .collect()
}

/// The controller as handed to the render and command threads.
#[derive(Clone)]
pub struct SharedController {
    inner: Arc<Mutex<LightController>>,
}

impl SharedController {
    pub fn new(controller: LightController) -> SharedController {
        SharedController {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    /// Takes over a poisoned lock as is.
    pub fn lock(&self) -> MutexGuard<'_, LightController> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
