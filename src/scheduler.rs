use crate::composer::{Pixel, PixelComposer};
use crate::effects::{Action, Effect};

/// Runs the active actions in the order they were added. Every action adds
/// onto the same buffer, so overlapping effects sum up per channel.
#[derive(Debug, Default)]
pub struct Scheduler {
    actions: Vec<Action>,
    enabled: bool,
}

impl Scheduler {
    pub fn new() -> Scheduler {
        Scheduler::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[cfg(test)]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn add(&mut self, effect: Effect, color: Pixel, duration_ms: u32) {
        log::debug!("Adding {effect:?} for {duration_ms} ms");
        self.actions.push(Action::new(effect, color, duration_ms));
        self.enabled = true;
    }

    pub fn kill(&mut self, composer: &mut PixelComposer) {
        if !self.actions.is_empty() {
            log::debug!("Killing {} running actions", self.actions.len());
        }
        self.actions.clear();
        self.enabled = false;
        composer.clear();
    }

    /// Advances every action by `elapsed_ms`. Returns whether a new frame is
    /// ready to be flushed.
    pub fn tick(&mut self, composer: &mut PixelComposer, elapsed_ms: u32) -> bool {
        if !self.enabled {
            return false;
        }

        composer.clear();
        self.actions
            .retain_mut(|action| !action.render(composer, elapsed_ms));

        if self.actions.is_empty() {
            log::debug!("All actions finished");
            self.enabled = false;
            composer.clear();
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framesink;
    use palette::Srgb;

    const TICK_MS: u32 = 20;

    fn composer(pixel_count: usize) -> PixelComposer {
        let (sender, _rx) = framesink::mailbox();
        PixelComposer::new(pixel_count, sender)
    }

    #[test]
    fn action_lives_for_floor_duration_over_tick_ticks() {
        for duration_ms in [1, 19, 20, 21, 100, 1000, 1010] {
            let mut composer = composer(3);
            let mut scheduler = Scheduler::new();
            scheduler.add(Effect::Flash, Srgb::new(1, 1, 1), duration_ms);

            let last_present = duration_ms / TICK_MS;
            for tick in 1..=last_present {
                scheduler.tick(&mut composer, TICK_MS);
                assert_eq!(scheduler.len(), 1, "duration {duration_ms}, tick {tick}");
            }
            scheduler.tick(&mut composer, TICK_MS);
            assert_eq!(scheduler.len(), 0, "duration {duration_ms}");
            assert!(!scheduler.is_enabled());
        }
    }

    #[test]
    fn idle_tick_is_a_noop() {
        let mut composer = composer(3);
        composer.set(0, Srgb::new(9, 9, 9));
        let mut scheduler = Scheduler::new();

        assert!(!scheduler.tick(&mut composer, TICK_MS));
        assert_eq!(composer.pixels()[0], Srgb::new(9, 9, 9));
    }

    #[test]
    fn kill_always_leaves_idle_and_black() {
        let mut composer = composer(5);
        let mut scheduler = Scheduler::new();
        scheduler.kill(&mut composer);
        assert!(!scheduler.is_enabled());

        scheduler.add(Effect::Flash, Srgb::new(255, 0, 0), 1000);
        scheduler.add(
            Effect::Wave {
                length: 5.0,
                freq: 2.0,
            },
            Srgb::new(0, 255, 0),
            1000,
        );
        for _ in 0..10 {
            scheduler.tick(&mut composer, TICK_MS);
        }

        scheduler.kill(&mut composer);
        assert_eq!(scheduler.len(), 0);
        assert!(!scheduler.is_enabled());
        assert!(composer.pixels().iter().all(|p| *p == Srgb::new(0, 0, 0)));
    }

    #[test]
    fn flash_peaks_then_goes_idle() {
        let mut composer = composer(8);
        let mut scheduler = Scheduler::new();
        scheduler.add(Effect::Flash, Srgb::new(255, 0, 0), 1000);

        for _ in 0..26 {
            scheduler.tick(&mut composer, TICK_MS);
        }
        assert!(composer.pixels().iter().all(|p| p.red >= 250 && p.green == 0));

        for _ in 0..25 {
            scheduler.tick(&mut composer, TICK_MS);
        }
        assert!(!scheduler.is_enabled());
        assert_eq!(scheduler.len(), 0);
        assert!(composer.pixels().iter().all(|p| *p == Srgb::new(0, 0, 0)));
    }

    fn render_waves(freqs: &[f32], ticks: usize) -> Vec<Pixel> {
        let mut composer = composer(16);
        let mut scheduler = Scheduler::new();
        for freq in freqs {
            let wave = Effect::Wave {
                length: 8.0,
                freq: *freq,
            };
            scheduler.add(wave, Srgb::new(100, 0, 60), 10_000);
        }
        for _ in 0..ticks {
            scheduler.tick(&mut composer, TICK_MS);
        }
        composer.pixels().to_vec()
    }

    #[test]
    fn waves_superpose_additively() {
        let slow = render_waves(&[1.0], 7);
        let fast = render_waves(&[3.0], 7);
        let both = render_waves(&[1.0, 3.0], 7);

        for i in 0..both.len() {
            assert_eq!(both[i].red, slow[i].red.saturating_add(fast[i].red), "pixel {i}");
            assert_eq!(both[i].blue, slow[i].blue.saturating_add(fast[i].blue), "pixel {i}");
        }
        assert_ne!(both, slow);
        assert_ne!(both, fast);
    }
}
