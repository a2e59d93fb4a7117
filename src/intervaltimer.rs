use std::thread;
use std::time::{Duration, Instant};

pub struct IntervalTimer {
    interval: Duration,
    last_tick: Instant,
    thread_name: String,
    measure_fps: bool,
    last_fps_print: Instant,
    frames: u32,
}

impl IntervalTimer {
    pub fn new(interval: Duration, measure_fps: bool) -> IntervalTimer {
        let cur_thread = thread::current();
        let thread_name = cur_thread.name().unwrap_or("unnamed");

        IntervalTimer {
            interval,
            last_tick: Instant::now(),
            thread_name: thread_name.to_string(),
            measure_fps,
            last_fps_print: Instant::now(),
            frames: 0,
        }
    }

    #[cfg(test)]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Takes effect from the next tick on.
    pub fn set_interval(&mut self, interval: Duration) {
        if interval != self.interval {
            log::debug!("{} interval changed to {:?}", self.thread_name, interval);
            self.interval = interval;
        }
    }

    pub fn sleep_until_next_tick(&mut self) {
        if self.measure_fps {
            self.update_fps();
        }

        let now = Instant::now();
        let next_tick = if self.last_tick + self.interval > now {
            self.last_tick + self.interval
        } else {
            log::warn!("{} skipped a frame", self.thread_name);
            now + self.interval
        };

        thread::sleep(next_tick.saturating_duration_since(Instant::now()));
        self.last_tick = next_tick
    }

    fn update_fps(&mut self) {
        self.frames += 1;

        if Instant::now() - self.last_fps_print > Duration::from_secs(1) {
            log::debug!("{} FPS: {}", self.thread_name, self.frames);
            self.frames = 0;
            self.last_fps_print = Instant::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_cadence() {
        let mut timer = IntervalTimer::new(Duration::from_millis(5), false);
        let start = Instant::now();
        for _ in 0..10 {
            timer.sleep_until_next_tick();
        }
        assert!(start.elapsed() >= Duration::from_millis(45));
    }

    #[test]
    fn interval_can_change() {
        let mut timer = IntervalTimer::new(Duration::from_millis(20), false);
        timer.set_interval(Duration::from_millis(1));
        assert_eq!(timer.interval(), Duration::from_millis(1));

        let start = Instant::now();
        timer.sleep_until_next_tick();
        assert!(start.elapsed() < Duration::from_millis(20));
    }
}
