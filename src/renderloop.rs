use crate::controller::SharedController;
use crate::intervaltimer::IntervalTimer;

/// The periodic context: ticks the controller once per tick period.
pub struct RenderLoop {
    controller: SharedController,
    timer: IntervalTimer,
}

impl RenderLoop {
    /// Must be created on the thread that runs it, the timer picks up the
    /// thread name for its log messages.
    pub fn new(controller: SharedController) -> RenderLoop {
        let tick_period = controller.lock().tick_period();

        RenderLoop {
            controller,
            timer: IntervalTimer::new(tick_period, true),
        }
    }

    pub fn run(&mut self) {
        loop {
            self.update();
            self.timer.sleep_until_next_tick();
        }
    }

    fn update(&mut self) {
        let tick_period = {
            let mut controller = self.controller.lock();
            controller.tick();
            controller.tick_period()
        };
        self.timer.set_interval(tick_period);
    }
}
