use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::composer::Pixel;

/// Something that can put a frame on the physical strip.
pub trait PixelSink {
    fn send(&mut self, frame: &[Pixel]) -> Result<(), String>;
}

struct Slot {
    frame: Option<Vec<Pixel>>,
    closed: bool,
}

struct Mailbox {
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl Mailbox {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Creates a single-slot frame mailbox. Posting never blocks; a frame that
/// has not been picked up yet is replaced by the newer one.
pub fn mailbox() -> (FrameSender, FrameReceiver) {
    let mailbox = Arc::new(Mailbox {
        slot: Mutex::new(Slot {
            frame: None,
            closed: false,
        }),
        ready: Condvar::new(),
    });

    (
        FrameSender {
            mailbox: Arc::clone(&mailbox),
        },
        FrameReceiver { mailbox },
    )
}

#[derive(Clone)]
pub struct FrameSender {
    mailbox: Arc<Mailbox>,
}

impl FrameSender {
    pub fn post(&self, frame: Vec<Pixel>) {
        let mut slot = self.mailbox.lock();
        if slot.closed {
            return;
        }
        if slot.frame.replace(frame).is_some() {
            log::debug!("Output busy, dropping stale frame");
        }
        self.mailbox.ready.notify_one();
    }

    pub fn close(&self) {
        self.mailbox.lock().closed = true;
        self.mailbox.ready.notify_all();
    }
}

pub struct FrameReceiver {
    mailbox: Arc<Mailbox>,
}

pub enum Received {
    Frame(Vec<Pixel>),
    Timeout,
    Closed,
}

impl FrameReceiver {
    #[cfg(test)]
    pub fn try_take(&self) -> Option<Vec<Pixel>> {
        self.mailbox.lock().frame.take()
    }

    /// Waits for the next frame. A frame posted before closing is still
    /// delivered before `Closed` is reported.
    pub fn recv_timeout(&self, timeout: Duration) -> Received {
        let slot = self.mailbox.lock();
        let (mut slot, _) = self
            .mailbox
            .ready
            .wait_timeout_while(slot, timeout, |slot| slot.frame.is_none() && !slot.closed)
            .unwrap_or_else(PoisonError::into_inner);

        match slot.frame.take() {
            Some(frame) => Received::Frame(frame),
            None if slot.closed => Received::Closed,
            None => Received::Timeout,
        }
    }
}

/// Drains the mailbox into a sink on its own thread so that slow
/// transmission never holds up rendering.
pub struct FrameWriter<S: PixelSink> {
    receiver: FrameReceiver,
    sink: S,
    retry_interval: Duration,
}

impl<S: PixelSink> FrameWriter<S> {
    pub fn new(receiver: FrameReceiver, sink: S, retry_interval: Duration) -> FrameWriter<S> {
        FrameWriter {
            receiver,
            sink,
            retry_interval,
        }
    }

    pub fn run(&mut self) {
        let mut pending: Option<Vec<Pixel>> = None;

        loop {
            match self.receiver.recv_timeout(self.retry_interval) {
                Received::Frame(frame) => pending = Some(frame),
                Received::Timeout => {}
                Received::Closed => {
                    if let Some(frame) = pending.take() {
                        self.write(frame);
                    }
                    log::info!("Frame output closed");
                    return;
                }
            }

            if let Some(frame) = pending.take() {
                pending = self.write(frame);
            }
        }
    }

    /// Returns the frame back if it could not be sent.
    fn write(&mut self, frame: Vec<Pixel>) -> Option<Vec<Pixel>> {
        match self.sink.send(&frame) {
            Ok(()) => None,
            Err(err) => {
                log::warn!("Failed to send frame: {err}");
                Some(frame)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette::Srgb;
    use std::thread;

    struct FlakySink {
        failures_left: u32,
        sent: Arc<Mutex<Vec<Vec<Pixel>>>>,
    }

    impl PixelSink for FlakySink {
        fn send(&mut self, frame: &[Pixel]) -> Result<(), String> {
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err("device unplugged".to_string());
            }
            self.sent.lock().unwrap().push(frame.to_vec());
            Ok(())
        }
    }

    #[test]
    fn latest_frame_wins() {
        let (sender, receiver) = mailbox();
        sender.post(vec![Srgb::new(1, 0, 0)]);
        sender.post(vec![Srgb::new(2, 0, 0)]);

        assert_eq!(receiver.try_take(), Some(vec![Srgb::new(2, 0, 0)]));
        assert_eq!(receiver.try_take(), None);
    }

    #[test]
    fn pending_frame_is_delivered_before_close() {
        let (sender, receiver) = mailbox();
        sender.post(vec![Srgb::new(9, 9, 9)]);
        sender.close();
        sender.post(vec![Srgb::new(1, 1, 1)]);

        assert!(matches!(
            receiver.recv_timeout(Duration::from_millis(10)),
            Received::Frame(frame) if frame == vec![Srgb::new(9, 9, 9)]
        ));
        assert!(matches!(
            receiver.recv_timeout(Duration::from_millis(10)),
            Received::Closed
        ));
    }

    #[test]
    fn failed_writes_are_retried() {
        let (sender, receiver) = mailbox();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let sink = FlakySink {
            failures_left: 2,
            sent: Arc::clone(&sent),
        };
        let mut writer = FrameWriter::new(receiver, sink, Duration::from_millis(1));

        sender.post(vec![Srgb::new(5, 6, 7)]);
        let handle = thread::spawn(move || writer.run());
        thread::sleep(Duration::from_millis(50));
        sender.close();
        handle.join().unwrap();

        assert_eq!(*sent.lock().unwrap(), vec![vec![Srgb::new(5, 6, 7)]]);
    }
}
