use palette::Srgb;

use crate::framesink::FrameSender;

pub type Pixel = Srgb<u8>;

pub const BLACK: Pixel = Srgb::new(0, 0, 0);

/// Multiplies every channel by `factor`, saturating at 255.
pub fn scale(pixel: Pixel, factor: f32) -> Pixel {
    // Float to int casts saturate, so negative factors end up black.
    Srgb::new(
        (pixel.red as f32 * factor) as u8,
        (pixel.green as f32 * factor) as u8,
        (pixel.blue as f32 * factor) as u8,
    )
}

pub fn saturating_add(a: Pixel, b: Pixel) -> Pixel {
    Srgb::new(
        a.red.saturating_add(b.red),
        a.green.saturating_add(b.green),
        a.blue.saturating_add(b.blue),
    )
}

/// The in-memory image of the strip.
///
/// Writes to an index outside the strip are rejected: nothing is written and
/// the call returns `false`.
pub struct PixelComposer {
    pixels: Vec<Pixel>,
    output: FrameSender,
}

impl PixelComposer {
    pub fn new(pixel_count: usize, output: FrameSender) -> PixelComposer {
        PixelComposer {
            pixels: vec![BLACK; pixel_count],
            output,
        }
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn set(&mut self, index: usize, color: Pixel) -> bool {
        match self.pixels.get_mut(index) {
            Some(pixel) => {
                *pixel = color;
                true
            }
            None => {
                log::debug!("Ignoring write to pixel {index}, strip has {}", self.len());
                false
            }
        }
    }

    pub fn add(&mut self, index: usize, color: Pixel) -> bool {
        match self.pixels.get_mut(index) {
            Some(pixel) => {
                *pixel = saturating_add(*pixel, color);
                true
            }
            None => {
                log::debug!("Ignoring add to pixel {index}, strip has {}", self.len());
                false
            }
        }
    }

    pub fn add_const(&mut self, color: Pixel) {
        for pixel in &mut self.pixels {
            *pixel = saturating_add(*pixel, color);
        }
    }

    pub fn clear(&mut self) {
        self.pixels.fill(BLACK);
    }

    /// Hands a brightness-scaled copy of the buffer to the output without
    /// waiting for it to be transmitted.
    pub fn flush(&mut self, brightness: f32) {
        let frame = self.pixels.iter().map(|p| scale(*p, brightness)).collect();
        self.output.post(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framesink;

    fn composer(pixel_count: usize) -> (PixelComposer, framesink::FrameReceiver) {
        let (sender, receiver) = framesink::mailbox();
        (PixelComposer::new(pixel_count, sender), receiver)
    }

    #[test]
    fn add_saturates_instead_of_wrapping() {
        let (mut composer, _rx) = composer(3);
        composer.set(1, Srgb::new(200, 10, 0));
        assert!(composer.add(1, Srgb::new(100, 10, 255)));
        assert_eq!(composer.pixels()[1], Srgb::new(255, 20, 255));
    }

    #[test]
    fn out_of_range_writes_are_rejected() {
        let (mut composer, _rx) = composer(3);
        assert!(!composer.set(3, Srgb::new(1, 2, 3)));
        assert!(!composer.add(100, Srgb::new(1, 2, 3)));
        assert!(composer.pixels().iter().all(|p| *p == BLACK));
    }

    #[test]
    fn add_const_touches_every_pixel() {
        let (mut composer, _rx) = composer(4);
        composer.set(0, Srgb::new(250, 0, 0));
        composer.add_const(Srgb::new(10, 5, 1));
        assert_eq!(composer.pixels()[0], Srgb::new(255, 5, 1));
        assert_eq!(composer.pixels()[3], Srgb::new(10, 5, 1));

        composer.clear();
        assert!(composer.pixels().iter().all(|p| *p == BLACK));
    }

    #[test]
    fn flush_scales_copy_by_brightness() {
        let (mut composer, rx) = composer(2);
        composer.set(0, Srgb::new(100, 200, 10));
        composer.flush(1.5);

        let frame = rx.try_take().expect("a frame was posted");
        assert_eq!(frame[0], Srgb::new(150, 255, 15));
        // The buffer itself keeps the unscaled values.
        assert_eq!(composer.pixels()[0], Srgb::new(100, 200, 10));
    }
}
