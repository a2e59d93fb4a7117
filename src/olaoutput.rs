use std::net::{SocketAddr, UdpSocket};

use rosc::{encoder, OscMessage, OscPacket, OscType};

use crate::composer::Pixel;
use crate::framesink::PixelSink;

pub const UNIVERSE_SIZE: usize = 512;

/// Sends frames to an OLA daemon as one DMX universe, three channels per
/// pixel starting at channel 0.
pub struct OlaOutput {
    sock: UdpSocket,
    target_addr: SocketAddr,
    address: String,
    buffer: Vec<u8>,
}

impl OlaOutput {
    pub fn new(target_addr: SocketAddr, universe: u32) -> Result<Self, String> {
        let our_addr = SocketAddr::from(([0, 0, 0, 0], 0));
        let sock = match UdpSocket::bind(our_addr) {
            Ok(sock) => sock,
            Err(error) => return Err(error.to_string()),
        };

        Ok(OlaOutput {
            sock,
            target_addr,
            address: format!("/dmx/universe/{universe}"),
            buffer: vec![0; UNIVERSE_SIZE],
        })
    }

    fn pack(&mut self, frame: &[Pixel]) {
        self.blackout();
        for (channels, pixel) in self.buffer.chunks_exact_mut(3).zip(frame) {
            channels.copy_from_slice(&[pixel.red, pixel.green, pixel.blue]);
        }
    }

    fn blackout(&mut self) {
        self.buffer.fill(0);
    }
}

impl PixelSink for OlaOutput {
    fn send(&mut self, frame: &[Pixel]) -> Result<(), String> {
        self.pack(frame);

        let msg_buf = encoder::encode(&OscPacket::Message(OscMessage {
            addr: self.address.clone(),
            args: vec![OscType::Blob(self.buffer.clone())],
        }))
        .map_err(|err| format!("Cannot encode DMX frame: {err:?}"))?;

        self.sock
            .send_to(&msg_buf, self.target_addr)
            .map_err(|err| format!("Cannot reach OLA at {}: {err}", self.target_addr))?;
        Ok(())
    }
}
