//! DCC packets as handed to (and observed on) the track output layer.
//!
//! A [`DccPacket`] carries the payload bytes without the trailing error
//! detection byte; the output layer appends [`DccPacket::checksum`] when it
//! renders the waveform.
//!
//! # Basic accessory layout
//!
//! ```text
//! payload[0]  payload[1]
//! 10aaaaaa    1AAACDDD
//!   ^^^^^^     ^^^^^^^
//!   |          |  || \- output address bits 0..2 (port + state)
//!   |          |  |\--- activate flag
//!   |          |  \---- (unused)
//!   |          \------- board bits 6..8, one's complement
//!   \------------------ board bits 0..5
//! ```

use heapless::Vec;

/// Largest payload the track layer accepts (excluding the checksum byte).
pub const MAX_PAYLOAD: usize = 5;

/// A DCC packet payload plus the header bits the output layer cares about.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct DccPacket {
    payload: Vec<u8, MAX_PAYLOAD>,
    is_marklin: bool,
    repeat_count: u8,
}

impl DccPacket {
    /// Builds a packet from raw payload bytes.
    ///
    /// Returns `None` if `bytes` is longer than [`MAX_PAYLOAD`].
    pub fn from_payload(bytes: &[u8]) -> Option<Self> {
        Some(Self {
            payload: Vec::from_slice(bytes).ok()?,
            is_marklin: false,
            repeat_count: 0,
        })
    }

    /// Builds a Marklin-Motorola packet from raw payload bytes.
    pub fn marklin(bytes: &[u8]) -> Option<Self> {
        Self::from_payload(bytes).map(|mut packet| {
            packet.is_marklin = true;
            packet
        })
    }

    /// The DCC idle packet (`11111111 00000000`).
    pub fn idle() -> Self {
        let mut payload = Vec::new();
        let _ = payload.extend_from_slice(&[0xFF, 0x00]);
        Self {
            payload,
            is_marklin: false,
            repeat_count: 0,
        }
    }

    /// Encodes a basic accessory decoder packet.
    ///
    /// `output_address` is the 12-bit accessory output address: board in
    /// bits 3..11, port in bits 1..2 and the output (state) in bit 0.
    pub fn basic_accessory(output_address: u16, activate: bool) -> Self {
        let byte0 = 0b1000_0000 | ((output_address >> 3) & 0b0011_1111) as u8;
        let high_board = ((output_address >> 9) & 0b111) as u8;
        let mut byte1 = 0b1000_0000 | ((!high_board & 0b111) << 4) | (output_address & 0b111) as u8;
        if activate {
            byte1 |= 0b0000_1000;
        }
        let mut payload = Vec::new();
        let _ = payload.extend_from_slice(&[byte0, byte1]);
        Self {
            payload,
            is_marklin: false,
            repeat_count: 0,
        }
    }

    /// Sets how many extra times the output layer should repeat the packet.
    pub fn with_repeat_count(mut self, repeats: u8) -> Self {
        self.repeat_count = repeats;
        self
    }

    /// Payload bytes, without the checksum.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Whether this is a Marklin-Motorola packet rather than DCC.
    pub fn is_marklin(&self) -> bool {
        self.is_marklin
    }

    /// Requested repeat count.
    pub fn repeat_count(&self) -> u8 {
        self.repeat_count
    }

    /// Whether this is the DCC idle packet.
    pub fn is_idle(&self) -> bool {
        !self.is_marklin && self.payload() == [0xFF, 0x00]
    }

    /// XOR of all payload bytes, the DCC error detection byte.
    pub fn checksum(&self) -> u8 {
        self.payload.iter().fold(0, |acc, byte| acc ^ byte)
    }
}
