//! Conversion between user-visible turnout addresses and the DCC accessory
//! wire format.
//!
//! Users number turnouts 1..=2044. On the wire an accessory is addressed as a
//! decoder *board* with four *ports*, and every port drives a pair of outputs
//! (closed/thrown):
//!
//! ```text
//! user address  ->  board = (address - 1) / 4, port = (address - 1) % 4
//! output addr   =   ((address - 1) << 1) | thrown   (= board:port:state)
//! ```
//!
//! # Example
//!
//! ```rust
//! use rs_turnouts::codec::{decode_accessory_packet, encode, next_packet};
//!
//! assert_eq!(encode(10), (2, 1));
//!
//! let packet = next_packet(10, true);
//! let decoded = decode_accessory_packet(&packet).unwrap();
//! assert_eq!((decoded.address, decoded.thrown), (10, true));
//! ```

use crate::packet::DccPacket;

/// Lowest valid user-visible turnout address.
pub const MIN_ADDRESS: u16 = 1;

/// Highest valid user-visible turnout address.
pub const MAX_ADDRESS: u16 = 2044;

/// Returns true if `address` is a legal turnout address.
pub fn is_valid_address(address: u16) -> bool {
    (MIN_ADDRESS..=MAX_ADDRESS).contains(&address)
}

/// Converts a user address into its wire `(board, port)` pair.
///
/// Only defined for `address >= 1`; zero saturates to board 0, port 0.
pub fn encode(address: u16) -> (u16, u8) {
    let zero_based = address.saturating_sub(1);
    (zero_based / 4, (zero_based % 4) as u8)
}

/// Converts a wire `(board, port)` pair back into the user address.
pub fn decode(board: u16, port: u8) -> u16 {
    let address = (u32::from(board) << 2) + u32::from(port) + 1;
    (address & 0xFFFF) as u16
}

/// The 12-bit accessory output address for a turnout in the given state.
pub fn output_address(address: u16, thrown: bool) -> u16 {
    (address.saturating_sub(1) << 1) | u16::from(thrown)
}

/// Builds the accessory packet commanding `address` into the given state.
///
/// The activate bit is always asserted.
pub fn next_packet(address: u16, thrown: bool) -> DccPacket {
    DccPacket::basic_accessory(output_address(address, thrown), true)
}

/// An accessory command recovered from a packet seen on the track bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessoryCommand {
    /// User-visible turnout address.
    pub address: u16,
    /// Decoder board the packet was sent to.
    pub board: u16,
    /// Port (0..=3) on the board.
    pub port: u8,
    /// Commanded state, `true` for thrown.
    pub thrown: bool,
}

/// Decodes a two byte basic accessory payload.
///
/// Returns `None` unless both bytes carry the accessory marker (bit 7).
pub fn decode_accessory_payload(payload: &[u8]) -> Option<AccessoryCommand> {
    let &[byte0, byte1] = payload else {
        return None;
    };
    if byte0 & 0x80 == 0 || byte1 & 0x80 == 0 {
        return None;
    }
    let board = (u16::from(!byte1 & 0b0111_0000) << 2) | u16::from(byte0 & 0b0011_1111);
    let port = (byte1 & 0b0000_0110) >> 1;
    Some(AccessoryCommand {
        address: decode(board, port),
        board,
        port,
        thrown: byte1 & 0b0000_0001 != 0,
    })
}

/// Decodes a packet observed on the track bus.
///
/// Marklin packets and anything that is not a two byte accessory payload
/// yield `None`; callers drop those silently.
pub fn decode_accessory_packet(packet: &DccPacket) -> Option<AccessoryCommand> {
    if packet.is_marklin() {
        return None;
    }
    decode_accessory_payload(packet.payload())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_first_addresses() {
        assert_eq!(encode(1), (0, 0));
        assert_eq!(encode(4), (0, 3));
        assert_eq!(encode(5), (1, 0));
        assert_eq!(encode(2044), (510, 3));
    }

    #[test]
    fn decode_first_addresses() {
        assert_eq!(decode(0, 0), 1);
        assert_eq!(decode(1, 0), 5);
        assert_eq!(decode(2, 1), 10);
    }

    #[test]
    fn address_round_trip_over_full_range() {
        for address in MIN_ADDRESS..=MAX_ADDRESS {
            let (board, port) = encode(address);
            assert_eq!(decode(board, port), address, "address {}", address);
        }
    }

    #[test]
    fn packet_round_trip_over_full_range() {
        for address in MIN_ADDRESS..=MAX_ADDRESS {
            for thrown in [false, true] {
                let decoded = decode_accessory_packet(&next_packet(address, thrown))
                    .unwrap_or_else(|| panic!("address {} did not decode", address));
                assert_eq!((decoded.address, decoded.thrown), (address, thrown));
            }
        }
    }

    #[test]
    fn output_address_packs_state_bit() {
        assert_eq!(output_address(1, false), 0);
        assert_eq!(output_address(1, true), 1);
        assert_eq!(output_address(10, true), 19);
    }

    #[test]
    fn next_packet_asserts_activate() {
        let packet = next_packet(100, false);
        assert_ne!(packet.payload()[1] & 0b0000_1000, 0);
    }

    #[test]
    fn decode_board_two_port_one_thrown() {
        let payload = [0b1000_0010, 0b1111_1011];
        let command = decode_accessory_payload(&payload).unwrap();
        assert_eq!(command.board, 2);
        assert_eq!(command.port, 1);
        assert!(command.thrown);
        assert_eq!(command.address, 10);
    }

    #[test]
    fn idle_packet_is_not_an_accessory() {
        assert_eq!(decode_accessory_packet(&DccPacket::idle()), None);
    }

    #[test]
    fn marklin_packet_is_ignored() {
        let packet = DccPacket::marklin(&[0x82, 0xFB]).unwrap();
        assert_eq!(decode_accessory_packet(&packet), None);
    }

    #[test]
    fn wrong_length_is_ignored() {
        assert_eq!(decode_accessory_payload(&[0x82]), None);
        assert_eq!(decode_accessory_payload(&[0x82, 0xFB, 0x00]), None);
    }

    #[test]
    fn missing_marker_bit_is_ignored() {
        assert_eq!(decode_accessory_payload(&[0x02, 0xFB]), None);
        assert_eq!(decode_accessory_payload(&[0x82, 0x7B]), None);
    }

    #[test]
    fn valid_address_range() {
        assert!(!is_valid_address(0));
        assert!(is_valid_address(1));
        assert!(is_valid_address(2044));
        assert!(!is_valid_address(2045));
    }
}
