//! OpenLCB event identifiers.
//!
//! Event IDs are opaque 64-bit values. Configuration strings accept three
//! notations, mixed freely in a comma separated list:
//!
//! | Notation | Example |
//! |----------|---------|
//! | Dotted hex bytes | `05.01.01.01.22.00.00.01` |
//! | Hex, `0x` prefixed | `0x0501010122000001` |
//! | Decimal | `360850920908554241` |
//!
//! Persisted documents always use the `0x` form.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::codec::{is_valid_address, output_address};
use crate::error::TurnoutError;

/// Base of the well-known "activate basic DCC accessory" event range.
pub const ACTIVATE_BASIC_DCC_ACCESSORY_EVENT_BASE: u64 = 0x0101_0200_00FF_0000;

/// Base of the well-known "inactivate basic DCC accessory" event range.
pub const INACTIVATE_BASIC_DCC_ACCESSORY_EVENT_BASE: u64 = 0x0101_0200_00FE_0000;

/// Number of events in each DCC accessory range (one per output address).
pub const DCC_ACCESSORY_EVENT_COUNT: u64 = 4096;

/// A 64-bit OpenLCB event identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub u64);

impl EventId {
    /// Raw 64-bit value.
    pub fn value(self) -> u64 {
        self.0
    }

    /// Renders as `0x` prefixed, zero padded hex (the persisted form).
    pub fn to_hex(self) -> String {
        alloc::format!("0x{:016X}", self.0)
    }
}

impl From<u64> for EventId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for EventId {
    /// Dotted form, `05.01.01.01.22.00.00.01`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0.to_be_bytes();
        for (i, byte) in bytes.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

impl FromStr for EventId {
    type Err = TurnoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        let invalid = || TurnoutError::InvalidEventId(token.to_string());
        if token.contains('.') {
            let mut value: u64 = 0;
            let mut count = 0;
            for part in token.split('.') {
                if part.is_empty() || part.len() > 2 {
                    return Err(invalid());
                }
                let byte = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
                value = (value << 8) | u64::from(byte);
                count += 1;
            }
            if count != 8 {
                return Err(invalid());
            }
            Ok(Self(value))
        } else if let Some(hex) = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
        {
            u64::from_str_radix(hex, 16).map(Self).map_err(|_| invalid())
        } else {
            token.parse::<u64>().map(Self).map_err(|_| invalid())
        }
    }
}

/// Parses a comma separated list of event IDs.
///
/// Empty tokens are skipped, so `""` yields an empty list.
pub fn parse_event_list(csv: &str) -> Result<Vec<EventId>, TurnoutError> {
    csv.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(EventId::from_str)
        .collect()
}

/// Renders event IDs as a comma joined list of hex strings.
pub fn format_event_list(events: &[EventId]) -> String {
    events
        .iter()
        .map(|event| event.to_hex())
        .collect::<Vec<_>>()
        .join(",")
}

/// A DCC accessory command carried by a well-known OpenLCB event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AccessoryEvent {
    /// User-visible turnout address.
    pub address: u16,
    /// `true` for the thrown output.
    pub thrown: bool,
    /// `true` for the activate range, `false` for inactivate.
    pub activate: bool,
}

/// Decodes an event from one of the DCC accessory ranges.
///
/// Returns `None` for events outside both ranges and for offsets that map to
/// an address above [`crate::codec::MAX_ADDRESS`].
pub fn decode_accessory_event(event: EventId) -> Option<AccessoryEvent> {
    let (offset, activate) = match range_offset(event, ACTIVATE_BASIC_DCC_ACCESSORY_EVENT_BASE) {
        Some(offset) => (offset, true),
        None => (
            range_offset(event, INACTIVATE_BASIC_DCC_ACCESSORY_EVENT_BASE)?,
            false,
        ),
    };
    let address = (offset >> 1) + 1;
    if !is_valid_address(address) {
        return None;
    }
    Some(AccessoryEvent {
        address,
        thrown: offset & 1 == 1,
        activate,
    })
}

/// The well-known event for an accessory command.
pub fn accessory_event(address: u16, thrown: bool, activate: bool) -> EventId {
    let base = if activate {
        ACTIVATE_BASIC_DCC_ACCESSORY_EVENT_BASE
    } else {
        INACTIVATE_BASIC_DCC_ACCESSORY_EVENT_BASE
    };
    EventId(base + u64::from(output_address(address, thrown)))
}

fn range_offset(event: EventId, base: u64) -> Option<u16> {
    let offset = event.0.checked_sub(base)?;
    (offset < DCC_ACCESSORY_EVENT_COUNT).then_some(offset as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dotted() {
        let event: EventId = "1.2.3.4.5.6.7.9".parse().unwrap();
        assert_eq!(event, EventId(0x0102_0304_0506_0709));
    }

    #[test]
    fn parse_dotted_two_digit_bytes() {
        let event: EventId = "05.01.01.01.22.00.00.FF".parse().unwrap();
        assert_eq!(event.value(), 0x0501_0101_2200_00FF);
    }

    #[test]
    fn parse_hex_prefixed() {
        let event: EventId = "0x0501010122000001".parse().unwrap();
        assert_eq!(event.value(), 0x0501_0101_2200_0001);
        let upper: EventId = "0X1f".parse().unwrap();
        assert_eq!(upper.value(), 0x1F);
    }

    #[test]
    fn parse_decimal() {
        let event: EventId = " 42 ".parse().unwrap();
        assert_eq!(event.value(), 42);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("turnout".parse::<EventId>().is_err());
        assert!("1.2.3".parse::<EventId>().is_err());
        assert!("1.2.3.4.5.6.7.100".parse::<EventId>().is_err());
        assert!("0xZZ".parse::<EventId>().is_err());
    }

    #[test]
    fn list_skips_empty_tokens() {
        assert!(parse_event_list("").unwrap().is_empty());
        let events = parse_event_list("1, ,0x2,").unwrap();
        assert_eq!(events, vec![EventId(1), EventId(2)]);
    }

    #[test]
    fn list_fails_on_bad_token() {
        assert!(matches!(
            parse_event_list("1,nope"),
            Err(TurnoutError::InvalidEventId(token)) if token == "nope"
        ));
    }

    #[test]
    fn hex_list_reparses() {
        let events = vec![EventId(0x0102_0304_0506_0708), EventId(7)];
        let csv = format_event_list(&events);
        assert_eq!(csv, "0x0102030405060708,0x0000000000000007");
        assert_eq!(parse_event_list(&csv).unwrap(), events);
    }

    #[test]
    fn display_is_dotted() {
        assert_eq!(
            EventId(0x0102_0304_0506_0709).to_string(),
            "01.02.03.04.05.06.07.09"
        );
    }

    #[test]
    fn accessory_event_offsets() {
        assert_eq!(
            accessory_event(1, false, true).value(),
            ACTIVATE_BASIC_DCC_ACCESSORY_EVENT_BASE
        );
        assert_eq!(
            accessory_event(1, true, false).value(),
            INACTIVATE_BASIC_DCC_ACCESSORY_EVENT_BASE + 1
        );
    }

    #[test]
    fn accessory_event_round_trip() {
        let cases = [(1, false, true), (10, true, true), (2044, true, false)];
        for (address, thrown, activate) in cases {
            let decoded =
                decode_accessory_event(accessory_event(address, thrown, activate)).unwrap();
            assert_eq!(
                decoded,
                AccessoryEvent {
                    address,
                    thrown,
                    activate
                }
            );
        }
    }

    #[test]
    fn foreign_events_do_not_decode() {
        assert_eq!(decode_accessory_event(EventId(0x0501_0101_2200_0001)), None);
        assert_eq!(
            decode_accessory_event(EventId(
                ACTIVATE_BASIC_DCC_ACCESSORY_EVENT_BASE + DCC_ACCESSORY_EVENT_COUNT
            )),
            None
        );
        // output address 4094 is board 511, beyond the last turnout
        assert_eq!(
            decode_accessory_event(EventId(ACTIVATE_BASIC_DCC_ACCESSORY_EVENT_BASE + 4094)),
            None
        );
    }
}
