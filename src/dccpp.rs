//! Legacy DCC++ style text responses.
//!
//! ```text
//! <H 5 1>          turnout 5 is thrown
//! <H 5 1 0 1>      bulk status: id 5, board 1, port 0, thrown
//! <X>              command failed
//! ```

extern crate alloc;

use alloc::string::String;
use core::fmt;

use crate::codec::encode;
use crate::error::TurnoutError;
use crate::turnout::Turnout;

/// Token returned for any failed turnout command.
pub const COMMAND_FAILED_RESPONSE: &str = "<X>";

/// Successful command result: the turnout id and its new state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnoutStatus {
    /// Turnout id (not necessarily the address).
    pub id: u16,
    /// `true` when thrown.
    pub thrown: bool,
}

impl TurnoutStatus {
    /// Status of an existing turnout.
    pub fn of(turnout: &Turnout) -> Self {
        Self {
            id: turnout.id(),
            thrown: turnout.is_thrown(),
        }
    }
}

impl fmt::Display for TurnoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<H {} {}>", self.id, u8::from(self.thrown))
    }
}

/// Renders a registry command result as a protocol token.
pub fn response(result: &Result<TurnoutStatus, TurnoutError>) -> String {
    match result {
        Ok(status) => alloc::format!("{}", status),
        Err(_) => String::from(COMMAND_FAILED_RESPONSE),
    }
}

/// Appends the bulk status token `<H id board port state>` for one turnout.
pub fn write_bulk_status(out: &mut String, turnout: &Turnout) {
    use core::fmt::Write;

    let (board, port) = encode(turnout.address());
    let _ = write!(
        out,
        "<H {} {} {} {}>",
        turnout.id(),
        board,
        port,
        u8::from(turnout.is_thrown())
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turnout::TurnoutType;

    #[test]
    fn status_token() {
        let status = TurnoutStatus { id: 5, thrown: true };
        assert_eq!(status.to_string(), "<H 5 1>");
    }

    #[test]
    fn failed_result_renders_failure_token() {
        assert_eq!(response(&Err(TurnoutError::NotFound(3))), "<X>");
        assert_eq!(
            response(&Ok(TurnoutStatus { id: 7, thrown: false })),
            "<H 7 0>"
        );
    }

    #[test]
    fn bulk_status_uses_board_and_port() {
        let mut out = String::new();
        write_bulk_status(&mut out, &Turnout::dcc(10, Some(42), true, TurnoutType::Left));
        write_bulk_status(&mut out, &Turnout::dcc(1, None, false, TurnoutType::Left));
        assert_eq!(out, "<H 42 2 1 1><H 1 0 0 0>");
    }
}
