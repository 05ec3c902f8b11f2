//! Request and response types for the turnout REST API.

use serde::{Deserialize, Serialize};

use crate::turnout::TurnoutType;

// ============================================================================
// Response Types
// ============================================================================

/// API response wrapper for consistent JSON structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (present when success=true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present when success=false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response with data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Result of a delete request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedResponse {
    /// Address that was removed
    pub address: u16,
}

// ============================================================================
// Request Types
// ============================================================================

/// Query string accepted by `/turnouts`.
///
/// `?address=12&type=2&id=40&readable=0&closed=..&thrown=..`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnoutQuery {
    /// Turnout address
    pub address: Option<u16>,
    /// `0` renders states as integers, anything else as tokens (default)
    pub readable: Option<u8>,
    /// Turnout type, 0..=4
    #[serde(rename = "type")]
    pub kind: Option<u8>,
    /// Turnout id
    pub id: Option<u16>,
    /// Closed event list (OpenLCB turnouts)
    pub closed: Option<String>,
    /// Thrown event list (OpenLCB turnouts)
    pub thrown: Option<String>,
}

impl TurnoutQuery {
    /// Whether states should be rendered as tokens.
    pub fn readable(&self) -> bool {
        self.readable.map_or(true, |readable| readable != 0)
    }

    /// The requested type, `Ok(None)` when not given.
    pub fn turnout_type(&self) -> Result<Option<TurnoutType>, String> {
        match self.kind {
            None => Ok(None),
            Some(kind) => TurnoutType::from_u8(kind)
                .map(Some)
                .ok_or_else(|| format!("Invalid turnout type {}", kind)),
        }
    }

    /// Whether this request describes an OpenLCB turnout.
    pub fn is_openlcb(&self) -> bool {
        self.closed.is_some() || self.thrown.is_some()
    }
}
