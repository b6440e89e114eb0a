// Error handling module
// Defines the failure kinds surfaced by the client

use std::fmt;

use thiserror::Error;

/// Errors returned by client operations
#[derive(Error, Debug)]
pub enum NbiError {
    /// No or wrong authentication mode for the requested operation
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A configuration value is out of its allowed range
    #[error("Invalid setting for {setting}: {message}")]
    InvalidSetting {
        setting: &'static str,
        message: String,
    },

    /// The HTTP exchange could not be established or completed
    #[error("Could not connect to server: {0}")]
    Transport(#[source] reqwest::Error),

    /// Unexpected status code or content type
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The response body could not be read
    #[error("Could not read server response: {0}")]
    ResponseBody(#[source] reqwest::Error),

    /// The token endpoint answered with something other than a token object
    #[error("Could not parse token response: {0}")]
    InvalidTokenResponse(#[source] serde_json::Error),

    /// The acquired token could not be decoded
    #[error("Could not decode token: {0}")]
    Decode(#[from] TokenError),
}

/// Unexpected response metadata
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("got status code {status} instead of 200")]
    UnexpectedStatus { status: u16 },

    #[error("Content-Type '{content_type}' returned instead of application/json")]
    UnexpectedContentType { content_type: String },
}

/// Token segment that failed to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Header,
    Payload,
    Signature,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Header => write!(f, "header"),
            Segment::Payload => write!(f, "payload"),
            Segment::Signature => write!(f, "signature"),
        }
    }
}

/// Failures while decoding a compact three-segment token
#[derive(Error, Debug)]
pub enum TokenError {
    /// The raw value does not split into exactly three segments
    #[error("token must have three dot-separated segments, found {found}")]
    Malformed { found: usize },

    /// A segment is not unpadded base64url
    #[error("{segment} segment is not valid base64url: {source}")]
    Encoding {
        segment: Segment,
        #[source]
        source: base64::DecodeError,
    },

    /// A decoded segment is not the expected JSON object
    #[error("{segment} segment is not a valid JSON object: {source}")]
    Structure {
        segment: Segment,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, NbiError>;
