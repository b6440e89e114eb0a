// Authentication types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Active authentication mechanism
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Nothing configured yet; queries are refused
    None,

    /// HTTP Basic Auth with username and password on every query
    Basic,

    /// OAuth client credentials exchanged for a bearer token
    Bearer,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::None => "none",
            AuthMode::Basic => "basic",
            AuthMode::Bearer => "oauth",
        }
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token_type: String,
    pub access_token: String,
}

/// Decoded header segment of a bearer token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    #[serde(rename = "alg", default, deserialize_with = "null_as_default")]
    pub algorithm: String,

    #[serde(rename = "typ", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

/// Claims as they appear in the payload segment.
/// Every claim is optional; absent or null claims read as zero.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct PayloadClaims {
    #[serde(deserialize_with = "null_as_default")]
    pub iss: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sub: String,
    #[serde(deserialize_with = "null_as_default")]
    pub jti: String,
    #[serde(deserialize_with = "null_as_default")]
    pub roles: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub iat: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub nbf: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub exp: i64,
    #[serde(rename = "longLived", deserialize_with = "null_as_default")]
    pub long_lived: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Decoded payload segment of a bearer token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TokenPayload {
    pub issuer: String,
    pub subject: String,
    pub jwt_id: String,
    pub roles: Vec<String>,
    pub issued_at_unix: i64,
    pub not_before_unix: i64,
    pub expires_at_unix: i64,
    pub issued_at: DateTime<Utc>,
    pub not_before: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub long_lived: bool,
}

impl From<PayloadClaims> for TokenPayload {
    fn from(claims: PayloadClaims) -> Self {
        Self {
            issued_at: from_unix(claims.iat),
            not_before: from_unix(claims.nbf),
            expires_at: from_unix(claims.exp),
            issuer: claims.iss,
            subject: claims.sub,
            jwt_id: claims.jti,
            roles: claims.roles,
            issued_at_unix: claims.iat,
            not_before_unix: claims.nbf,
            expires_at_unix: claims.exp,
            long_lived: claims.long_lived,
        }
    }
}

/// Epoch seconds to UTC, clamped to the range chrono can represent
fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or(if secs > 0 {
        DateTime::<Utc>::MAX_UTC
    } else {
        DateTime::<Utc>::MIN_UTC
    })
}

/// Lifecycle state of the held token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// No token has been acquired
    Absent,
    Valid,
    Expired,
}
