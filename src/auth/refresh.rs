// Token acquisition
// Exchanges OAuth client credentials for a bearer token

use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, CACHE_CONTROL, CONTENT_TYPE, USER_AGENT};

use super::token::BearerToken;
use super::types::TokenResponse;
use crate::config::{ClientConfig, JSON_MIME_TYPE};
use crate::error::{NbiError, ProtocolError, Result};

/// Request a fresh token from the token endpoint.
/// The client ID and secret authenticate the request via HTTP Basic Auth.
pub fn request_token(
    client: &Client,
    config: &ClientConfig,
    client_id: &str,
    client_secret: &str,
) -> Result<BearerToken> {
    let url = config.token_url();
    tracing::debug!(url = %url, client_id = %client_id, "Requesting OAuth token");

    let response = client
        .post(&url)
        .header(USER_AGENT, config.user_agent())
        .header(CACHE_CONTROL, "no-cache")
        .header(ACCEPT, JSON_MIME_TYPE)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .basic_auth(client_id, Some(client_secret))
        .send()
        .map_err(|e| transport_error(e, &url))?;

    let body = read_json_body(response, &url)?;

    let data: TokenResponse =
        serde_json::from_str(&body).map_err(NbiError::InvalidTokenResponse)?;
    let token = BearerToken::decode(data.token_type, data.access_token)?;

    tracing::info!(
        jti = %token.payload().jwt_id,
        expires_at = %token.payload().expires_at.to_rfc3339(),
        "OAuth token acquired"
    );

    Ok(token)
}

/// Check status and content type, then read the body as text
pub(crate) fn read_json_body(response: Response, url: &str) -> Result<String> {
    let status = response.status();
    if status != reqwest::StatusCode::OK {
        tracing::warn!(status = %status, url = %url, "Unexpected response status");
        return Err(ProtocolError::UnexpectedStatus {
            status: status.as_u16(),
        }
        .into());
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !content_type.starts_with(JSON_MIME_TYPE) {
        tracing::warn!(content_type = %content_type, url = %url, "Unexpected content type");
        return Err(ProtocolError::UnexpectedContentType { content_type }.into());
    }

    response.text().map_err(|e| {
        tracing::error!(error = %e, url = %url, "Failed to read response body");
        NbiError::ResponseBody(e)
    })
}

/// Log a failed exchange with its category and wrap it
pub(crate) fn transport_error(e: reqwest::Error, url: &str) -> NbiError {
    let error_kind = if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connection_failed"
    } else if e.is_request() {
        "request_error"
    } else if e.is_body() {
        "body_error"
    } else if e.is_decode() {
        "decode_error"
    } else {
        "unknown"
    };

    tracing::error!(
        error_kind = error_kind,
        error = %e,
        url = %url,
        "HTTP request failed"
    );

    NbiError::Transport(e)
}
