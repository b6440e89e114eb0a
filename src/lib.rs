// NBI Client - Library root
//
// Authenticated GraphQL queries against the management platform's
// northbound interface, using either HTTP Basic Auth or OAuth client
// credentials with on-demand bearer token refresh.

pub mod auth;
pub mod config;
pub mod error;
pub mod http_client;

pub use auth::{AuthMode, BearerToken, Credentials, TokenState};
pub use config::{ClientConfig, Scheme};
pub use error::{NbiError, ProtocolError, Result, TokenError};
pub use http_client::NbiClient;
