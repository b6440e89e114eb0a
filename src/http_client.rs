use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, USER_AGENT};
use serde_json::json;
use std::fmt;

use crate::auth::refresh::{read_json_body, request_token, transport_error};
use crate::auth::{BearerToken, Credentials, TokenManager, TokenState};
use crate::config::{ClientConfig, JSON_MIME_TYPE};
use crate::error::{NbiError, Result};

/// Client for the northbound GraphQL interface.
///
/// Exchanges are blocking and bounded by the configured timeout. The held
/// OAuth token is guarded internally, so a client may be shared between
/// threads behind an `Arc`; changing credentials requires exclusive access.
pub struct NbiClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    config: ClientConfig,

    credentials: Credentials,

    /// Bearer token for OAuth mode
    tokens: TokenManager,
}

impl NbiClient {
    /// Create a client without credentials; set them before querying
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_tls())
            .build()
            .map_err(|e| NbiError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        if !config.verify_tls() {
            tracing::warn!(host = %config.host(), "TLS certificate verification disabled");
        }

        Ok(Self {
            client,
            config,
            credentials: Credentials::None,
            tokens: TokenManager::new(),
        })
    }

    /// Create a client with credentials already set
    pub fn with_credentials(config: ClientConfig, credentials: Credentials) -> Result<Self> {
        let mut client = Self::new(config)?;
        client.credentials = credentials;
        Ok(client)
    }

    /// Authenticate every query with HTTP Basic Auth
    pub fn use_basic_auth(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.credentials.set_basic(username, password);
        self.tokens.clear();
    }

    /// Authenticate with OAuth client credentials and a bearer token
    pub fn use_oauth(&mut self, client_id: impl Into<String>, client_secret: impl Into<String>) {
        self.credentials.set_bearer(client_id, client_secret);
        self.tokens.clear();
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Copy of the currently held bearer token
    pub fn token(&self) -> BearerToken {
        self.tokens.snapshot()
    }

    pub fn token_state(&self) -> TokenState {
        self.tokens.state()
    }

    /// Obtain a new OAuth token and store it in the client.
    /// A failed attempt leaves any previously held token in place.
    pub fn acquire_token(&self) -> Result<()> {
        let (client_id, client_secret) = self.oauth_credentials()?;
        self.tokens
            .refresh(|| request_token(&self.client, &self.config, client_id, client_secret))
    }

    /// Send a GraphQL query and return the raw JSON response body
    pub fn submit_query(&self, query: &str) -> Result<String> {
        let authorization = self.authorization_header()?;

        let url = self.config.query_url();
        let body = json!({ "query": query });

        tracing::debug!(
            url = %url,
            mode = self.credentials.mode().as_str(),
            "Sending query"
        );

        let mut request = self
            .client
            .post(&url)
            .header(USER_AGENT, self.config.user_agent())
            .header(CACHE_CONTROL, "no-cache")
            .header(CONTENT_TYPE, JSON_MIME_TYPE)
            .header(ACCEPT, JSON_MIME_TYPE)
            .json(&body);

        request = match authorization {
            Authorization::Basic { username, password } => {
                request.basic_auth(username, Some(password))
            }
            Authorization::Bearer(value) => request.header(AUTHORIZATION, value),
        };

        let response = request.send().map_err(|e| transport_error(e, &url))?;
        let body = read_json_body(response, &url)?;

        tracing::debug!(bytes = body.len(), "Query successful");
        Ok(body)
    }

    /// Pick the authentication for a query, refreshing an invalid token once
    fn authorization_header(&self) -> Result<Authorization<'_>> {
        match &self.credentials {
            Credentials::None => Err(NbiError::Configuration(
                "no authentication method defined".to_string(),
            )),
            Credentials::Basic { username, password } => {
                Ok(Authorization::Basic { username, password })
            }
            Credentials::Bearer {
                client_id,
                client_secret,
            } => {
                let value = self.tokens.authorization(|| {
                    request_token(&self.client, &self.config, client_id, client_secret)
                })?;
                Ok(Authorization::Bearer(value))
            }
        }
    }

    fn oauth_credentials(&self) -> Result<(&str, &str)> {
        match &self.credentials {
            Credentials::Bearer {
                client_id,
                client_secret,
            } => Ok((client_id.as_str(), client_secret.as_str())),
            other => Err(NbiError::Configuration(format!(
                "auth type is {} instead of oauth",
                other.mode().as_str()
            ))),
        }
    }
}

/// `{scheme}://{masked credentials}@{host}:{port}/`
impl fmt::Display for NbiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}://{}@{}:{}/",
            self.config.scheme(),
            self.credentials,
            self.config.host(),
            self.config.port()
        )
    }
}

impl fmt::Debug for NbiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NbiClient")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .field("token_state", &self.token_state())
            .finish()
    }
}

enum Authorization<'a> {
    Basic { username: &'a str, password: &'a str },
    Bearer(String),
}
