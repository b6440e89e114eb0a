use anyhow::{Context, Result};
use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::AuthMode;
use crate::error::NbiError;

/// Default TCP port of the northbound interface
pub const DEFAULT_PORT: u16 = 8443;

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Allowed per-request timeout range in seconds
pub const TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 1..=300;

/// Media type required for request and response bodies
pub const JSON_MIME_TYPE: &str = "application/json";

const TOKEN_PATH: &str = "/oauth/token/access-token?grant_type=client_credentials";
const QUERY_PATH: &str = "/nbi/graphql";

/// URL scheme used to reach the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = NbiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(NbiError::InvalidSetting {
                setting: "scheme",
                message: format!("'{}' is neither http nor https", other),
            }),
        }
    }
}

/// Immutable connection settings for a client.
///
/// Setters consume the value and hand back an updated copy, so a config can be
/// shared freely once a client has been built from it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    scheme: Scheme,
    host: String,
    port: u16,
    timeout: Duration,
    verify_tls: bool,
    user_agent: String,
}

impl ClientConfig {
    /// HTTPS to port 8443 with strict certificate checking and a 5 second timeout
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            scheme: Scheme::Https,
            host: host.into(),
            port: DEFAULT_PORT,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            verify_tls: true,
            user_agent: default_user_agent(),
        }
    }

    pub fn with_scheme(self, scheme: Scheme) -> Self {
        Self { scheme, ..self }
    }

    pub fn with_port(self, port: u16) -> crate::Result<Self> {
        if port == 0 {
            return Err(NbiError::InvalidSetting {
                setting: "port",
                message: "port out of range (1 - 65535)".to_string(),
            });
        }
        Ok(Self { port, ..self })
    }

    pub fn with_timeout_secs(self, seconds: u64) -> crate::Result<Self> {
        if !TIMEOUT_RANGE_SECS.contains(&seconds) {
            return Err(NbiError::InvalidSetting {
                setting: "timeout",
                message: format!(
                    "timeout out of range ({} - {})",
                    TIMEOUT_RANGE_SECS.start(),
                    TIMEOUT_RANGE_SECS.end()
                ),
            });
        }
        Ok(Self {
            timeout: Duration::from_secs(seconds),
            ..self
        })
    }

    /// Toggle certificate verification; disabling it accepts any server certificate
    pub fn with_tls_verification(self, verify_tls: bool) -> Self {
        Self { verify_tls, ..self }
    }

    pub fn with_user_agent(self, user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            ..self
        }
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn verify_tls(&self) -> bool {
        self.verify_tls
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// `{scheme}://{host}:{port}`
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    /// Endpoint that exchanges client credentials for a bearer token
    pub fn token_url(&self) -> String {
        format!("{}{}", self.base_url(), TOKEN_PATH)
    }

    /// Endpoint that accepts GraphQL queries
    pub fn query_url(&self) -> String {
        format!("{}{}", self.base_url(), QUERY_PATH)
    }
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// NBI Client - send GraphQL queries to the northbound interface
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Server hostname or IP address
    #[arg(short = 'H', long, env = "NBI_HOST")]
    pub host: String,

    /// Server port
    #[arg(short, long, env = "NBI_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// URL scheme (http, https)
    #[arg(long, env = "NBI_SCHEME", default_value = "https")]
    pub scheme: Scheme,

    /// HTTP request timeout in seconds (1 - 300)
    #[arg(short, long, env = "NBI_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Accept any server certificate
    #[arg(long, env = "NBI_INSECURE")]
    pub insecure: bool,

    /// Authentication method (basic, oauth)
    #[arg(short, long, env = "NBI_AUTH", default_value = "oauth")]
    pub auth: String,

    /// Username (basic) or client ID (oauth)
    #[arg(short, long, env = "NBI_USER")]
    pub user: String,

    /// Password (basic) or client secret (oauth)
    #[arg(short, long, env = "NBI_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Override the User-Agent header
    #[arg(long, env = "NBI_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Read the query from a file instead of the command line
    #[arg(short, long, conflicts_with = "query")]
    pub file: Option<PathBuf>,

    /// Acquire an OAuth token and print its decoded contents instead of querying
    #[arg(long)]
    pub show_token: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    pub log_level: String,

    /// GraphQL query; read from stdin when neither this nor --file is given
    pub query: Option<String>,
}

impl CliArgs {
    /// Load arguments with priority: CLI > ENV (including .env) > defaults
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        Self::parse()
    }

    /// Build the client configuration from the parsed arguments
    pub fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::new(&self.host)
            .with_scheme(self.scheme)
            .with_port(self.port)?
            .with_timeout_secs(self.timeout)?
            .with_tls_verification(!self.insecure);
        if let Some(ref ua) = self.user_agent {
            config = config.with_user_agent(ua);
        }
        Ok(config)
    }

    /// Authentication mode requested on the command line
    pub fn auth_mode(&self) -> Result<AuthMode> {
        parse_auth_mode(&self.auth)
            .with_context(|| format!("Unknown auth method '{}' (use basic or oauth)", self.auth))
    }

    pub fn secret(&self) -> Result<&str> {
        self.secret
            .as_deref()
            .context("NBI_SECRET is required (use -s or set NBI_SECRET env var)")
    }
}

/// Parse an authentication mode name; NoAuth cannot be requested
fn parse_auth_mode(s: &str) -> Option<AuthMode> {
    match s.to_lowercase().as_str() {
        "basic" => Some(AuthMode::Basic),
        "oauth" | "bearer" => Some(AuthMode::Bearer),
        _ => None,
    }
}
