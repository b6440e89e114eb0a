// Credential holder
// Tracks the active authentication mode and its secret material

use std::fmt;

use super::types::AuthMode;

/// Rendered in place of a secret by default display operations
pub const SECRET_MASK: &str = "***";

/// Authentication mode together with exactly the fields it needs
#[derive(Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    #[default]
    None,

    Basic { username: String, password: String },

    Bearer {
        client_id: String,
        client_secret: String,
    },
}

impl Credentials {
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn bearer(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Credentials::Bearer {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Replace the whole state with Basic credentials
    pub fn set_basic(&mut self, username: impl Into<String>, password: impl Into<String>) {
        *self = Self::basic(username, password);
    }

    /// Replace the whole state with OAuth client credentials
    pub fn set_bearer(&mut self, client_id: impl Into<String>, client_secret: impl Into<String>) {
        *self = Self::bearer(client_id, client_secret);
    }

    pub fn mode(&self) -> AuthMode {
        match self {
            Credentials::None => AuthMode::None,
            Credentials::Basic { .. } => AuthMode::Basic,
            Credentials::Bearer { .. } => AuthMode::Bearer,
        }
    }

    /// Username or client ID; empty when nothing is configured
    pub fn identifier(&self) -> &str {
        match self {
            Credentials::None => "",
            Credentials::Basic { username, .. } => username,
            Credentials::Bearer { client_id, .. } => client_id,
        }
    }

    /// Plain-text password or client secret
    pub fn reveal_secret(&self) -> &str {
        match self {
            Credentials::None => "",
            Credentials::Basic { password, .. } => password,
            Credentials::Bearer { client_secret, .. } => client_secret,
        }
    }

    /// `<mode>{<identifier>:<secret>}` with the secret masked unless `reveal_secret` is set
    pub fn describe(&self, reveal_secret: bool) -> String {
        let secret = if reveal_secret {
            self.reveal_secret()
        } else {
            SECRET_MASK
        };
        format!("{}{{{}:{}}}", self.mode().as_str(), self.identifier(), secret)
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe(false))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("mode", &self.mode())
            .field("identifier", &self.identifier())
            .field("secret", &SECRET_MASK)
            .finish()
    }
}
