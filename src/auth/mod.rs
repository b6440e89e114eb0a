// Authentication module
// Credential modes, bearer token decoding and token lifecycle

mod credentials;
mod manager;
pub(crate) mod refresh;
mod token;
mod types;

pub use credentials::{Credentials, SECRET_MASK};
pub use manager::TokenManager;
pub use token::BearerToken;
pub use types::{AuthMode, TokenHeader, TokenPayload, TokenResponse, TokenState};
