//! Authentication module
//!
//! GitLab credentials come from a Personal Access Token or, for instances
//! behind SSO, from an exported browser cookie file.

pub mod cookie;
pub mod provider;
pub mod token;

pub use cookie::CookieFileProvider;
pub use provider::{AuthHeader, AuthProvider, BoxedAuthProvider};
pub use token::PatProvider;

use crate::config::GitLabConfig;
use crate::error::AuthError;

/// Create an auth provider from configuration
///
/// Token from config, then cookie file, then token variables.
pub fn create_auth_provider(config: &GitLabConfig) -> Result<BoxedAuthProvider, AuthError> {
    if let Some(token) = config.token.as_deref().filter(|t| !t.trim().is_empty()) {
        return Ok(Box::new(PatProvider::new(token)?));
    }

    if let Some(path) = &config.auth_cookie_path {
        return Ok(Box::new(CookieFileProvider::new(path)?));
    }

    Ok(Box::new(PatProvider::from_env()?))
}
