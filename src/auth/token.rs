//! Personal Access Token authentication

use crate::auth::provider::{AuthHeader, AuthProvider};
use crate::error::AuthError;
use crate::util::SecretString;
use async_trait::async_trait;

/// Variables checked by [`PatProvider::from_env`], in order
const TOKEN_ENV_VARS: &[&str] = &["GITLAB_TOKEN", "GITLAB_PERSONAL_ACCESS_TOKEN"];

/// Personal Access Token authentication provider
#[derive(Debug, Clone)]
pub struct PatProvider {
    token: SecretString,
}

impl PatProvider {
    pub fn new(token: impl Into<String>) -> Result<Self, AuthError> {
        let token = SecretString::new(token.into().trim());

        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        // glpat- prefix is not enforced, older tokens do not have it
        Ok(Self { token })
    }

    /// First non-empty token among `GITLAB_TOKEN` and `GITLAB_PERSONAL_ACCESS_TOKEN`
    pub fn from_env() -> Result<Self, AuthError> {
        for var in TOKEN_ENV_VARS {
            if let Ok(token) = std::env::var(var)
                && !token.trim().is_empty()
            {
                return Self::new(token);
            }
        }

        Err(AuthError::NotConfigured)
    }
}

#[async_trait]
impl AuthProvider for PatProvider {
    async fn get_auth_header(&self) -> Result<AuthHeader, AuthError> {
        Ok(AuthHeader::PrivateToken(self.token.clone()))
    }

    fn needs_refresh(&self) -> bool {
        false
    }

    async fn refresh(&mut self) -> Result<(), AuthError> {
        Ok(())
    }

    fn auth_type(&self) -> &'static str {
        "Personal Access Token"
    }
}
