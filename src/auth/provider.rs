//! Authentication provider trait

use crate::error::AuthError;
use crate::util::SecretString;
// async_trait required for dyn-compatibility with Box<dyn AuthProvider>
use async_trait::async_trait;

/// Supplies credentials for GitLab requests.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Header to attach to the next request
    async fn get_auth_header(&self) -> Result<AuthHeader, AuthError>;

    /// Whether the credentials changed since they were last loaded
    fn needs_refresh(&self) -> bool;

    /// Reload the credentials
    async fn refresh(&mut self) -> Result<(), AuthError>;

    /// Description of the auth method (for logging)
    fn auth_type(&self) -> &'static str;
}

/// Authentication header to use with requests
#[derive(Debug, Clone)]
pub enum AuthHeader {
    /// `Authorization: Bearer ...`
    Bearer(SecretString),
    /// `PRIVATE-TOKEN: ...`
    PrivateToken(SecretString),
    /// `Cookie: name=value; ...`
    Cookie(SecretString),
}

impl AuthHeader {
    pub fn header_name(&self) -> &'static str {
        match self {
            AuthHeader::Bearer(_) => "Authorization",
            AuthHeader::PrivateToken(_) => "PRIVATE-TOKEN",
            AuthHeader::Cookie(_) => "Cookie",
        }
    }

    pub fn header_value(&self) -> String {
        match self {
            AuthHeader::Bearer(token) => format!("Bearer {}", token.expose_secret()),
            AuthHeader::PrivateToken(token) => token.expose_secret().to_string(),
            AuthHeader::Cookie(cookies) => cookies.expose_secret().to_string(),
        }
    }
}

/// Box type alias for auth providers
pub type BoxedAuthProvider = Box<dyn AuthProvider>;
