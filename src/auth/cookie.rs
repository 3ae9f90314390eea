//! Cookie file authentication
//!
//! Reads a Netscape-format cookie jar (as written by curl or browser
//! exporters) and sends its cookies with every request. The file is re-read
//! whenever its modification time changes.

use crate::auth::provider::{AuthHeader, AuthProvider};
use crate::error::AuthError;
use crate::util::SecretString;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::debug;

#[derive(Debug)]
pub struct CookieFileProvider {
    path: PathBuf,
    cookies: SecretString,
    loaded_at: Option<SystemTime>,
}

impl CookieFileProvider {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let path = PathBuf::from(shellexpand::tilde(&path.as_ref().to_string_lossy()).as_ref());
        let content = std::fs::read_to_string(&path).map_err(|e| cookie_error(&path, e))?;
        let cookies = parse_cookie_file(&content);
        if cookies.is_empty() {
            return Err(AuthError::CookieFile {
                path: path.display().to_string(),
                reason: "no cookies found".to_string(),
            });
        }

        Ok(Self {
            loaded_at: modified(&path),
            cookies: SecretString::new(cookies),
            path,
        })
    }
}

fn cookie_error(path: &Path, e: std::io::Error) -> AuthError {
    AuthError::CookieFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Netscape format: `domain  flag  path  secure  expiry  name  value`,
/// tab separated. `#HttpOnly_` prefixed lines are cookies, other `#` lines
/// are comments.
pub fn parse_cookie_file(content: &str) -> String {
    content
        .lines()
        .filter_map(|line| {
            let line = line.strip_prefix("#HttpOnly_").unwrap_or(line);
            if line.trim().is_empty() || line.starts_with('#') {
                return None;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 7 {
                return None;
            }
            Some(format!("{}={}", fields[5].trim(), fields[6].trim()))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[async_trait]
impl AuthProvider for CookieFileProvider {
    async fn get_auth_header(&self) -> Result<AuthHeader, AuthError> {
        Ok(AuthHeader::Cookie(self.cookies.clone()))
    }

    fn needs_refresh(&self) -> bool {
        modified(&self.path) != self.loaded_at
    }

    async fn refresh(&mut self) -> Result<(), AuthError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| cookie_error(&self.path, e))?;
        self.cookies = SecretString::new(parse_cookie_file(&content));
        self.loaded_at = modified(&self.path);
        debug!(path = %self.path.display(), "Reloaded cookie file");
        Ok(())
    }

    fn auth_type(&self) -> &'static str {
        "Cookie file"
    }
}
