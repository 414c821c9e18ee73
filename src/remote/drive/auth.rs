//! OAuth2 installed-app flow and token cache for Google Drive.
//!
//! The first use prints an authorization URL, reads the code the user
//! pastes back, and exchanges it for tokens.  Tokens are cached in a
//! JSON file (owner-only) and refreshed when the access token expires.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::errors::{Result, StashError};

/// OAuth2 authorization endpoint.
const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";
/// OAuth2 token endpoint.
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
/// Full Drive scope: stash reads objects it did not create (shared vaults).
const DRIVE_SCOPE: &str = "https://www.googleapis.com/auth/drive";

/// Client registration and token cache location.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub token_path: PathBuf,
}

/// Cached OAuth2 tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl Tokens {
    /// Expired, or less than a minute left.
    pub fn is_expired(&self) -> bool {
        self.expires_at < Utc::now() + Duration::minutes(1)
    }
}

/// Shape of the token endpoint's JSON response.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TokenResponse {
    fn into_tokens(self, previous_refresh: Option<String>) -> Tokens {
        Tokens {
            access_token: self.access_token,
            // Refresh responses usually omit the refresh token; keep the old one.
            refresh_token: self.refresh_token.or(previous_refresh),
            expires_at: Utc::now() + Duration::seconds(self.expires_in),
        }
    }
}

/// Hands out a valid access token, authorizing or refreshing as needed.
pub struct TokenManager {
    config: DriveConfig,
    tokens: RefCell<Option<Tokens>>,
}

impl TokenManager {
    pub fn new(config: DriveConfig) -> Self {
        let cached = read_token_cache(&config.token_path);
        Self {
            config,
            tokens: RefCell::new(cached),
        }
    }

    /// Return a bearer token that is valid right now.
    pub fn access_token(&self) -> Result<String> {
        let current = self.tokens.borrow().clone();

        let tokens = match current {
            Some(t) if !t.is_expired() => return Ok(t.access_token),
            Some(Tokens {
                refresh_token: Some(refresh),
                ..
            }) => match self.refresh(&refresh) {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(error = %e, "token refresh failed, re-authorizing");
                    self.authorize_interactively()?
                }
            },
            _ => self.authorize_interactively()?,
        };

        write_token_cache(&self.config.token_path, &tokens)?;
        let access = tokens.access_token.clone();
        *self.tokens.borrow_mut() = Some(tokens);
        Ok(access)
    }

    /// URL the user opens to grant access.
    pub fn authorization_url(&self) -> String {
        format!(
            "{AUTH_URL}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&state=state-token",
            encode(&self.config.client_id),
            encode(&self.config.redirect_uri),
            encode(DRIVE_SCOPE),
        )
    }

    fn authorize_interactively(&self) -> Result<Tokens> {
        eprintln!(
            "Go to the following link in your browser, then paste the authorization code:\n{}",
            self.authorization_url()
        );
        let code: String = dialoguer::Input::new()
            .with_prompt("Authorization code")
            .interact_text()
            .map_err(|e| StashError::Remote(format!("authorization prompt: {e}")))?;

        self.exchange_code(code.trim())
    }

    fn exchange_code(&self, code: &str) -> Result<Tokens> {
        let mut resp = ureq::post(TOKEN_URL)
            .send_form([
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .map_err(|e| StashError::Remote(format!("token exchange failed: {e}")))?;
        let response: TokenResponse = resp
            .body_mut()
            .read_json()
            .map_err(|e| StashError::Remote(format!("token exchange response: {e}")))?;

        tracing::info!("authorized Google Drive access");
        Ok(response.into_tokens(None))
    }

    fn refresh(&self, refresh_token: &str) -> Result<Tokens> {
        let mut resp = ureq::post(TOKEN_URL)
            .send_form([
                ("refresh_token", refresh_token),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .map_err(|e| StashError::Remote(format!("token refresh failed: {e}")))?;
        let response: TokenResponse = resp
            .body_mut()
            .read_json()
            .map_err(|e| StashError::Remote(format!("token refresh response: {e}")))?;

        tracing::debug!("refreshed Google Drive access token");
        Ok(response.into_tokens(Some(refresh_token.to_string())))
    }
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

/// Read cached tokens; a missing or unreadable cache just means "authorize".
fn read_token_cache(path: &Path) -> Option<Tokens> {
    let content = fs::read_to_string(path).ok()?;
    serde_json::from_str(&content).ok()
}

fn write_token_cache(path: &Path, tokens: &Tokens) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    let content = serde_json::to_string_pretty(tokens)
        .map_err(|e| StashError::Encoding(format!("token cache: {e}")))?;
    fs::write(path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &Path) -> DriveConfig {
        DriveConfig {
            client_id: "client id&x".into(),
            client_secret: "secret".into(),
            redirect_uri: "urn:ietf:wg:oauth:2.0:oob".into(),
            token_path: dir.join("token.json"),
        }
    }

    #[test]
    fn expiry_has_a_margin() {
        let fresh = Tokens {
            access_token: "a".into(),
            refresh_token: None,
            expires_at: Utc::now() + Duration::hours(1),
        };
        assert!(!fresh.is_expired());

        let almost = Tokens {
            expires_at: Utc::now() + Duration::seconds(30),
            ..fresh
        };
        assert!(almost.is_expired());
    }

    #[test]
    fn authorization_url_is_encoded() {
        let dir = TempDir::new().unwrap();
        let manager = TokenManager::new(config(dir.path()));
        let url = manager.authorization_url();
        assert!(url.starts_with(AUTH_URL));
        assert!(url.contains("client_id=client%20id%26x"));
        assert!(url.contains("redirect_uri=urn%3Aietf%3Awg%3Aoauth%3A2%2E0%3Aoob"));
        assert!(url.contains("access_type=offline"));
    }

    #[test]
    fn cached_valid_token_is_used_without_network() {
        let dir = TempDir::new().unwrap();
        let cfg = config(dir.path());
        let tokens = Tokens {
            access_token: "cached-token".into(),
            refresh_token: Some("r".into()),
            expires_at: Utc::now() + Duration::hours(1),
        };
        write_token_cache(&cfg.token_path, &tokens).unwrap();

        let manager = TokenManager::new(cfg);
        assert_eq!(manager.access_token().unwrap(), "cached-token");
    }

    #[test]
    fn refresh_response_keeps_previous_refresh_token() {
        let response = TokenResponse {
            access_token: "new".into(),
            expires_in: 3600,
            refresh_token: None,
        };
        let tokens = response.into_tokens(Some("old-refresh".into()));
        assert_eq!(tokens.refresh_token.as_deref(), Some("old-refresh"));
        assert!(!tokens.is_expired());
    }

    #[test]
    fn corrupt_cache_is_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "not json").unwrap();
        assert!(read_token_cache(&path).is_none());
    }
}
