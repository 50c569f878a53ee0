use std::collections::HashSet;
use std::fs;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use librespot_oauth::{OAuthClient, OAuthClientBuilder, OAuthToken};
use rspotify::Token;

const SPOTIFY_CLIENT_ID: &str = "492e1e45ea814fa3ac555fe1576aaf5b";
const SPOTIFY_REDIRECT_URI: &str = "http://127.0.0.1:8898/login";
pub const SCOPES: &str = "user-read-playback-state user-modify-playback-state \
                          user-read-currently-playing user-library-read";

const RESPONSE: &str = r#"
<!doctype html>
<html>
<head><title>Success</title></head>
<body><h1>Mini Music can now read your library.</h1><script>window.close();</script></body>
</html>
"#;
const CACHE: &str = ".cache";
const SESSION_FILE: &str = ".cache/session.json";
/// A cached access token is reused only if it stays valid this long
const MIN_CACHED_VALIDITY_SECS: i64 = 300;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("authorization was not granted: {0}")]
    Denied(#[from] librespot_oauth::OAuthError),
    #[error("could not build OAuth client: {0}")]
    Client(String),
}

/// Access granted by the user
#[derive(Clone, Debug)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    fn from_oauth(token: OAuthToken) -> Self {
        let remaining = token.expires_at.saturating_duration_since(Instant::now());
        let remaining = chrono::Duration::from_std(remaining)
            .unwrap_or_else(|_| chrono::Duration::seconds(3600));
        Self {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            expires_at: Utc::now() + remaining,
        }
    }

    pub fn rspotify_token(&self) -> Token {
        Token {
            access_token: self.access_token.clone(),
            expires_in: self.expires_at - Utc::now(),
            expires_at: Some(self.expires_at),
            scopes: SCOPES
                .split_whitespace()
                .map(|s| s.to_string())
                .collect::<HashSet<String>>(),
            refresh_token: None,
        }
    }
}

fn oauth_client(open_browser: bool) -> Result<OAuthClient, AuthError> {
    let mut builder = OAuthClientBuilder::new(
        SPOTIFY_CLIENT_ID,
        SPOTIFY_REDIRECT_URI,
        SCOPES.split_whitespace().collect(),
    );
    if open_browser {
        builder = builder.open_in_browser().with_custom_message(RESPONSE);
    }
    builder.build().map_err(|e| AuthError::Client(e.to_string()))
}

impl Session {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "access_token": self.access_token,
            "refresh_token": self.refresh_token,
            "expires_at": self.expires_at.to_rfc3339(),
        })
    }

    fn from_json(value: &serde_json::Value) -> Option<Self> {
        let field = |name: &str| value.get(name).and_then(|v| v.as_str());
        let expires_at = DateTime::parse_from_rfc3339(field("expires_at")?)
            .ok()?
            .with_timezone(&Utc);
        Some(Self {
            access_token: field("access_token")?.to_string(),
            refresh_token: field("refresh_token")?.to_string(),
            expires_at,
        })
    }

    fn is_fresh(&self) -> bool {
        (self.expires_at - Utc::now()).num_seconds() > MIN_CACHED_VALIDITY_SECS
    }
}

fn store_session(session: &Session) {
    let result = serde_json::to_string_pretty(&session.to_json())
        .map_err(std::io::Error::from)
        .and_then(|json| fs::create_dir_all(CACHE).and_then(|_| fs::write(SESSION_FILE, json)));
    match result {
        Ok(()) => tracing::debug!("Saved session to disk"),
        Err(e) => tracing::warn!(error = %e, "Could not save session"),
    }
}

/// Run the browser-based OAuth flow. This is the only place the user is
/// prompted.
pub async fn authorize_in_browser() -> Result<Session, AuthError> {
    tracing::info!("Starting browser-based OAuth flow");
    let client = oauth_client(true)?;
    let token = client.get_access_token_async().await?;

    let session = Session::from_oauth(token);
    store_session(&session);
    tracing::info!("Browser authentication completed successfully");
    Ok(session)
}

/// Exchange a refresh token for a fresh session.
pub async fn refresh_session(refresh_token: &str) -> Result<Session> {
    let client = oauth_client(false)?;
    let token = client
        .refresh_token_async(refresh_token)
        .await
        .context("refreshing access token")?;

    let session = Session::from_oauth(token);
    store_session(&session);
    tracing::debug!("Token refreshed successfully");
    Ok(session)
}

/// Silently restore the previous session from disk, refreshing it if the
/// cached access token is about to expire. `Ok(None)` means nothing was
/// cached and the user has never been asked.
pub async fn restore_session() -> Result<Option<Session>> {
    let Ok(contents) = fs::read_to_string(SESSION_FILE) else {
        tracing::info!("No cached session found");
        return Ok(None);
    };

    let value: serde_json::Value =
        serde_json::from_str(&contents).context("Session cache is not valid JSON")?;
    let cached = Session::from_json(&value).context("Session cache is missing fields")?;

    if cached.is_fresh() {
        tracing::info!(expires_at = %cached.expires_at, "Reusing cached session");
        return Ok(Some(cached));
    }

    tracing::info!("Cached session expired, refreshing");
    let session = refresh_session(&cached.refresh_token).await?;
    Ok(Some(session))
}
