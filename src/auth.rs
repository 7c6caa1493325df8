//! Sign-in and bearer tokens.
//!
//! The identity provider turns an OAuth authorization code into a verified
//! profile; the user row is upserted and an opaque random token is stored
//! server-side with an expiry.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{DrillError, Result};
use crate::store::SqliteStore;
use crate::user::{User, UserProfile};
use crate::vocabulary::UserId;

pub const TOKEN_TYPE: &str = "bearer";
const TOKEN_LEN: usize = 48;

const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleAuthRequest {
    pub code: String,
    pub redirect_uri: String,
    #[serde(default)]
    pub code_verifier: Option<String>,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Google OAuth is not configured on the server")]
    NotConfigured,

    #[error("{0}")]
    Rejected(String),

    #[error("Identity provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Exchanges an authorization code for a verified user profile
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn exchange_code(&self, request: &GoogleAuthRequest) -> std::result::Result<UserProfile, AuthError>;
}

#[derive(Debug, Deserialize)]
struct GoogleTokenResponse {
    access_token: String,
}

/// Google OAuth2 authorization-code flow
#[derive(Debug, Clone)]
pub struct GoogleIdentityProvider {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    token_url: String,
    userinfo_url: String,
}

impl GoogleIdentityProvider {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
        }
    }

    /// Point the provider at other endpoints (local fakes in tests)
    pub fn with_endpoints(mut self, token_url: impl Into<String>, userinfo_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self.userinfo_url = userinfo_url.into();
        self
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    async fn exchange_code(&self, request: &GoogleAuthRequest) -> std::result::Result<UserProfile, AuthError> {
        let mut form = vec![
            ("code", request.code.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", request.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];
        if let Some(verifier) = request.code_verifier.as_deref() {
            form.push(("code_verifier", verifier));
        }

        let response = self.client.post(&self.token_url).form(&form).send().await?;
        if !response.status().is_success() {
            warn!("Token exchange rejected with status {}", response.status());
            return Err(AuthError::Rejected("Failed to authenticate with Google".into()));
        }
        let tokens: GoogleTokenResponse = response.json().await?;

        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(&tokens.access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            warn!("Userinfo request rejected with status {}", response.status());
            return Err(AuthError::Rejected(
                "Failed to get user information from Google".into(),
            ));
        }

        Ok(response.json().await?)
    }
}

pub fn generate_token<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Upsert the user behind `profile` and hand out a fresh token
pub fn sign_in(store: &SqliteStore, profile: &UserProfile, ttl: Duration) -> Result<(User, AccessToken)> {
    let user = store.upsert_user(profile)?;
    let token = issue_token(store, user.id, ttl)?;
    Ok((user, token))
}

pub fn issue_token(store: &SqliteStore, user_id: UserId, ttl: Duration) -> Result<AccessToken> {
    let expires_at = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| DrillError::Config(format!("token lifetime {ttl} is out of range")))?;

    let token = generate_token(&mut rand::thread_rng());
    store.insert_session(&token, user_id, expires_at)?;
    debug!(user_id, "Issued access token");

    Ok(AccessToken {
        access_token: token,
        token_type: TOKEN_TYPE.to_string(),
    })
}

/// Resolve a bearer token to its user; unknown and expired tokens yield `None`
pub fn authenticate(store: &SqliteStore, token: &str, now: DateTime<Utc>) -> Result<Option<User>> {
    let Some((user_id, expires_at)) = store.find_session(token)? else {
        debug!("Unknown access token");
        return Ok(None);
    };

    if expires_at <= now {
        debug!(user_id, "Expired access token");
        store.delete_session(token)?;
        return Ok(None);
    }

    store.get_user(user_id)
}

pub fn revoke(store: &SqliteStore, token: &str) -> Result<bool> {
    store.delete_session(token)
}
