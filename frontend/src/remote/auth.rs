//! Auth service payloads and the persisted session.

use serde::{Deserialize, Serialize};
use shared::{User, UserId};

use crate::error::RemoteError;

/// Local-storage key holding the serialized [`Session`].
pub const SESSION_STORAGE_KEY: &str = "teamboard.auth.session";

/// Tokens are refreshed this many seconds before they actually expire.
const EXPIRY_MARGIN_SECS: i64 = 60;

const DEFAULT_DISPLAY_NAME: &str = "User";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl AuthUser {
    pub fn to_user(&self) -> User {
        let name = self
            .user_metadata
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_DISPLAY_NAME);

        User {
            id: self.id,
            name: name.to_string(),
            email: self.email.clone().unwrap_or_default(),
            avatar: self.user_metadata.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix seconds.
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl Session {
    pub fn is_expired(&self, now_secs: i64) -> bool {
        self.expires_at
            .map(|at| at - EXPIRY_MARGIN_SECS <= now_secs)
            .unwrap_or(false)
    }
}

/// What an authorized call must do before it can send a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenCheck {
    /// No session: calls go out with the anon key.
    Anonymous,
    Valid(String),
    /// The access token is expired or about to be; renew with this refresh token.
    Refresh(String),
}

pub fn check_token(session: Option<&Session>, now_secs: i64) -> TokenCheck {
    match session {
        None => TokenCheck::Anonymous,
        Some(session) if session.is_expired(now_secs) => TokenCheck::Refresh(session.refresh_token.clone()),
        Some(session) => TokenCheck::Valid(session.access_token.clone()),
    }
}

/// Body of a successful token grant.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl TokenResponse {
    pub fn into_session(self, now_secs: i64) -> Session {
        Session {
            expires_at: self.expires_at.or(self.expires_in.map(|secs| now_secs + secs)),
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            user: self.user,
        }
    }
}

/// Sign-up returns tokens when the project auto-confirms, and a bare user otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SignUpResponse {
    Session(TokenResponse),
    User(AuthUser),
}

#[derive(Debug, Serialize)]
pub struct PasswordGrant<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub struct RefreshGrant<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SignUpRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub data: SignUpData<'a>,
}

#[derive(Debug, Serialize)]
pub struct SignUpData<'a> {
    pub name: &'a str,
}

pub fn now_secs() -> i64 {
    (js_sys::Date::now() / 1000.0) as i64
}

fn local_storage() -> Result<web_sys::Storage, RemoteError> {
    web_sys::window()
        .ok_or_else(|| RemoteError::Storage("no window".to_string()))?
        .local_storage()
        .map_err(|e| RemoteError::Storage(format!("{:?}", e)))?
        .ok_or_else(|| RemoteError::Storage("local storage disabled".to_string()))
}

pub fn load_session() -> Option<Session> {
    let raw = local_storage().ok()?.get_item(SESSION_STORAGE_KEY).ok()??;
    parse_stored(&raw)
}

/// Decodes a stored session, treating a corrupt value as no session.
pub fn parse_stored(raw: &str) -> Option<Session> {
    match serde_json::from_str(raw) {
        Ok(session) => Some(session),
        Err(e) => {
            log::warn!("ignoring unreadable stored session: {}", e);
            None
        }
    }
}

pub fn store_session(session: &Session) -> Result<(), RemoteError> {
    let raw = serde_json::to_string(session)?;
    local_storage()?
        .set_item(SESSION_STORAGE_KEY, &raw)
        .map_err(|e| RemoteError::Storage(format!("{:?}", e)))
}

pub fn clear_session() -> Result<(), RemoteError> {
    local_storage()?
        .remove_item(SESSION_STORAGE_KEY)
        .map_err(|e| RemoteError::Storage(format!("{:?}", e)))
}
