#![warn(missing_docs)]
//! # cyber-shield-auth
//!
//! ## Purpose
//! Implements the login/signup/logout boundary, profile editing and the
//! cookie-backed session lifecycle for `cyber-shield`.
//!
//! ## Responsibilities
//! - Validate login, signup and profile forms.
//! - Look up, register and update users through an injectable
//!   [`UserDirectory`].
//! - Issue [`SessionCookie`] values and model session transitions.
//!
//! ## Data flow
//! Form fields -> [`AuthService::login`] / [`AuthService::signup`] /
//! [`AuthService::update_profile`] -> [`UserDirectory`] -> [`SessionCookie`]
//! -> [`SessionState`] updates.
//!
//! ## Ownership and lifetimes
//! Session values own their strings so they can be stored in cookies and
//! state independently of the directory.
//!
//! ## Error model
//! Form problems, bad credentials and duplicate emails surface as
//! [`AuthError`] with the message shown on the form. Internal failures map to
//! a generic message for the [`AuthAction`] that was attempted.
//!
//! ## Security and privacy notes
//! Passwords are compared as SHA-256 digests and never logged. Session cookies
//! carry the user record without its digest. No further hardening is applied.
//!
//! ## Example
//! ```rust
//! use cyber_shield_auth::SessionState;
//!
//! let state = SessionState::new();
//! assert!(!state.is_signed_in(0));
//! ```

use std::sync::Arc;

use cyber_shield_store::{MemoryStore, NewUser, ProfileUpdate, ScamStore, StoreError, User};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use url::Url;

/// Server-side http-only session cookie name.
pub const SESSION_COOKIE: &str = "cyber-shield-user";

/// Client-readable session mirror cookie name.
pub const CLIENT_SESSION_COOKIE: &str = "cyber-shield-user-client";

/// Session lifetime: one week.
pub const SESSION_MAX_AGE_SECONDS: u64 = 60 * 60 * 24 * 7;

/// Minimum signup and profile name length.
pub const MIN_NAME_CHARS: usize = 2;

/// Maximum profile name length.
pub const MAX_NAME_CHARS: usize = 50;

/// Minimum signup password length.
pub const MIN_PASSWORD_CHARS: usize = 8;

/// Login form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Signup form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupForm {
    /// Display name.
    pub name: String,
    /// Account email.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Profile edit form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileForm {
    /// Display name.
    pub name: String,
    /// Absolute avatar URL, or empty to clear it.
    pub avatar_url: String,
}

/// Signed-in user record stored in the session cookies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCookie {
    /// User id.
    pub user_id: String,
    /// Display name.
    pub name: String,
    /// Email.
    pub email: String,
    /// Profile picture URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    /// Absolute epoch milliseconds when the session expires.
    pub expires_at_ms: u64,
}

impl SessionCookie {
    /// Issues a one-week session for `user`.
    pub fn issue(user: &User, now_ms: u64) -> Self {
        Self {
            user_id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
            expires_at_ms: now_ms.saturating_add(SESSION_MAX_AGE_SECONDS.saturating_mul(1000)),
        }
    }

    /// Returns `true` when the session has expired at `now_ms`.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at_ms
    }

    /// Encodes the cookie value.
    ///
    /// # Errors
    /// Returns [`AuthError::Cookie`] when encoding fails.
    pub fn to_cookie_value(&self) -> Result<String, AuthError> {
        serde_json::to_string(self).map_err(|error| AuthError::Cookie(error.to_string()))
    }

    /// Decodes a cookie value.
    ///
    /// # Errors
    /// Returns [`AuthError::Cookie`] for malformed values.
    pub fn from_cookie_value(raw: &str) -> Result<Self, AuthError> {
        serde_json::from_str(raw).map_err(|error| AuthError::Cookie(error.to_string()))
    }
}

/// Session lifecycle as seen by request handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session cookie.
    Anonymous,
    /// Valid session.
    SignedIn(SessionCookie),
    /// Cookie present but past its expiry.
    Expired,
}

/// Session state machine with explicit transitions.
#[derive(Debug, Clone)]
pub struct SessionState {
    phase: SessionPhase,
}

impl SessionState {
    /// Creates an anonymous session.
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Anonymous,
        }
    }

    /// Returns the current phase.
    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    /// Applies a successful login or signup.
    pub fn on_sign_in(&mut self, cookie: SessionCookie) {
        self.phase = SessionPhase::SignedIn(cookie);
    }

    /// Re-evaluates expiry.
    pub fn on_tick(&mut self, now_ms: u64) {
        if matches!(&self.phase, SessionPhase::SignedIn(cookie) if cookie.is_expired(now_ms)) {
            self.phase = SessionPhase::Expired;
        }
    }

    /// Returns to anonymous and names the cookies the caller must expire.
    pub fn logout(&mut self) -> [&'static str; 2] {
        self.phase = SessionPhase::Anonymous;
        [SESSION_COOKIE, CLIENT_SESSION_COOKIE]
    }

    /// Returns `true` when a valid session exists.
    pub fn is_signed_in(&self, now_ms: u64) -> bool {
        matches!(
            &self.phase,
            SessionPhase::SignedIn(cookie) if !cookie.is_expired(now_ms)
        )
    }

    /// Returns the signed-in user id, if any.
    pub fn user_id(&self, now_ms: u64) -> Option<&str> {
        match &self.phase {
            SessionPhase::SignedIn(cookie) if !cookie.is_expired(now_ms) => {
                Some(cookie.user_id.as_str())
            }
            _ => None,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// User lookup, registration and profile updates used by [`AuthService`].
pub trait UserDirectory: Send + Sync {
    /// Finds a user by exact email.
    fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;
    /// Registers a user.
    fn create(&self, user: NewUser) -> Result<User, AuthError>;
    /// Replaces a user's profile fields.
    fn update(&self, user_id: &str, update: ProfileUpdate) -> Result<User, AuthError>;
}

impl UserDirectory for MemoryStore {
    fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        self.user_by_email(email).map_err(AuthError::Directory)
    }

    fn create(&self, user: NewUser) -> Result<User, AuthError> {
        self.add_user(user).map_err(AuthError::Directory)
    }

    fn update(&self, user_id: &str, update: ProfileUpdate) -> Result<User, AuthError> {
        self.update_user(user_id, update).map_err(AuthError::Directory)
    }
}

/// Login/signup service over a [`UserDirectory`].
#[derive(Clone)]
pub struct AuthService {
    directory: Arc<dyn UserDirectory>,
}

impl AuthService {
    /// Creates a service over `directory`.
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    /// Verifies credentials and issues a session.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidForm`] for a malformed email and
    /// [`AuthError::InvalidCredentials`] for unknown users or wrong passwords.
    pub fn login(&self, form: &LoginForm, now_ms: u64) -> Result<SessionCookie, AuthError> {
        if !is_valid_email(&form.email) {
            return Err(AuthError::InvalidForm);
        }

        let user = self
            .directory
            .find_by_email(&form.email)?
            .ok_or(AuthError::InvalidCredentials)?;

        let expected = user
            .password_digest
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;
        if expected != password_digest(&form.password) {
            tracing::info!(user_id = %user.id, "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(user_id = %user.id, "login succeeded");
        Ok(SessionCookie::issue(&user, now_ms))
    }

    /// Registers a new account and issues a session.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidForm`] when the name, email or password
    /// fail their checks and [`AuthError::EmailTaken`] for a registered email.
    pub fn signup(&self, form: &SignupForm, now_ms: u64) -> Result<SessionCookie, AuthError> {
        if form_len(&form.name) < MIN_NAME_CHARS
            || !is_valid_email(&form.email)
            || form_len(&form.password) < MIN_PASSWORD_CHARS
        {
            return Err(AuthError::InvalidForm);
        }

        if self.directory.find_by_email(&form.email)?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let user = self.directory.create(NewUser {
            name: form.name.clone(),
            email: form.email.clone(),
            password_digest: Some(password_digest(&form.password)),
        })?;

        Ok(SessionCookie::issue(&user, now_ms))
    }

    /// Saves profile edits for `user_id` and issues a refreshed session
    /// carrying the new name and avatar.
    ///
    /// An empty avatar URL clears the avatar.
    ///
    /// # Errors
    /// Returns [`AuthError::NameTooShort`], [`AuthError::NameTooLong`] or
    /// [`AuthError::InvalidAvatarUrl`] for form problems and
    /// [`AuthError::Directory`] when the user no longer exists.
    pub fn update_profile(
        &self,
        user_id: &str,
        form: &ProfileForm,
        now_ms: u64,
    ) -> Result<SessionCookie, AuthError> {
        let name_len = form_len(&form.name);
        if name_len < MIN_NAME_CHARS {
            return Err(AuthError::NameTooShort);
        }
        if name_len > MAX_NAME_CHARS {
            return Err(AuthError::NameTooLong);
        }

        let avatar_url = match form.avatar_url.as_str() {
            "" => None,
            raw => {
                Url::parse(raw).map_err(|_| AuthError::InvalidAvatarUrl)?;
                Some(raw.to_string())
            }
        };

        let user = self.directory.update(
            user_id,
            ProfileUpdate {
                name: form.name.clone(),
                avatar_url,
            },
        )?;
        Ok(SessionCookie::issue(&user, now_ms))
    }
}

/// Form field length in UTF-16 code units, as the browser form counts it.
fn form_len(value: &str) -> usize {
    value.encode_utf16().count()
}

/// SHA-256 hex digest of a password.
pub fn password_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Loose email shape check: one `@`, non-empty local part, dotted domain.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split('.')
                    .filter(|label| !label.is_empty())
                    .count()
                    >= 2
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

/// Errors produced by the session boundary.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Form fields failed validation.
    #[error("Invalid form data")]
    InvalidForm,
    /// Unknown email or wrong password.
    #[error("Invalid email or password.")]
    InvalidCredentials,
    /// Email already registered.
    #[error("An account with this email already exists.")]
    EmailTaken,
    /// Profile name below the minimum.
    #[error("Name must be at least 2 characters.")]
    NameTooShort,
    /// Profile name above the maximum.
    #[error("Name cannot be longer than 50 characters.")]
    NameTooLong,
    /// Avatar URL is neither empty nor an absolute URL.
    #[error("Please enter a valid URL.")]
    InvalidAvatarUrl,
    /// Cookie value could not be encoded or decoded.
    #[error("invalid session cookie: {0}")]
    Cookie(String),
    /// Directory failure.
    #[error("user directory failure: {0}")]
    Directory(#[source] StoreError),
}

/// Form that produced an [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    /// Login form.
    Login,
    /// Signup form.
    Signup,
    /// Profile edit form.
    ProfileUpdate,
}

impl AuthAction {
    /// Generic message for failures the user cannot fix.
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Login => "An error occurred during login.",
            Self::Signup => "An error occurred during sign up.",
            Self::ProfileUpdate => "Could not save your changes. Please try again.",
        }
    }
}

impl AuthError {
    /// Message shown on the `action` form.
    pub fn form_message(&self, action: AuthAction) -> String {
        match self {
            Self::Cookie(_) | Self::Directory(_) => action.failure_message().to_string(),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for form checks and session transitions.

    use super::*;

    #[test]
    fn email_shape_checks() {
        assert!(is_valid_email("asha@example.test"));
        assert!(!is_valid_email("asha@localhost"));
        assert!(!is_valid_email("@example.test"));
        assert!(!is_valid_email("a b@example.test"));
        assert!(!is_valid_email("a@b@example.test"));
    }

    #[test]
    fn session_expires_after_one_week() {
        let user = User {
            id: "user-1".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.test".to_string(),
            avatar_url: None,
            password_digest: None,
        };
        let cookie = SessionCookie::issue(&user, 1_000);
        assert_eq!(cookie.expires_at_ms, 1_000 + 604_800_000);

        let mut state = SessionState::new();
        state.on_sign_in(cookie.clone());
        assert_eq!(state.user_id(2_000), Some("user-1"));
        state.on_tick(cookie.expires_at_ms);
        assert_eq!(state.phase(), &SessionPhase::Expired);
        assert_eq!(state.logout(), [SESSION_COOKIE, CLIENT_SESSION_COOKIE]);
        assert_eq!(state.phase(), &SessionPhase::Anonymous);
    }

    #[test]
    fn cookie_value_round_trips_without_digest() {
        let cookie = SessionCookie {
            user_id: "user-1".to_string(),
            name: "Asha".to_string(),
            email: "asha@example.test".to_string(),
            avatar_url: None,
            expires_at_ms: 5,
        };
        let raw = cookie.to_cookie_value().expect("cookie should encode");
        assert!(raw.contains("\"userId\""));
        assert!(!raw.contains("digest"));
        assert_eq!(SessionCookie::from_cookie_value(&raw).expect("decode"), cookie);
    }

    #[test]
    fn internal_failures_name_the_attempted_action() {
        let error = AuthError::Cookie("bad".to_string());
        assert_eq!(
            error.form_message(AuthAction::Login),
            "An error occurred during login."
        );
        assert_eq!(
            error.form_message(AuthAction::Signup),
            "An error occurred during sign up."
        );
        assert_eq!(
            AuthError::EmailTaken.form_message(AuthAction::Signup),
            "An account with this email already exists."
        );
    }

    fn profile_service() -> (AuthService, String) {
        let store = Arc::new(MemoryStore::new());
        let user = store
            .add_user(NewUser {
                name: "Asha".to_string(),
                email: "asha@example.test".to_string(),
                password_digest: None,
            })
            .expect("user should be added");
        (AuthService::new(store), user.id)
    }

    #[test]
    fn profile_name_bounds_are_inclusive() {
        let (service, user_id) = profile_service();
        let form = |name: String| ProfileForm {
            name,
            avatar_url: String::new(),
        };

        assert!(matches!(
            service.update_profile(&user_id, &form("A".to_string()), 0),
            Err(AuthError::NameTooShort)
        ));
        assert!(service.update_profile(&user_id, &form("Al".to_string()), 0).is_ok());
        assert!(service.update_profile(&user_id, &form("n".repeat(50)), 0).is_ok());
        let error = service
            .update_profile(&user_id, &form("n".repeat(51)), 0)
            .expect_err("51 characters should fail");
        assert_eq!(
            error.form_message(AuthAction::ProfileUpdate),
            "Name cannot be longer than 50 characters."
        );
    }

    #[test]
    fn profile_avatar_must_be_url_or_empty() {
        let (service, user_id) = profile_service();

        let error = service
            .update_profile(
                &user_id,
                &ProfileForm {
                    name: "Asha".to_string(),
                    avatar_url: "not a url".to_string(),
                },
                0,
            )
            .expect_err("relative text should fail");
        assert_eq!(error.to_string(), "Please enter a valid URL.");

        let cookie = service
            .update_profile(
                &user_id,
                &ProfileForm {
                    name: "Asha K".to_string(),
                    avatar_url: "https://example.test/a.png".to_string(),
                },
                10,
            )
            .expect("absolute URL should pass");
        assert_eq!(cookie.name, "Asha K");
        assert_eq!(cookie.avatar_url.as_deref(), Some("https://example.test/a.png"));
        assert_eq!(cookie.expires_at_ms, 10 + 604_800_000);

        let cleared = service
            .update_profile(
                &user_id,
                &ProfileForm {
                    name: "Asha K".to_string(),
                    avatar_url: String::new(),
                },
                10,
            )
            .expect("empty avatar should pass");
        assert_eq!(cleared.avatar_url, None);
    }

    #[test]
    fn profile_update_for_missing_user_is_generic_failure() {
        let (service, _) = profile_service();
        let error = service
            .update_profile(
                "user-missing",
                &ProfileForm {
                    name: "Asha".to_string(),
                    avatar_url: String::new(),
                },
                0,
            )
            .expect_err("missing user should fail");
        assert!(matches!(error, AuthError::Directory(StoreError::NotFound(_))));
        assert_eq!(
            error.form_message(AuthAction::ProfileUpdate),
            "Could not save your changes. Please try again."
        );
    }
}
