//! Authenticated account descriptor
//!
//! An [`Account`] holds the credential returned by a token exchange (access
//! token, token type, granted scope) together with the raw identity payload of
//! the end user the token was issued for, if any. It answers three questions
//! used by the request-authorization layer:
//!
//! - [`Account::is_authenticated`] - can this account authorize a request at all
//! - [`Account::is_authenticated_with_user`] - does the token act for an end user
//! - [`Account::is_authenticated_with_client_credentials`] - is it an app-only token
//!
//! # Identity
//!
//! Only the raw payload (`userJSON`) is stored. The [`User`] is decoded on first
//! access and cached; every reassignment of the payload drops the cached value,
//! so the two can never disagree.
//!
//! # Persistence
//!
//! The persisted record has exactly four keys: `accessToken`, `tokenType`,
//! `scope` and `userJSON`. The decoded user and the lifecycle state are never
//! written; an account read back from storage is always [`AccountState::Active`].
//! Token endpoint spellings (`access_token`, `token_type`, `user`) are accepted
//! when reading.
//!
//! ```rust
//! use vimeo_account_core::Account;
//!
//! let account: Account = serde_json::from_str(
//!     r#"{"access_token":"abc123","token_type":"bearer","scope":"public private","user":{"uri":"/users/1"}}"#,
//! ).unwrap();
//!
//! assert!(account.is_authenticated_with_user());
//! assert_eq!(account.authorization_header().as_deref(), Some("Bearer abc123"));
//! ```

use std::fmt;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::user::{IdentityDecoder, JsonIdentityDecoder, User, UserJson};

/// Scheme used in the `Authorization` header when the token type is unknown
pub const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// Lifecycle of an account credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccountState {
    /// Credential is usable
    #[default]
    Active,
    /// The service rejected the credential; it must not authorize requests
    Revoked,
}

/// Credential and identity of a client session
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(from = "AccountRecord")]
pub struct Account {
    #[serde(rename = "accessToken", skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,

    #[serde(rename = "tokenType", skip_serializing_if = "Option::is_none")]
    token_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<String>,

    #[serde(rename = "userJSON", skip_serializing_if = "Option::is_none")]
    user_json: Option<UserJson>,

    // Not persisted
    #[serde(skip)]
    user: OnceCell<Option<User>>,

    #[serde(skip)]
    state: AccountState,
}

/// Wire form read by [`Account`]'s `Deserialize`.
///
/// Both spellings of each key are accepted; the persisted one wins when a
/// record carries both.
#[derive(Deserialize)]
struct AccountRecord {
    #[serde(rename = "accessToken", default)]
    access_token: Option<String>,
    #[serde(rename = "access_token", default)]
    response_access_token: Option<String>,

    #[serde(rename = "tokenType", default)]
    token_type: Option<String>,
    #[serde(rename = "token_type", default)]
    response_token_type: Option<String>,

    #[serde(default)]
    scope: Option<String>,

    #[serde(rename = "userJSON", default)]
    user_json: Option<UserJson>,
    #[serde(rename = "user", default)]
    response_user: Option<UserJson>,
}

impl From<AccountRecord> for Account {
    fn from(record: AccountRecord) -> Self {
        Self {
            access_token: record.access_token.or(record.response_access_token),
            token_type: record.token_type.or(record.response_token_type),
            scope: record.scope,
            user_json: record.user_json.or(record.response_user),
            user: OnceCell::new(),
            state: AccountState::Active,
        }
    }
}

impl Account {
    /// Create an account from the credential triple of a token response
    pub fn new(
        access_token: impl Into<String>,
        token_type: Option<String>,
        scope: Option<String>,
    ) -> Self {
        Self {
            access_token: Some(access_token.into()),
            token_type,
            scope,
            ..Default::default()
        }
    }

    /// An account without any credential
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    /// Attach an identity, storing its payload as `userJSON`
    pub fn with_user(mut self, user: User) -> Result<Self> {
        self.set_user(Some(user))?;
        Ok(self)
    }

    /// Attach a raw identity payload
    pub fn with_user_json(mut self, user_json: UserJson) -> Self {
        self.set_user_json(Some(user_json));
        self
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn user_json(&self) -> Option<&UserJson> {
        self.user_json.as_ref()
    }

    /// The identity decoded from `userJSON`.
    ///
    /// Decoded once and cached. A payload that fails to decode yields `None`
    /// and is logged; use [`Account::decode_user_with`] to get the error.
    pub fn user(&self) -> Option<&User> {
        self.user
            .get_or_init(|| {
                let json = self.user_json.as_ref()?;
                match JsonIdentityDecoder.decode(json) {
                    Ok(user) => Some(user),
                    Err(e) => {
                        warn!("Failed to decode account identity: {}", e);
                        None
                    }
                }
            })
            .as_ref()
    }

    /// Decode `userJSON` with a caller supplied decoder, surfacing failures.
    ///
    /// Does not touch the cached identity.
    pub fn decode_user_with(&self, decoder: &dyn IdentityDecoder) -> Result<Option<User>> {
        self.user_json
            .as_ref()
            .map(|json| decoder.decode(json))
            .transpose()
    }

    /// Replace the identity payload and drop the cached user
    pub fn set_user_json(&mut self, user_json: Option<UserJson>) {
        self.user_json = user_json;
        self.user = OnceCell::new();
    }

    /// Replace the identity; the payload is derived from `user`
    pub fn set_user(&mut self, user: Option<User>) -> Result<()> {
        let user_json = user.as_ref().map(User::to_json).transpose()?;
        self.user_json = user_json;
        self.user = OnceCell::from(user);
        Ok(())
    }

    /// Apply a token refresh in place.
    ///
    /// `token_type` and `scope` are only replaced when the refresh response
    /// carries them. A refreshed account is active again.
    pub fn refresh_credentials(
        &mut self,
        access_token: impl Into<String>,
        token_type: Option<String>,
        scope: Option<String>,
    ) {
        self.access_token = Some(access_token.into());
        if token_type.is_some() {
            self.token_type = token_type;
        }
        if scope.is_some() {
            self.scope = scope;
        }
        self.state = AccountState::Active;
        debug!("Account credentials refreshed");
    }

    /// Mark the credential as rejected by the service
    pub fn revoke(&mut self) {
        if self.state != AccountState::Revoked {
            debug!("Account credential revoked");
        }
        self.state = AccountState::Revoked;
    }

    pub fn state(&self) -> AccountState {
        self.state
    }

    pub fn is_invalid(&self) -> bool {
        self.state == AccountState::Revoked
    }

    /// True when the account carries a usable access token
    pub fn is_authenticated(&self) -> bool {
        self.state == AccountState::Active
            && self.access_token.as_deref().is_some_and(|token| !token.is_empty())
    }

    /// True when authenticated on behalf of an end user
    pub fn is_authenticated_with_user(&self) -> bool {
        self.is_authenticated() && self.user().is_some()
    }

    /// True when authenticated as the application only
    pub fn is_authenticated_with_client_credentials(&self) -> bool {
        self.is_authenticated() && self.user().is_none()
    }

    /// Individual scopes of the space-delimited scope string
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope.as_deref().unwrap_or_default().split_whitespace()
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes().any(|granted| granted == scope)
    }

    /// Value for the `Authorization` header, if the account can authorize requests
    pub fn authorization_header(&self) -> Option<String> {
        if !self.is_authenticated() {
            return None;
        }

        let token = self.access_token.as_deref()?;
        let scheme = match self.token_type.as_deref().map(str::trim) {
            Some(token_type) if !token_type.is_empty() => capitalize(token_type),
            _ => DEFAULT_TOKEN_TYPE.to_string(),
        };

        Some(format!("{} {}", scheme, token))
    }

    /// Serialize the persisted fields
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Rebuild an account from its persisted fields
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.access_token == other.access_token
            && self.token_type == other.token_type
            && self.scope == other.scope
            && self.user_json == other.user_json
            && self.state == other.state
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("token_type", &self.token_type)
            .field("scope", &self.scope)
            .field("has_user_json", &self.user_json.is_some())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn user_json(value: Value) -> UserJson {
        match value {
            Value::Object(map) => map,
            _ => panic!("test payload must be an object"),
        }
    }

    #[test]
    fn test_user_session_classification() {
        let account = Account::new("abc123", Some("bearer".to_string()), None)
            .with_user_json(user_json(json!({"id": 1})));

        assert!(account.is_authenticated());
        assert!(account.is_authenticated_with_user());
        assert!(!account.is_authenticated_with_client_credentials());
        assert_eq!(account.user().and_then(User::id).as_deref(), Some("1"));
    }

    #[test]
    fn test_client_credentials_classification() {
        let account = Account::new("xyz789", None, None);

        assert!(account.is_authenticated());
        assert!(!account.is_authenticated_with_user());
        assert!(account.is_authenticated_with_client_credentials());
    }

    #[test]
    fn test_unauthenticated_classification() {
        let account = Account::unauthenticated().with_user_json(user_json(json!({"id": 1})));

        assert!(!account.is_authenticated());
        assert!(!account.is_authenticated_with_user());
        assert!(!account.is_authenticated_with_client_credentials());
    }

    #[test]
    fn test_empty_token_is_not_authenticated() {
        let account = Account::new("", Some("bearer".to_string()), None);
        assert!(!account.is_authenticated());
        assert!(account.authorization_header().is_none());
    }

    #[test]
    fn test_revoked_account_is_not_authenticated() {
        let mut account = Account::new("abc123", None, None)
            .with_user_json(user_json(json!({"id": 1})));
        account.revoke();

        assert!(account.is_invalid());
        assert!(!account.is_authenticated());
        assert!(!account.is_authenticated_with_user());
        assert!(!account.is_authenticated_with_client_credentials());
        assert!(account.authorization_header().is_none());
    }

    #[test]
    fn test_refresh_restores_active_state() {
        let mut account = Account::new("old", Some("bearer".to_string()), Some("public".to_string()));
        account.revoke();
        account.refresh_credentials("new", None, Some("public private".to_string()));

        assert_eq!(account.state(), AccountState::Active);
        assert_eq!(account.access_token(), Some("new"));
        assert_eq!(account.token_type(), Some("bearer"));
        assert!(account.has_scope("private"));
    }

    #[test]
    fn test_reassigning_user_json_drops_cached_user() {
        let mut account = Account::new("abc123", None, None)
            .with_user_json(user_json(json!({"uri": "/users/1"})));
        assert_eq!(account.user().and_then(User::id).as_deref(), Some("1"));

        account.set_user_json(Some(user_json(json!({"uri": "/users/2"}))));
        assert_eq!(account.user().and_then(User::id).as_deref(), Some("2"));

        account.set_user_json(None);
        assert!(account.user().is_none());
        assert!(account.is_authenticated_with_client_credentials());
    }

    #[test]
    fn test_set_user_derives_payload() {
        let user = User {
            uri: Some("/users/42".to_string()),
            name: Some("Ada".to_string()),
            ..Default::default()
        };
        let account = Account::new("abc123", None, None).with_user(user.clone()).unwrap();

        assert_eq!(
            account.user_json().and_then(|json| json.get("name")),
            Some(&json!("Ada"))
        );
        assert_eq!(account.user(), Some(&user));
    }

    #[test]
    fn test_undecodable_payload_leaves_user_absent() {
        let account = Account::new("abc123", None, None)
            .with_user_json(user_json(json!({"name": ["not", "a", "string"]})));

        assert!(account.user_json().is_some());
        assert!(account.user().is_none());
        assert!(account.decode_user_with(&JsonIdentityDecoder).is_err());
    }

    #[test]
    fn test_persisted_keys() {
        let mut account = Account::new("abc123", Some("bearer".to_string()), Some("public".to_string()))
            .with_user_json(user_json(json!({"id": 1})));
        account.revoke();

        let value: Value = serde_json::from_slice(&account.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "accessToken": "abc123",
                "tokenType": "bearer",
                "scope": "public",
                "userJSON": {"id": 1},
            })
        );
    }

    #[test]
    fn test_round_trip_resets_state_only() {
        let mut account = Account::new("abc123", Some("bearer".to_string()), None)
            .with_user_json(user_json(json!({"uri": "/users/5"})));
        account.revoke();

        let restored = Account::from_json(&account.to_json().unwrap()).unwrap();
        assert_eq!(restored.access_token(), account.access_token());
        assert_eq!(restored.user_json(), account.user_json());
        assert_eq!(restored.state(), AccountState::Active);
    }

    #[test]
    fn test_token_response_spelling() {
        let account: Account = serde_json::from_value(json!({
            "access_token": "abc123",
            "token_type": "bearer",
            "scope": "public private upload",
            "user": {"uri": "/users/9", "name": "Kim"},
        }))
        .unwrap();

        assert!(account.is_authenticated_with_user());
        assert_eq!(account.scopes().collect::<Vec<_>>(), vec!["public", "private", "upload"]);
    }

    #[test]
    fn test_persisted_keys_win_over_response_keys() {
        let account: Account = serde_json::from_value(json!({
            "accessToken": "stored",
            "access_token": "response",
            "userJSON": {"uri": "/users/1"},
            "user": {"uri": "/users/2"},
        }))
        .unwrap();

        assert_eq!(account.access_token(), Some("stored"));
        assert_eq!(account.user().and_then(|user| user.id()).as_deref(), Some("1"));

        let response_only: Account = serde_json::from_value(json!({
            "access_token": "response",
            "user": null,
        }))
        .unwrap();
        assert_eq!(response_only.access_token(), Some("response"));
        assert!(response_only.is_authenticated_with_client_credentials());
    }

    #[test]
    fn test_authorization_header_scheme() {
        assert_eq!(
            Account::new("t", Some("bearer".to_string()), None).authorization_header().as_deref(),
            Some("Bearer t")
        );
        assert_eq!(
            Account::new("t", None, None).authorization_header().as_deref(),
            Some("Bearer t")
        );
        assert_eq!(
            Account::new("t", Some("MAC".to_string()), None).authorization_header().as_deref(),
            Some("Mac t")
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let account = Account::new("super-secret", None, None);
        let rendered = format!("{:?}", account);
        assert!(!rendered.contains("super-secret"));
    }
}
