//! Identity object carried by an authenticated account
//!
//! The service returns the end user as a nested JSON object inside token
//! responses. [`User`] is the materialized form of that payload; keys the SDK
//! does not model explicitly are preserved in [`User::extra`] so converting a
//! `User` back to JSON yields the payload it was decoded from.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AccountError, Result};

/// Raw identity payload as stored in an account's `userJSON`
pub type UserJson = Map<String, Value>;

/// End-user identity
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct User {
    /// Canonical resource path, e.g. `/users/152184`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Public profile URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    /// Membership level (`basic`, `plus`, `pro`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    /// Everything else the payload carried
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// Identifier of the user.
    ///
    /// Taken from an explicit `id` key when present, otherwise from the
    /// trailing segment of a `/users/<id>` uri.
    pub fn id(&self) -> Option<String> {
        match self.extra.get("id") {
            Some(Value::String(id)) if !id.is_empty() => return Some(id.clone()),
            Some(Value::Number(id)) => return Some(id.to_string()),
            _ => {}
        }

        self.uri
            .as_deref()
            .and_then(|uri| uri.trim_end_matches('/').strip_prefix("/users/"))
            .filter(|id| !id.is_empty() && !id.contains('/'))
            .map(str::to_string)
    }

    /// Convert back into the raw payload form
    pub fn to_json(&self) -> Result<UserJson> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(AccountError::IdentityDecode(format!(
                "user serialized to non-object value: {}",
                other
            ))),
        }
    }
}

/// Turns a raw identity payload into a [`User`]
pub trait IdentityDecoder: Send + Sync {
    fn decode(&self, json: &UserJson) -> Result<User>;
}

/// Default decoder backed by serde_json
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonIdentityDecoder;

impl IdentityDecoder for JsonIdentityDecoder {
    fn decode(&self, json: &UserJson) -> Result<User> {
        serde_json::from_value(Value::Object(json.clone()))
            .map_err(|e| AccountError::IdentityDecode(e.to_string()))
    }
}
