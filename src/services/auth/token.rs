/*
 * Responsibility
 * - Verified identity of the caller (IdentityToken)
 * - Role checks over the claim set (deny by default)
 */
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Verified representation of an authenticated caller.
///
/// - `uid` is the subject identifier issued by the identity provider.
/// - `claims` keeps every claim of the token, role flags included.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityToken {
    pub uid: String,
    pub claims: Map<String, Value>,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl IdentityToken {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            claims: Map::new(),
            issued_at: None,
            expires_at: None,
        }
    }

    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.claims.insert(name.into(), value.into());
        self
    }

    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// A role is granted only when its claim is the JSON boolean `true`.
    pub fn has_role(&self, role: &str) -> bool {
        matches!(self.claims.get(role), Some(Value::Bool(true)))
    }

    pub fn has_any_role<R: AsRef<str>>(&self, roles: &[R]) -> bool {
        roles.iter().any(|role| self.has_role(role.as_ref()))
    }
}
