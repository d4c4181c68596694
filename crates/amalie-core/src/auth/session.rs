use std::sync::Arc;

use anyhow::Result;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::store::TokenStore;

/// Session shared between the composition root and the API client.
pub type SharedSession = Arc<RwLock<Session>>;

/// Failure to read identity claims out of a bearer token.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Token must have 3 segments, found {0}")]
    Segments(usize),

    #[error("Token claims are not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Token claims are not a JSON object: {0}")]
    Claims(#[from] serde_json::Error),
}

/// The current user as described by the token's claims.
///
/// Claims beyond the well-known ones, and well-known claims whose value has
/// an unexpected type, are kept in `claims`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Expiry as whole seconds since the Unix epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub claims: Map<String, Value>,
}

impl Identity {
    /// Build an identity from any claims object.
    ///
    /// Never fails: a well-known claim is only lifted into its field when
    /// its value has a usable type. `exp` accepts any JSON number and is
    /// truncated to whole seconds.
    pub fn from_claims(mut claims: Map<String, Value>) -> Self {
        let user_id = take_claim(&mut claims, "userId", |v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });
        let full_name = take_claim(&mut claims, "fullName", string_claim);
        let role = take_claim(&mut claims, "role", string_claim);
        let email = take_claim(&mut claims, "email", string_claim);
        let exp = take_claim(&mut claims, "exp", |v| v.as_f64().map(|secs| secs.trunc() as i64));

        Self {
            user_id,
            full_name,
            role,
            email,
            exp,
            claims,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Tokens without an `exp` claim never expire client-side.
    pub fn is_expired(&self) -> bool {
        self.expires_at().map(|at| Utc::now() >= at).unwrap_or(false)
    }

    pub fn display_name(&self) -> &str {
        non_empty(&self.full_name).unwrap_or("User")
    }

    pub fn display_role(&self) -> &str {
        non_empty(&self.role).unwrap_or("User")
    }

    /// First letter of the full name, for avatars
    pub fn initials(&self) -> String {
        non_empty(&self.full_name)
            .and_then(|name| name.chars().next())
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "U".to_string())
    }
}

impl<'de> Deserialize<'de> for Identity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::deserialize(deserializer).map(Identity::from_claims)
    }
}

/// Remove `key` from `claims` if `read` accepts its value. A `null` claim is
/// treated as absent.
fn take_claim<T>(
    claims: &mut Map<String, Value>,
    key: &str,
    read: impl FnOnce(&Value) -> Option<T>,
) -> Option<T> {
    let value = match claims.get(key)? {
        Value::Null => None,
        value => Some(read(value)?),
    };
    claims.remove(key);
    value
}

fn string_claim(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Decode the identity from the middle (claims) segment of a token.
///
/// The signature is not checked; this is for display only. Any JSON object
/// is a valid claims set.
pub fn derive_identity(token: &str) -> Result<Identity, DecodeError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::Segments(segments.len()));
    }

    // Accept padded and standard-alphabet encodings as well as base64url
    let claims: String = segments[1]
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();
    let payload = URL_SAFE_NO_PAD.decode(claims.as_bytes())?;
    let claims: Map<String, Value> = serde_json::from_slice(&payload)?;

    Ok(Identity::from_claims(claims))
}

/// Owns the bearer token and its durable copy.
pub struct Session {
    token: Option<String>,
    store: Arc<dyn TokenStore>,
}

impl Session {
    /// Create an empty session backed by `store`, without reading it.
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self {
            token: None,
            store: Arc::new(store),
        }
    }

    /// Rehydrate the session at process start.
    ///
    /// A persisted token that cannot be decoded, or whose `exp` has passed,
    /// is discarded and the session starts logged out.
    pub fn restore(store: impl TokenStore + 'static) -> Self {
        let mut session = Self::new(store);

        let persisted = match session.store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted token");
                None
            }
        };

        let Some(token) = persisted else {
            debug!("No persisted token found");
            return session;
        };

        match derive_identity(&token) {
            Ok(identity) if identity.is_expired() => {
                warn!(expired_at = ?identity.expires_at(), "Persisted token expired, logging out");
                session.discard_persisted();
            }
            Ok(identity) => {
                debug!(user = identity.display_name(), "Session restored");
                session.token = Some(token);
            }
            Err(e) => {
                warn!(error = %e, "Persisted token is malformed, logging out");
                session.discard_persisted();
            }
        }

        session
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(RwLock::new(self))
    }

    fn discard_persisted(&mut self) {
        self.token = None;
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear persisted token");
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Durable storage behind this session, for persisting without holding
    /// a lock on the session itself.
    pub fn store(&self) -> Arc<dyn TokenStore> {
        Arc::clone(&self.store)
    }

    /// Replace the in-memory token only. Pair with a save or clear on
    /// [`store`](Self::store).
    pub fn hold_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Hold `token` in memory and persist it.
    ///
    /// The in-memory token is updated even when persisting fails.
    pub fn set_token(&mut self, token: impl Into<String>) -> Result<()> {
        let token = token.into();
        self.hold_token(Some(token.clone()));
        self.store.save(&token)
    }

    /// Remove the token from memory and from durable storage.
    pub fn clear_token(&mut self) -> Result<()> {
        self.hold_token(None);
        self.store.clear()
    }

    /// Identity decoded from the held token; absent if there is no token
    /// or it cannot be decoded.
    pub fn identity(&self) -> Option<Identity> {
        self.token.as_deref().and_then(|t| derive_identity(t).ok())
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity().map(|id| !id.is_expired()).unwrap_or(false)
    }
}
