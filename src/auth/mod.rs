//! Identity verification
//!
//! Sessions are issued elsewhere as `"<user_id>.<hex HMAC-SHA256(key, user_id)>"`.
//! This module only verifies them and turns a valid one into an [`AuthUser`].

use crate::error::Error;
use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;

type HmacSha256 = Hmac<Sha256>;

/// Cookie carrying the session token
pub const SESSION_COOKIE: &str = "press_session";

/// Signs and verifies session tokens with a shared secret
#[derive(Clone)]
pub struct SessionSigner {
    key: Vec<u8>,
}

impl SessionSigner {
    pub fn new(secret_key: impl AsRef<[u8]>) -> Self {
        Self {
            key: secret_key.as_ref().to_vec(),
        }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size")
    }

    /// Mint a token for `user_id`
    pub fn sign(&self, user_id: &str) -> String {
        let mut mac = self.mac();
        mac.update(user_id.as_bytes());
        format!("{}.{}", user_id, hex::encode(mac.finalize().into_bytes()))
    }

    /// User id carried by a valid token
    pub fn verify(&self, token: &str) -> Option<String> {
        let (user_id, signature) = token.trim().rsplit_once('.')?;
        if user_id.is_empty() {
            return None;
        }
        let signature = hex::decode(signature).ok()?;
        let mut mac = self.mac();
        mac.update(user_id.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(user_id.to_string())
    }
}

/// Session token from `Authorization: Bearer` or the session cookie
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<SessionSigner>: FromRef<S>,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let signer = Arc::<SessionSigner>::from_ref(state);
        token_from_headers(&parts.headers)
            .and_then(|token| signer.verify(&token))
            .map(|id| AuthUser { id })
            .ok_or(Error::Unauthorized)
    }
}
