//! Stateless signed bearer tokens.
//! Wire form is `base64url(claims JSON) "." base64url(HMAC-SHA256 tag)`, both
//! segments unpadded. Validity is decided purely from the signature and the
//! embedded expiry; nothing is kept server-side and nothing is revocable
//! before it expires.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use crate::tprintln;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// Missing dot structure, undecodable payload, or claims that did not
    /// parse.
    #[error("token is malformed")]
    Malformed,
    /// Tag segment undecodable or not matching the payload under our key.
    /// Any change to the signature characters lands here.
    #[error("token signature mismatch")]
    SignatureInvalid,
    /// Signature was fine but the expiry instant has passed.
    #[error("token expired")]
    Expired,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: Uuid,
    iat: i64,
    exp: i64,
}

#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self { secret: secret.to_vec(), ttl }
    }

    /// Seven-day tokens, the login default.
    pub fn with_default_ttl(secret: &[u8]) -> Self {
        Self::new(secret, Duration::days(7))
    }

    pub fn issue(&self, user_id: Uuid) -> String {
        let now = Utc::now().timestamp();
        let claims = Claims { sub: user_id, iat: now, exp: now + self.ttl.num_seconds() };
        tprintln!("token.issue user={} exp={}", user_id, claims.exp);
        let payload =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).expect("claims serialize"));
        let tag = self.sign(payload.as_bytes());
        format!("{}.{}", payload, URL_SAFE_NO_PAD.encode(tag))
    }

    /// Check order: structure, signature, claims shape, expiry. A tag that
    /// does not decode is a bad signature, not a malformed token: strict
    /// decoding checks the final symbol's padding bits, and a flip there must
    /// report the same way as any other signature damage.
    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let (payload, tag) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let tag = URL_SAFE_NO_PAD.decode(tag).map_err(|_| TokenError::SignatureInvalid)?;
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("hmac accepts any key");
        mac.update(payload.as_bytes());
        mac.verify_slice(&tag).map_err(|_| TokenError::SignatureInvalid)?;
        let raw = URL_SAFE_NO_PAD.decode(payload).map_err(|_| TokenError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&raw).map_err(|_| TokenError::Malformed)?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims.sub)
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).expect("hmac accepts any key");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}
