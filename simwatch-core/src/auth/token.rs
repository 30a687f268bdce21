use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::RevocationCache;

/// Claims embedded in issued bearer tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Operator username
    pub sub: String,
    /// Expiry, seconds since epoch
    pub exp: i64,
    /// Issued-at, seconds since epoch
    pub iat: i64,
    /// Unique token id, the unit of revocation
    pub jti: String,
}

/// Identity carried by a validated credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorIdentity {
    pub username: String,
    pub token_id: String,
    pub expires_at: DateTime<Utc>,
}

/// A freshly issued token together with its identity view.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub identity: OperatorIdentity,
}

/// Every way resolving a presented credential can end.
///
/// One tagged result instead of per-failure callbacks: the transport layer
/// maps variants to responses in a single place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Ok(OperatorIdentity),
    Expired,
    Revoked,
    Invalid,
    Missing,
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("token encoding failed: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

/// Issues, resolves, and revokes signed bearer tokens.
///
/// Owns the HS256 key pair and a shared [`RevocationCache`]; resolution is
/// a total function over arbitrary input, returning an [`AuthOutcome`]
/// rather than an error.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    revocations: Arc<RevocationCache>,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl", &self.ttl)
            .field("revocations", &self.revocations)
            .finish()
    }
}

impl TokenService {
    pub fn new(secret: &[u8], ttl: Duration, revocations: Arc<RevocationCache>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
            revocations,
        }
    }

    /// Issue a fresh token for an operator who already proved their
    /// identity.
    pub fn issue(&self, username: &str) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = now + self.ttl;

        let claims = Claims {
            sub: username.to_owned(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(IssuedToken {
            token,
            identity: OperatorIdentity {
                username: claims.sub,
                token_id: claims.jti,
                expires_at,
            },
        })
    }

    /// Resolve a presented bearer token into an outcome.
    ///
    /// Never fails: malformed, tampered, expired, and revoked tokens each
    /// map to their own variant. Signature and expiry are checked before
    /// the revocation cache is consulted.
    pub fn resolve(&self, bearer: Option<&str>) -> AuthOutcome {
        let Some(token) = bearer else {
            return AuthOutcome::Missing;
        };

        let validation = Validation::new(Algorithm::HS256);
        let data = match decode::<Claims>(token, &self.decoding_key, &validation) {
            Ok(data) => data,
            Err(err) => {
                return match err.kind() {
                    ErrorKind::ExpiredSignature => AuthOutcome::Expired,
                    _ => AuthOutcome::Invalid,
                };
            }
        };

        let claims = data.claims;
        if self.revocations.is_revoked(&claims.jti) {
            return AuthOutcome::Revoked;
        }

        let Some(expires_at) = DateTime::from_timestamp(claims.exp, 0) else {
            return AuthOutcome::Invalid;
        };

        AuthOutcome::Ok(OperatorIdentity {
            username: claims.sub,
            token_id: claims.jti,
            expires_at,
        })
    }

    /// Revoke a resolved credential until its natural expiry. Logout path.
    pub fn revoke(&self, identity: &OperatorIdentity) {
        self.revocations
            .revoke(&identity.token_id, identity.expires_at);
    }

    /// The cache this service consults, for sharing with other components.
    pub fn revocations(&self) -> Arc<RevocationCache> {
        Arc::clone(&self.revocations)
    }
}
