//! Bearer token issuing and verification.
//!
//! Tokens are self-contained HS256 JWTs: the claims travel inside the
//! token and nothing is looked up at verification time. One issuer
//! serves both account kinds; only the middleware's account lookup
//! differs between admin and user routes.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use minimart_core::Username;

/// Fixed token lifetime.
const TOKEN_TTL_HOURS: i64 = 24;

/// Errors that can occur issuing or verifying tokens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The signing secret is empty or missing.
    #[error("signing secret cannot be empty")]
    EmptySecret,

    /// The token string is not a well-formed JWT.
    #[error("malformed token")]
    Malformed,

    /// Wrong signature, wrong secret, or a non-HS256 algorithm header.
    #[error("invalid token signature")]
    SignatureInvalid,

    /// The expiry claim has elapsed.
    #[error("token expired")]
    Expired,

    /// Token could not be signed.
    #[error("token encoding failed")]
    Encoding,
}

/// Claims carried by every token.
///
/// Decoded exactly once at verification; downstream code never
/// re-interprets the token string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Numeric account id the token is scoped to.
    pub sub: i32,
    /// Username at issuance; corroborated against the live account on
    /// every authenticated request.
    pub username: String,
    /// Issued at (seconds since epoch).
    pub iat: i64,
    /// Expiry (seconds since epoch).
    pub exp: i64,
}

/// Issues and verifies HS256 bearer tokens with a fixed TTL.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// Create an issuer with the standard 24 hour TTL.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::EmptySecret` if the secret is empty, so
    /// verification can never run without a real secret.
    pub fn new(secret: &SecretString) -> Result<Self, TokenError> {
        Self::with_ttl(secret, Duration::hours(TOKEN_TTL_HOURS))
    }

    /// Create an issuer with a custom TTL (tests mint expired tokens
    /// by passing a negative duration).
    ///
    /// # Errors
    ///
    /// Returns `TokenError::EmptySecret` if the secret is empty.
    pub fn with_ttl(secret: &SecretString, ttl: Duration) -> Result<Self, TokenError> {
        let secret = secret.expose_secret();
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        })
    }

    /// Issue a token scoped to one account id.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Encoding` if signing fails.
    pub fn issue(&self, subject: i32, username: &Username) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject,
            username: username.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| TokenError::Encoding)
    }

    /// Verify a token and decode its claims.
    ///
    /// Only HS256 is accepted; a token whose header names any other
    /// algorithm fails as `SignatureInvalid` regardless of its payload.
    ///
    /// # Errors
    ///
    /// Returns `Malformed`, `SignatureInvalid`, or `Expired`.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName
                | ErrorKind::MissingAlgorithm
                | ErrorKind::Crypto(_) => TokenError::SignatureInvalid,
                _ => TokenError::Malformed,
            })
    }
}
