//! Authentication service.
//!
//! Owns everything credential-shaped: Argon2id password hashing and
//! verification, signup/login for both account kinds, and bearer token
//! issuance. Password hashes enter storage through this module and
//! never come back out of it.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, TokenError, TokenIssuer};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use minimart_core::Username;

use crate::db::Storage;
use crate::models::{AdminAccount, UserAccount};

/// Authentication service.
///
/// Handles signup, login, and admin account creation.
pub struct AuthService<'a> {
    storage: &'a dyn Storage,
    tokens: &'a TokenIssuer,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(storage: &'a dyn Storage, tokens: &'a TokenIssuer) -> Self {
        Self { storage, tokens }
    }

    /// Register a new user account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` for a malformed username,
    /// `AuthError::EmptyPassword` for an empty password,
    /// `AuthError::UsernameTaken` if the username is in use.
    pub async fn signup_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<UserAccount, AuthError> {
        let username = Username::parse(username)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;
        let account = self.storage.create_user(&username, &password_hash).await?;

        Ok(account)
    }

    /// Create a new admin account.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`Self::signup_user`].
    pub async fn create_admin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AdminAccount, AuthError> {
        let username = Username::parse(username)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;
        let account = self.storage.create_admin(&username, &password_hash).await?;

        Ok(account)
    }

    /// Login a user and return a fresh bearer token.
    ///
    /// The issued token is cached on the account row; nothing reads it
    /// back (no revocation path exists).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password
    /// is wrong.
    pub async fn login_user(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let (account, password_hash) = self
            .storage
            .find_user_credentials(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let token = self.tokens.issue(account.id.as_i32(), &account.username)?;
        self.storage.store_user_token(account.id, &token).await?;

        Ok(token)
    }

    /// Login an admin and return a fresh bearer token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password
    /// is wrong.
    pub async fn login_admin(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let (account, password_hash) = self
            .storage
            .find_admin_credentials(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let token = self.tokens.issue(account.id.as_i32(), &account.username)?;
        self.storage.store_admin_token(account.id, &token).await?;

        Ok(token)
    }
}

/// Reject passwords that must never reach the hasher.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::EmptyPassword);
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// Fails closed: any internal hashing error aborts the operation rather
/// than degrading to weaker storage.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;
    use crate::db::MemoryStorage;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&SecretString::from("test-secret-with-plenty-of-length")).unwrap()
    }

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("pw1").unwrap();
        assert!(verify_password("pw1", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hash_is_not_plaintext() {
        let hash = hash_password("pw1").unwrap();
        assert!(!hash.contains("pw1"));
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("pw1").unwrap();
        let second = hash_password("pw1").unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let storage = MemoryStorage::new();
        let tokens = issuer();
        let auth = AuthService::new(&storage, &tokens);

        let account = auth.signup_user("alice", "pw1").await.unwrap();
        assert_eq!(account.username.as_str(), "alice");

        let token = auth.login_user("alice", "pw1").await.unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, account.id.as_i32());
        assert_eq!(claims.username, "alice");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let storage = MemoryStorage::new();
        let tokens = issuer();
        let auth = AuthService::new(&storage, &tokens);

        auth.signup_user("alice", "pw1").await.unwrap();

        let result = auth.login_user("alice", "nope").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let storage = MemoryStorage::new();
        let tokens = issuer();
        let auth = AuthService::new(&storage, &tokens);

        let result = auth.login_user("nobody", "pw1").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_signup_empty_password_rejected() {
        let storage = MemoryStorage::new();
        let tokens = issuer();
        let auth = AuthService::new(&storage, &tokens);

        let result = auth.signup_user("alice", "").await;
        assert!(matches!(result, Err(AuthError::EmptyPassword)));
    }

    #[tokio::test]
    async fn test_signup_duplicate_username_rejected() {
        let storage = MemoryStorage::new();
        let tokens = issuer();
        let auth = AuthService::new(&storage, &tokens);

        auth.signup_user("alice", "pw1").await.unwrap();
        let result = auth.signup_user("alice", "pw2").await;
        assert!(matches!(result, Err(AuthError::UsernameTaken)));
    }
}
