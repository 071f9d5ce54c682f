//! Authentication service - Handles doctor registration and login.
//!
//! Password hashing lives in the domain `Password` value object; this
//! service only issues and verifies tokens.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::config::{Config, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER};
use crate::domain::{validate_username, Password, User};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// JWT claims payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Token response returned after successful authentication
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Token expiration time in seconds
    #[schema(example = 3600)]
    pub expires_in: i64,
}

/// Authentication service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new doctor account
    async fn register(&self, username: String, password: String) -> AppResult<User>;

    /// Login and return JWT token
    async fn login(&self, username: String, password: String) -> AppResult<TokenResponse>;

    /// Verify JWT token and extract claims
    fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

/// Sign a token for a user
fn generate_token(user: &User, config: &Config) -> AppResult<TokenResponse> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.jwt_expiration_hours);

    let claims = Claims {
        sub: user.username.clone(),
        role: user.role.to_string(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?;

    Ok(TokenResponse {
        access_token: token,
        token_type: TOKEN_TYPE_BEARER.to_string(),
        expires_in: config.jwt_expiration_hours * SECONDS_PER_HOUR,
    })
}

fn verify_token_internal(token: &str, config: &Config) -> AppResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// Concrete implementation of AuthService using Unit of Work.
pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    config: Config,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(uow: Arc<U>, config: Config) -> Self {
        Self { uow, config }
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn register(&self, username: String, password: String) -> AppResult<User> {
        validate_username(&username)?;

        if self.uow.users().find_by_username(&username).await?.is_some() {
            return Err(AppError::conflict("Username"));
        }

        let password_hash = Password::new(&password)?.into_string();
        // The unique index still rejects a concurrent registration
        self.uow.users().create(username, password_hash).await
    }

    async fn login(&self, username: String, password: String) -> AppResult<TokenResponse> {
        let user = self.uow.users().find_by_username(&username).await?;

        // Unknown users still pay for one verification
        let stored = match &user {
            Some(user) => Password::from_hash(user.password_hash.clone()),
            None => Password::decoy(),
        };
        let password_valid = stored.verify(&password);

        match user {
            Some(user) if password_valid => {
                tracing::info!(username = %user.username, "User logged in");
                generate_token(&user, &self.config)
            }
            _ => {
                tracing::warn!(username = %username, "Failed login attempt");
                Err(AppError::InvalidCredentials)
            }
        }
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        verify_token_internal(token, &self.config)
    }
}
