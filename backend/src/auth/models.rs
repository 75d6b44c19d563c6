//! Data structures for authentication requests and responses.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::database::models::User;
use crate::utils::jwt::{SignedToken, TokenPair};

/// Login form payload. `username` carries the user's email.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Access token response. The refresh token is only sent as a cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    /// Token expiration in seconds
    pub expires_in: u64,
}

impl From<&TokenPair> for TokenResponse {
    fn from(pair: &TokenPair) -> Self {
        TokenResponse {
            access_token: pair.access_token.clone(),
            token_type: pair.token_type.clone(),
            expires_in: pair.expires_in,
        }
    }
}

impl From<SignedToken> for TokenResponse {
    fn from(token: SignedToken) -> Self {
        TokenResponse {
            access_token: token.token,
            token_type: "bearer".to_string(),
            expires_in: token.expires_in,
        }
    }
}

/// The authenticated user, re-read from the database for this request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);
