use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::services::errors::auth_service_errors::AuthServiceError;

#[cfg(test)]
use mockall::automock;

/// Claims carried by a verified connection token. Identity only; ratings
/// and room state are never trusted from the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub username: String,
    pub exp: usize,
    pub iat: usize,
}

/// The external auth collaborator: verify a token, get an identity back.
/// The gateway rejects the connection on any error; no session is created.
#[cfg_attr(test, automock)]
pub trait TokenVerifier: Send + Sync {
    fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthServiceError>;
}

/// Gateway-side auth step: a missing token is rejected before the
/// verifier is consulted.
pub fn authenticate_connection(
    verifier: &dyn TokenVerifier,
    token: Option<&str>,
) -> Result<TokenClaims, AuthServiceError> {
    match token {
        Some(token) if !token.is_empty() => verifier.verify_token(token),
        _ => Err(AuthServiceError::MissingToken),
    }
}

pub struct JwtTokenVerifier {
    jwt_secret: String,
}

impl JwtTokenVerifier {
    pub fn new(jwt_secret: String) -> Self {
        JwtTokenVerifier { jwt_secret }
    }

    /// Issues a token for the given identity. Used by operational tooling
    /// and tests; the production issuer lives outside this subsystem.
    pub fn issue_token(&self, user_id: &str, username: &str) -> Result<String, AuthServiceError> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: (now + Duration::hours(24)).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )
        .map_err(|e| AuthServiceError::ValidationError(format!("{:#?}", e)))
    }
}

impl TokenVerifier for JwtTokenVerifier {
    fn verify_token(&self, token: &str) -> Result<TokenClaims, AuthServiceError> {
        let decoding_key = DecodingKey::from_secret(self.jwt_secret.as_ref());
        let validation = Validation::default();

        match decode::<TokenClaims>(token, &decoding_key, &validation) {
            Ok(token_data) => Ok(token_data.claims),
            Err(err) => match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    Err(AuthServiceError::ExpiredToken)
                }
                _ => Err(AuthServiceError::InvalidToken),
            },
        }
    }
}
