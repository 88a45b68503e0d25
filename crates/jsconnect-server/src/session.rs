//! Host Session
//!
//! The signed-in user of the host application, read from an HS256 JWT in
//! the session cookie. Anything that fails to verify is treated as
//! "not signed in".

use crate::config::SessionConfig;
use axum::http::{header::COOKIE, HeaderMap};
use jsconnect::AuthenticatedIdentity;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Session token claims
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    pub exp: usize,
}

impl From<SessionClaims> for AuthenticatedIdentity {
    fn from(claims: SessionClaims) -> Self {
        let roles = if claims.roles.is_empty() {
            None
        } else {
            Some(claims.roles.join(","))
        };

        Self {
            unique_id: claims.sub,
            full_name: claims.name,
            email: claims.email,
            avatar_url: claims.avatar_url,
            roles,
        }
    }
}

/// Issues a session token
pub fn create_token(claims: &SessionClaims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes()))
}

/// Verifies a session token
pub fn verify_token(token: &str, secret: &str) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Signed-in identity of the caller, if any
pub fn identity_from_headers(headers: &HeaderMap, config: &SessionConfig) -> Option<AuthenticatedIdentity> {
    if config.jwt_secret.is_empty() {
        return None;
    }

    let token = session_cookie(headers, &config.cookie_name)?;
    match verify_token(token, &config.jwt_secret) {
        Ok(claims) => Some(claims.into()),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring invalid session cookie");
            None
        }
    }
}

fn session_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
