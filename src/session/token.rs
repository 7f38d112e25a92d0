//! Client-side reading of the session token.
//!
//! The API issues a JWT. The client only reads its claims to learn the
//! permission; the signature is never checked here because the key lives
//! on the server, which verifies every request.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use super::permission::{Permission, UnknownPermission};

/// Claims the client cares about. Anything else in the payload is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub permissao: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token malformado: {0}")]
    Malformed(String),

    #[error("token expirado")]
    Expired,

    #[error(transparent)]
    UnknownPermission(#[from] UnknownPermission),
}

fn claims_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_aud = false;
    // `exp` is checked when present but not demanded
    validation.required_spec_claims.clear();
    validation.validate_exp = true;
    validation
}

/// Read the claims of a token without verifying its signature.
pub fn decode_claims(token: &str) -> Result<Claims, TokenError> {
    let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &claims_validation())
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed(e.to_string()),
        })?;

    Ok(data.claims)
}

/// Derive the permission from a token.
///
/// A missing `permissao` claim means the least privileged role; a claim
/// outside the known vocabulary is rejected.
pub fn decode_permission(token: &str) -> Result<Permission, TokenError> {
    let claims = decode_claims(token)?;
    match claims.permissao {
        None => Ok(Permission::Visualizador),
        Some(label) => Ok(label.parse()?),
    }
}
