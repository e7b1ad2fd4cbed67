//! Identity claims and the role gate.
//!
//! The bearer token is decoded once per session into an immutable [`Claims`]
//! value which is then passed to whatever needs it. The gate only decides which
//! controls are offered; the backend enforces authorization on its own.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::common::string_or_number;

/// The only role value that unlocks administrative controls. Compared exactly.
pub const ADMIN_ROLE: &str = "Admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    /// Every role value other than [`ADMIN_ROLE`].
    Employee,
}

impl Role {
    pub fn from_claim(role: &str) -> Self {
        if role == ADMIN_ROLE {
            Role::Admin
        } else {
            Role::Employee
        }
    }

    pub fn can_review_requests(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "String::is_empty"
    )]
    pub sub: String, // user id
    #[serde(
        default,
        alias = "http://schemas.microsoft.com/ws/2008/06/identity/claims/role"
    )]
    pub role: String,
    #[serde(default, alias = "unique_name", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl Claims {
    /// Decode a bearer token.
    ///
    /// With a secret the HS256 signature is verified. Without one the payload
    /// is read as-is. An expired `exp` is rejected in both cases.
    pub fn decode(token: &str, secret: Option<&str>) -> Result<Self> {
        let token = extract_bearer_token(token).ok_or(AppError::Unauthorized)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_aud = false;

        let key = match secret {
            Some(secret) => DecodingKey::from_secret(secret.as_bytes()),
            None => {
                validation.insecure_disable_signature_validation();
                DecodingKey::from_secret(&[])
            }
        };

        let claims = decode::<Claims>(token, &key, &validation)
            .map_err(|e| {
                tracing::warn!("Identity token decode failed: {}", e);
                AppError::Unauthorized
            })?
            .claims;

        Ok(claims)
    }

    pub fn role(&self) -> Role {
        Role::from_claim(&self.role)
    }

    /// The caller's user id, if the token carries one.
    pub fn user_id(&self) -> Option<&str> {
        Some(self.sub.as_str()).filter(|id| !id.is_empty())
    }
}

/// Exact, case-sensitive comparison against [`ADMIN_ROLE`].
pub fn is_admin(claims: &Claims) -> bool {
    claims.role().is_admin()
}

/// Gate an admin-only UI action.
pub fn require_admin(claims: &Claims, action: &str) -> Result<()> {
    if claims.role().can_review_requests() {
        return Ok(());
    }
    tracing::warn!("Role {:?} may not {}", claims.role, action);
    Err(AppError::AuthorizationDisplay(action.to_string()))
}

/// Accepts a raw token or an `Authorization` header value.
pub fn extract_bearer_token(raw: &str) -> Option<&str> {
    let raw = raw.trim();
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    Some(token).filter(|t| !t.is_empty())
}
