/// Bearer token claims
///
/// `RawClaims` is whatever a correctly signed token decodes to; `Claims` is
/// the checked form with a subject and a known role.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::principal::{Principal, Role};
use crate::error::{AppError, AuthError};

/// Verified claims of an access token
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Claims {
    /// Subject (the account's email)
    pub sub: String,
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Any other claims the issuer added
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    pub fn principal(&self) -> Principal {
        Principal::new(self.sub.clone(), self.role)
    }
}

/// Claims as decoded, before the subject/role checks
#[derive(Debug, Deserialize)]
pub(crate) struct RawClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TryFrom<RawClaims> for Claims {
    type Error = AppError;

    fn try_from(raw: RawClaims) -> Result<Self, Self::Error> {
        let sub = raw.sub.filter(|s| !s.trim().is_empty());
        let role = raw.role.filter(|r| !r.trim().is_empty());

        let (sub, role) = match (sub, role) {
            (Some(sub), Some(role)) => (sub, role),
            _ => return Err(AuthError::IncompleteCredential.into()),
        };

        Ok(Claims {
            sub,
            role: role.parse::<Role>()?,
            exp: raw.exp,
            iat: raw.iat,
            extra: raw.extra,
        })
    }
}
