/// Roles and the authenticated principal
///
/// A `Principal` is what the bearer middleware leaves in the request
/// extensions after a token validates. Handlers take it as an extractor.

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::{ready, Ready};
use std::str::FromStr;

use crate::error::{AppError, AuthError};
use crate::rbac::AuthorizationGate;

/// Closed set of roles a token may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Guru,
    Murid,
    /// Issued right after a student signs up; only good for completing the profile
    #[serde(rename = "Murid-Registration")]
    MuridRegistration,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Guru => "Guru",
            Role::Murid => "Murid",
            Role::MuridRegistration => "Murid-Registration",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role '{}'", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Role::Admin),
            "Guru" => Ok(Role::Guru),
            "Murid" => Ok(Role::Murid),
            "Murid-Registration" => Ok(Role::MuridRegistration),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Authenticated caller: subject (email) plus the role its token was issued for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub subject: String,
    pub role: Role,
}

impl Principal {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
        }
    }
}

impl FromRequest for Principal {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let principal = req.extensions().get::<Principal>().cloned();
        if principal.is_none() {
            tracing::warn!(path = %req.path(), "Principal requested on an unauthenticated route");
        }
        ready(AuthorizationGate::authorize(principal))
    }
}

impl From<UnknownRole> for AppError {
    fn from(err: UnknownRole) -> Self {
        tracing::warn!(error = %err, "Token carries a role outside the role set");
        AppError::Auth(AuthError::InvalidCredential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_its_wire_name() {
        for role in [Role::Admin, Role::Guru, Role::Murid, Role::MuridRegistration] {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
        }
    }

    #[test]
    fn test_registration_role_serializes_with_hyphen() {
        let json = serde_json::to_string(&Role::MuridRegistration).unwrap();
        assert_eq!(json, "\"Murid-Registration\"");
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        assert!("Kepala Sekolah".parse::<Role>().is_err());
        assert!("admin".parse::<Role>().is_err());
    }
}
