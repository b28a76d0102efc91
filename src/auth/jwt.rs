/// Bearer Token Issuance and Validation
///
/// Tokens are compact JWS strings (`header.payload.signature`) signed with a
/// shared HMAC secret. There is no revocation list: a token stays valid until
/// its `exp`. Rotating the secret invalidates every outstanding token.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::Arc;

use crate::auth::claims::{Claims, RawClaims};
use crate::auth::principal::Role;
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError, ConfigError, ValidationError};

#[derive(Clone)]
pub struct TokenService {
    keys: Arc<Keys>,
    algorithm: Algorithm,
    default_ttl: Duration,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    /// # Errors
    /// Returns a config error for an empty secret, a non-HMAC algorithm, or a
    /// non-positive default lifetime
    pub fn new(settings: &AuthSettings) -> Result<Self, AppError> {
        if settings.secret_key.is_empty() {
            return Err(ConfigError::MissingRequired("auth.secret_key".to_string()).into());
        }

        let algorithm = Algorithm::from_str(&settings.algorithm).map_err(|_| {
            ConfigError::InvalidValue(format!("unknown signing algorithm {}", settings.algorithm))
        })?;
        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(ConfigError::InvalidValue(format!(
                "{} needs a key pair; only HS256, HS384 and HS512 are supported",
                settings.algorithm
            ))
            .into());
        }

        if settings.access_token_expire_minutes <= 0 {
            return Err(ConfigError::InvalidValue(
                "auth.access_token_expire_minutes must be positive".to_string(),
            )
            .into());
        }

        let default_ttl = Duration::try_minutes(settings.access_token_expire_minutes)
            .filter(|ttl| Utc::now().checked_add_signed(*ttl).is_some())
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "auth.access_token_expire_minutes is out of range".to_string(),
                )
            })?;

        let secret = settings.secret_key.as_bytes();
        Ok(Self {
            keys: Arc::new(Keys {
                encoding: EncodingKey::from_secret(secret),
                decoding: DecodingKey::from_secret(secret),
            }),
            algorithm,
            default_ttl,
        })
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Signs `claims` with `exp = now + ttl` and `iat = now` added
    ///
    /// `ttl` falls back to the configured default. Caller-supplied `exp` and
    /// `iat` are overwritten.
    ///
    /// # Errors
    /// Returns error if `now + ttl` is not a representable time or the
    /// claims cannot be encoded
    pub fn issue(&self, mut claims: Map<String, Value>, ttl: Option<Duration>) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl.unwrap_or(self.default_ttl))
            .ok_or_else(|| ValidationError::InvalidFormat("token lifetime".to_string()))?;
        claims.insert("exp".to_string(), Value::from(expires_at.timestamp()));
        claims.insert("iat".to_string(), Value::from(now.timestamp()));

        encode(&Header::new(self.algorithm), &claims, &self.keys.encoding)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Access token for `subject` acting as `role`, with the default lifetime
    pub fn issue_for(&self, subject: &str, role: Role) -> Result<String, AppError> {
        let mut claims = Map::new();
        claims.insert("sub".to_string(), Value::from(subject));
        claims.insert("role".to_string(), Value::from(role.as_str()));
        self.issue(claims, None)
    }

    /// Verifies the signature, then the expiry, then subject and role
    ///
    /// # Errors
    /// - `InvalidCredential`: malformed token, bad signature, wrong algorithm,
    ///   missing `exp`, or a role outside the role set
    /// - `ExpiredCredential`: `now >= exp`
    /// - `IncompleteCredential`: `sub` or `role` absent
    pub fn validate(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is checked below without leeway so `now < exp` is exact
        validation.validate_exp = false;
        validation.leeway = 0;
        // `aud` is an ordinary caller claim here, not an audience restriction
        validation.validate_aud = false;

        let raw = decode::<RawClaims>(token, &self.keys.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::warn!(error = %e, "Bearer token rejected");
                AppError::Auth(AuthError::InvalidCredential)
            })?;

        if Utc::now().timestamp() >= raw.exp {
            tracing::info!("Bearer token expired");
            return Err(AuthError::ExpiredCredential.into());
        }

        Claims::try_from(raw)
    }
}
