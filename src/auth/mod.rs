/// Authentication module
///
/// Password hashing, bearer token issuance/validation, and the principal
/// type handed to route handlers.

mod claims;
mod jwt;
mod password;
mod principal;

pub use claims::Claims;
pub use jwt::TokenService;
pub use password::{truncate_to_limit, CredentialHasher, MAX_PASSWORD_BYTES};
pub use principal::{Principal, Role, UnknownRole};
