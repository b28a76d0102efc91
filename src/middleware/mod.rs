/// Middleware module
///
/// Custom middleware for authentication.

mod bearer_auth;

pub use bearer_auth::BearerAuth;
