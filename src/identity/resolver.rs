/// Identity resolver
///
/// Looks a subject (email) up across the three account stores in a fixed
/// order: Admin, Guru, Murid. The first hit wins.

use std::sync::Arc;

use crate::auth::Principal;
use crate::error::{AppError, AuthError, ValidationError};
use crate::identity::Identity;
use crate::store::IdentityStore;

#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn IdentityStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, subject: &str) -> Result<Option<Identity>, AppError> {
        if let Some(admin) = self.store.find_admin(subject).await? {
            return Ok(Some(Identity::Admin(admin)));
        }
        if let Some(guru) = self.store.find_guru(subject).await? {
            return Ok(Some(Identity::Guru(guru)));
        }
        if let Some(murid) = self.store.find_murid(subject).await? {
            return Ok(Some(Identity::Murid(murid)));
        }
        Ok(None)
    }

    /// # Errors
    /// `AlreadyRegistered` when any store already holds `subject`
    pub async fn ensure_unregistered(&self, subject: &str) -> Result<(), AppError> {
        match self.resolve(subject).await? {
            Some(_) => Err(ValidationError::AlreadyRegistered(subject.to_string()).into()),
            None => Ok(()),
        }
    }

    /// Loads the record behind an authenticated principal
    ///
    /// The token role must agree with the store the subject lives in.
    ///
    /// # Errors
    /// - `InvalidCredential` on a role mismatch
    /// - `NotFound` when the account no longer exists
    pub async fn resolve_principal(&self, principal: &Principal) -> Result<Identity, AppError> {
        let identity = self
            .resolve(&principal.subject)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Account {}", principal.subject)))?;

        if !identity.accepts_role(principal.role) {
            tracing::warn!(
                subject = %principal.subject,
                claimed_role = %principal.role,
                stored_role = %identity.role(),
                "Token role does not match stored identity"
            );
            return Err(AuthError::InvalidCredential.into());
        }

        Ok(identity)
    }
}
