/// Authorization gate
///
/// Answers "may this role touch this module at all". Pure: it reads only the
/// permission table it was built with and never consults storage. Record
/// ownership checks belong to the handlers.

use std::sync::Arc;

use crate::auth::Principal;
use crate::error::{AppError, AuthError};
use crate::rbac::policy::RolePermissionTable;

#[derive(Debug, Clone)]
pub struct AuthorizationGate {
    table: Arc<RolePermissionTable>,
}

impl AuthorizationGate {
    pub fn new(table: RolePermissionTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    /// Accepts a principal only if one is present and names a subject
    ///
    /// # Errors
    /// Returns `Unauthenticated` otherwise
    pub fn authorize(principal: Option<Principal>) -> Result<Principal, AppError> {
        match principal {
            Some(p) if !p.subject.trim().is_empty() => Ok(p),
            _ => Err(AuthError::Unauthenticated.into()),
        }
    }

    /// # Errors
    /// Returns `Forbidden` when the principal's role does not hold `module`
    pub fn check_permission(&self, principal: &Principal, module: &str) -> Result<(), AppError> {
        if self.table.allows(principal.role, module) {
            return Ok(());
        }

        Err(AppError::forbidden(format!(
            "{} may not access module '{}'",
            principal.role, module
        )))
    }

    pub fn has_full_access(&self, principal: &Principal) -> bool {
        self.table.has_full_access(principal.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::rbac::modules;

    fn gate() -> AuthorizationGate {
        AuthorizationGate::new(RolePermissionTable::school_default())
    }

    fn is_forbidden(result: Result<(), AppError>) -> bool {
        matches!(result, Err(AppError::Auth(AuthError::Forbidden(_))))
    }

    #[test]
    fn test_admin_may_touch_anything() {
        let admin = Principal::new("admin@sekolah.id", Role::Admin);
        for module in [modules::ADMIN, modules::TUGAS, modules::CLUSTER, "anything"] {
            assert!(gate().check_permission(&admin, module).is_ok());
        }
        assert!(gate().has_full_access(&admin));
    }

    #[test]
    fn test_murid_may_not_touch_admin() {
        let murid = Principal::new("murid@sekolah.id", Role::Murid);
        assert!(is_forbidden(gate().check_permission(&murid, modules::ADMIN)));
        assert!(gate().check_permission(&murid, modules::TUGAS).is_ok());
    }

    #[test]
    fn test_guru_tugas_but_not_admin() {
        let guru = Principal::new("guru@sekolah.id", Role::Guru);
        assert!(gate().check_permission(&guru, modules::TUGAS).is_ok());
        assert!(is_forbidden(gate().check_permission(&guru, modules::ADMIN)));
    }

    #[test]
    fn test_registration_role_is_denied_everywhere() {
        let pending = Principal::new("baru@sekolah.id", Role::MuridRegistration);
        for module in [modules::KELAS, modules::TUGAS, modules::MURID] {
            assert!(is_forbidden(gate().check_permission(&pending, module)));
        }
    }

    #[test]
    fn test_substituted_policy() {
        let strict = AuthorizationGate::new(RolePermissionTable::new().with_role(Role::Guru, ["kelas"]));
        let admin = Principal::new("admin@sekolah.id", Role::Admin);
        let guru = Principal::new("guru@sekolah.id", Role::Guru);

        assert!(is_forbidden(strict.check_permission(&admin, modules::KELAS)));
        assert!(strict.check_permission(&guru, modules::KELAS).is_ok());
        assert!(is_forbidden(strict.check_permission(&guru, modules::TUGAS)));
    }

    #[test]
    fn test_authorize_requires_a_principal_with_subject() {
        assert!(matches!(
            AuthorizationGate::authorize(None),
            Err(AppError::Auth(AuthError::Unauthenticated))
        ));
        assert!(matches!(
            AuthorizationGate::authorize(Some(Principal::new("", Role::Admin))),
            Err(AppError::Auth(AuthError::Unauthenticated))
        ));

        let guru = Principal::new("guru@sekolah.id", Role::Guru);
        assert_eq!(AuthorizationGate::authorize(Some(guru.clone())).unwrap(), guru);
    }
}
