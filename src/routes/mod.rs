mod auth;
mod health_check;
mod murid;
mod tugas;

use crate::audit::AuditLog;
use crate::auth::Principal;
use crate::error::AppError;
use crate::rbac::AuthorizationGate;

pub use auth::{complete_murid_profile, login, me, register_admin, register_guru, register_murid};
pub use health_check::health_check;
pub use murid::{get_murid, list_murid, verify_murid};
pub use tugas::{create_tugas, delete_tugas, get_tugas, list_tugas, update_tugas};

/// Module gate for handlers; a refusal is written to the audit trail
fn require_module(
    gate: &AuthorizationGate,
    principal: &Principal,
    module: &str,
) -> Result<(), AppError> {
    gate.check_permission(principal, module).map_err(|e| {
        AuditLog::access_denied(principal, module).emit();
        e
    })
}
