use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::audit::{AuditAction, AuditLog};
use crate::auth::{Principal, Role};
use crate::error::{AppError, ValidationError};
use crate::identity::{Identity, IdentityResolver, MuridRecord};
use crate::rbac::{modules, AuthorizationGate};
use crate::routes::require_module;
use crate::store::IdentityStore;

#[derive(Debug, Deserialize)]
pub struct MuridFilter {
    pub verified: Option<bool>,
}

/// A student principal resolved to its own record
async fn own_record(
    principal: &Principal,
    resolver: &IdentityResolver,
) -> Result<MuridRecord, AppError> {
    match resolver.resolve_principal(principal).await? {
        Identity::Murid(murid) => Ok(murid),
        _ => Err(AppError::forbidden("not a student account")),
    }
}

/// GET /api/murid
///
/// Students hold no `murid` grant; they get a list with only themselves.
pub async fn list_murid(
    principal: Principal,
    filter: web::Query<MuridFilter>,
    gate: web::Data<AuthorizationGate>,
    resolver: web::Data<IdentityResolver>,
    store: web::Data<dyn IdentityStore>,
) -> Result<HttpResponse, AppError> {
    if principal.role == Role::Murid {
        let murid = own_record(&principal, &resolver).await?;
        return Ok(HttpResponse::Ok().json(vec![murid]));
    }

    require_module(&gate, &principal, modules::MURID)?;
    let records = store.list_murid(filter.verified).await?;
    Ok(HttpResponse::Ok().json(records))
}

/// GET /api/murid/{id}
pub async fn get_murid(
    principal: Principal,
    path: web::Path<i32>,
    gate: web::Data<AuthorizationGate>,
    resolver: web::Data<IdentityResolver>,
    store: web::Data<dyn IdentityStore>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    if principal.role == Role::Murid {
        let murid = own_record(&principal, &resolver).await?;
        if murid.id != id {
            return Err(AppError::forbidden("students may only view their own record"));
        }
        return Ok(HttpResponse::Ok().json(murid));
    }

    require_module(&gate, &principal, modules::MURID)?;
    let murid = store
        .find_murid_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Murid {}", id)))?;
    Ok(HttpResponse::Ok().json(murid))
}

/// PATCH /api/murid/{id}/verify
///
/// Only teachers verify students. Verifying twice is a 400.
pub async fn verify_murid(
    principal: Principal,
    path: web::Path<i32>,
    gate: web::Data<AuthorizationGate>,
    resolver: web::Data<IdentityResolver>,
    store: web::Data<dyn IdentityStore>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    require_module(&gate, &principal, modules::MURID)?;
    if principal.role != Role::Guru {
        return Err(AppError::forbidden("only a Guru may verify students"));
    }
    resolver.resolve_principal(&principal).await?;

    let murid = store
        .find_murid_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Murid {}", id)))?;
    if murid.is_verified {
        return Err(ValidationError::AlreadyVerified(format!("Murid {}", id)).into());
    }

    let verified = store.set_murid_verified(id).await?;

    AuditLog::success(AuditAction::Verify, "murid", "Murid verified")
        .with_resource_id(id)
        .with_actor(&principal.subject, principal.role)
        .emit();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Murid verified",
        "user": verified,
    })))
}
