/// Assignment (tugas) routes
///
/// Every handler first asks the gate for the `tugas` module. Ownership and
/// class membership are then checked against the caller's resolved record.

use actix_web::{web, HttpResponse};

use crate::audit::{AuditAction, AuditLog};
use crate::auth::Principal;
use crate::error::AppError;
use crate::identity::{Identity, IdentityResolver};
use crate::rbac::{modules, AuthorizationGate};
use crate::routes::require_module;
use crate::store::TugasStore;
use crate::tugas::{TugasInput, TugasRecord};

/// Resolves the caller and returns their Guru id, or 403
async fn owning_guru(
    principal: &Principal,
    resolver: &IdentityResolver,
) -> Result<i32, AppError> {
    match resolver.resolve_principal(principal).await? {
        Identity::Guru(guru) => Ok(guru.id),
        _ => Err(AppError::forbidden("only a Guru may manage assignments")),
    }
}

async fn find_tugas(store: &dyn TugasStore, id: i32) -> Result<TugasRecord, AppError> {
    store
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Tugas {}", id)))
}

fn ensure_owner(tugas: &TugasRecord, guru_id: i32) -> Result<(), AppError> {
    if tugas.guru_id != guru_id {
        return Err(AppError::forbidden("assignment belongs to another Guru"));
    }
    Ok(())
}

/// POST /api/tugas
pub async fn create_tugas(
    principal: Principal,
    form: web::Json<TugasInput>,
    gate: web::Data<AuthorizationGate>,
    resolver: web::Data<IdentityResolver>,
    store: web::Data<dyn TugasStore>,
) -> Result<HttpResponse, AppError> {
    require_module(&gate, &principal, modules::TUGAS)?;
    let guru_id = owning_guru(&principal, &resolver).await?;

    let input = form.into_inner();
    input.validate()?;
    let tugas = store.insert(guru_id, input).await?;

    AuditLog::success(AuditAction::Create, "tugas", "Tugas created")
        .with_resource_id(tugas.id)
        .with_actor(&principal.subject, principal.role)
        .emit();

    Ok(HttpResponse::Created().json(tugas))
}

/// GET /api/tugas
///
/// A role holding `all` sees everything. Otherwise Guru: own assignments,
/// Murid: assignments for their class (none until a class is set), Admin:
/// everything.
pub async fn list_tugas(
    principal: Principal,
    gate: web::Data<AuthorizationGate>,
    resolver: web::Data<IdentityResolver>,
    store: web::Data<dyn TugasStore>,
) -> Result<HttpResponse, AppError> {
    require_module(&gate, &principal, modules::TUGAS)?;
    let identity = resolver.resolve_principal(&principal).await?;

    let records = if gate.has_full_access(&principal) {
        store.list_all().await?
    } else {
        match identity {
            Identity::Guru(guru) => store.list_by_guru(guru.id).await?,
            Identity::Murid(murid) => match murid.kelas_id {
                Some(kelas_id) => store.list_by_kelas(kelas_id).await?,
                None => Vec::new(),
            },
            Identity::Admin(_) => store.list_all().await?,
        }
    };

    Ok(HttpResponse::Ok().json(records))
}

/// GET /api/tugas/{id}
pub async fn get_tugas(
    principal: Principal,
    path: web::Path<i32>,
    gate: web::Data<AuthorizationGate>,
    resolver: web::Data<IdentityResolver>,
    store: web::Data<dyn TugasStore>,
) -> Result<HttpResponse, AppError> {
    require_module(&gate, &principal, modules::TUGAS)?;
    let identity = resolver.resolve_principal(&principal).await?;
    let tugas = find_tugas(store.get_ref(), path.into_inner()).await?;

    if gate.has_full_access(&principal) {
        return Ok(HttpResponse::Ok().json(tugas));
    }

    if let Identity::Murid(murid) = &identity {
        if murid.kelas_id.is_none() || murid.kelas_id != tugas.kelas_id {
            return Err(AppError::forbidden("assignment is not for your class"));
        }
    }

    Ok(HttpResponse::Ok().json(tugas))
}

/// PUT /api/tugas/{id}
pub async fn update_tugas(
    principal: Principal,
    path: web::Path<i32>,
    form: web::Json<TugasInput>,
    gate: web::Data<AuthorizationGate>,
    resolver: web::Data<IdentityResolver>,
    store: web::Data<dyn TugasStore>,
) -> Result<HttpResponse, AppError> {
    require_module(&gate, &principal, modules::TUGAS)?;
    let guru_id = owning_guru(&principal, &resolver).await?;

    let id = path.into_inner();
    let existing = find_tugas(store.get_ref(), id).await?;
    ensure_owner(&existing, guru_id)?;

    let input = form.into_inner();
    input.validate()?;
    let updated = store.update(id, input).await?;

    AuditLog::success(AuditAction::Update, "tugas", "Tugas updated")
        .with_resource_id(id)
        .with_actor(&principal.subject, principal.role)
        .emit();

    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /api/tugas/{id}
pub async fn delete_tugas(
    principal: Principal,
    path: web::Path<i32>,
    gate: web::Data<AuthorizationGate>,
    resolver: web::Data<IdentityResolver>,
    store: web::Data<dyn TugasStore>,
) -> Result<HttpResponse, AppError> {
    require_module(&gate, &principal, modules::TUGAS)?;
    let guru_id = owning_guru(&principal, &resolver).await?;

    let id = path.into_inner();
    let existing = find_tugas(store.get_ref(), id).await?;
    ensure_owner(&existing, guru_id)?;
    store.delete(id).await?;

    AuditLog::success(AuditAction::Delete, "tugas", "Tugas deleted")
        .with_resource_id(id)
        .with_actor(&principal.subject, principal.role)
        .emit();

    Ok(HttpResponse::NoContent().finish())
}
