/// Authentication Routes
///
/// Registration for the three account kinds, login, profile completion for
/// freshly registered students, and the current caller's identity.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::audit::{AuditAction, AuditLog};
use crate::auth::{CredentialHasher, Principal, Role, TokenService};
use crate::error::{AppError, AuthError, ErrorContext, ValidationError};
use crate::identity::{Identity, IdentityResolver, MuridProfile, NewAccount};
use crate::store::IdentityStore;
use crate::validators::{is_valid_email, is_valid_name, is_valid_password, is_valid_profile};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub nama: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `role` and `user` come from the flattened identity
#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    #[serde(flatten)]
    pub identity: Identity,
}

#[derive(Serialize)]
pub struct MuridRegistrationResponse<T: Serialize> {
    pub message: &'static str,
    pub registration_token: String,
    pub token_type: &'static str,
    pub next_step: &'static str,
    pub user: T,
}

const TOKEN_TYPE: &str = "bearer";
const COMPLETE_PROFILE_STEP: &str = "PUT /api/auth/murid/complete-profile";

/// Validates the form, checks the email is free everywhere and hashes the
/// password off the async executor
async fn prepare_account(
    form: RegisterRequest,
    resolver: &IdentityResolver,
    hasher: CredentialHasher,
) -> Result<NewAccount, AppError> {
    let email = is_valid_email(&form.email)?;
    let nama = is_valid_name(&form.nama)?;
    is_valid_password(&form.password)?;

    resolver.ensure_unregistered(&email).await?;

    let password = form.password;
    let password_hash = web::block(move || hasher.hash(&password)).await??;

    Ok(NewAccount {
        nama,
        email,
        password_hash,
    })
}

/// POST /auth/register/admin
///
/// # Errors
/// - 400: validation failure or email already used by any account
pub async fn register_admin(
    form: web::Json<RegisterRequest>,
    resolver: web::Data<IdentityResolver>,
    store: web::Data<dyn IdentityStore>,
    hasher: web::Data<CredentialHasher>,
) -> Result<HttpResponse, AppError> {
    let account = prepare_account(form.into_inner(), &resolver, **hasher).await?;
    let admin = store.insert_admin(account).await?;

    AuditLog::success(AuditAction::Register, "admin", "Admin registered")
        .with_resource_id(admin.id)
        .with_actor(&admin.email, Role::Admin)
        .emit();

    Ok(HttpResponse::Created().json(admin))
}

/// POST /auth/register/guru
pub async fn register_guru(
    form: web::Json<RegisterRequest>,
    resolver: web::Data<IdentityResolver>,
    store: web::Data<dyn IdentityStore>,
    hasher: web::Data<CredentialHasher>,
) -> Result<HttpResponse, AppError> {
    let account = prepare_account(form.into_inner(), &resolver, **hasher).await?;
    let guru = store.insert_guru(account).await?;

    AuditLog::success(AuditAction::Register, "guru", "Guru registered")
        .with_resource_id(guru.id)
        .with_actor(&guru.email, Role::Guru)
        .emit();

    Ok(HttpResponse::Created().json(guru))
}

/// POST /auth/register/murid
///
/// Creates an unverified student and hands back a short-lived token with the
/// `Murid-Registration` role. That token is only good for completing the
/// profile; the student can log in once a teacher has verified them.
pub async fn register_murid(
    form: web::Json<RegisterRequest>,
    resolver: web::Data<IdentityResolver>,
    store: web::Data<dyn IdentityStore>,
    hasher: web::Data<CredentialHasher>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    let account = prepare_account(form.into_inner(), &resolver, **hasher).await?;
    let murid = store.insert_murid(account).await?;
    let registration_token = tokens.issue_for(&murid.email, Role::MuridRegistration)?;

    AuditLog::success(AuditAction::Register, "murid", "Murid registered, awaiting verification")
        .with_resource_id(murid.id)
        .with_actor(&murid.email, Role::MuridRegistration)
        .emit();

    Ok(HttpResponse::Created().json(MuridRegistrationResponse {
        message: "Registration received. Complete your profile, then wait for a teacher to verify your account.",
        registration_token,
        token_type: TOKEN_TYPE,
        next_step: COMPLETE_PROFILE_STEP,
        user: murid,
    }))
}

/// Checks the password and the verification status of the account behind
/// `email`
///
/// An unknown email runs the same bcrypt work as a wrong password before
/// failing with the same error.
async fn authenticate(
    email: &str,
    password: String,
    resolver: &IdentityResolver,
    hasher: CredentialHasher,
) -> Result<Identity, AppError> {
    let identity = match resolver.resolve(email).await? {
        Some(identity) => identity,
        None => {
            web::block(move || hasher.verify_absent(&password)).await?;
            AuditLog::failure(AuditAction::Login, "account", "Unknown email").emit();
            return Err(AuthError::InvalidLogin.into());
        }
    };

    let stored_hash = identity.password_hash().to_string();
    let password_ok = web::block(move || hasher.verify(&password, &stored_hash)).await?;
    if !password_ok {
        AuditLog::failure(AuditAction::Login, "account", "Wrong password")
            .with_actor(email, identity.role())
            .emit();
        return Err(AuthError::InvalidLogin.into());
    }

    if let Identity::Murid(murid) = &identity {
        if !murid.is_verified {
            AuditLog::failure(AuditAction::Login, "murid", "Account not verified yet")
                .with_resource_id(murid.id)
                .with_actor(email, Role::Murid)
                .emit();
            return Err(AuthError::AccountNotVerified.into());
        }
    }

    Ok(identity)
}

/// POST /auth/login
///
/// # Errors
/// - 401 `INVALID_CREDENTIALS`: unknown email or wrong password (same answer
///   for both)
/// - 403 `ACCOUNT_NOT_VERIFIED`: correct password on an unverified student
pub async fn login(
    form: web::Json<LoginRequest>,
    resolver: web::Data<IdentityResolver>,
    hasher: web::Data<CredentialHasher>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    let LoginRequest { email, password } = form.into_inner();
    let email = email.trim().to_lowercase();
    let context = ErrorContext::new("login").with_subject(&email);

    let identity = match authenticate(&email, password, &resolver, **hasher).await {
        Ok(identity) => identity,
        Err(e) => {
            context.log_error(&e);
            return Err(e);
        }
    };

    let access_token = tokens.issue_for(identity.email(), identity.role())?;

    tracing::info!(
        request_id = %context.request_id,
        subject = %identity.email(),
        role = %identity.role(),
        "Login succeeded"
    );
    AuditLog::success(AuditAction::Login, identity.role().as_str(), "Login succeeded")
        .with_resource_id(identity.id())
        .with_actor(identity.email(), identity.role())
        .emit();

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        token_type: TOKEN_TYPE,
        expires_in: tokens.default_ttl().num_seconds(),
        identity,
    }))
}

/// PUT /api/auth/murid/complete-profile
///
/// # Errors
/// - 403: the token is not a registration token
/// - 400: invalid profile, or the account is already verified
pub async fn complete_murid_profile(
    principal: Principal,
    form: web::Json<MuridProfile>,
    resolver: web::Data<IdentityResolver>,
    store: web::Data<dyn IdentityStore>,
) -> Result<HttpResponse, AppError> {
    if principal.role != Role::MuridRegistration {
        return Err(AppError::forbidden(
            "profile completion needs a registration token",
        ));
    }

    let murid = match resolver.resolve_principal(&principal).await? {
        Identity::Murid(murid) => murid,
        _ => return Err(AuthError::InvalidCredential.into()),
    };

    if murid.is_verified {
        return Err(ValidationError::AlreadyVerified(format!("Murid {}", murid.id)).into());
    }

    let profile = is_valid_profile(form.into_inner())?;
    let updated = store.complete_murid_profile(murid.id, profile).await?;

    AuditLog::success(AuditAction::CompleteProfile, "murid", "Profile completed")
        .with_resource_id(updated.id)
        .with_actor(&principal.subject, principal.role)
        .emit();

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Profile saved. Wait for a teacher to verify your account.",
        "user": updated,
    })))
}

/// GET /api/me
pub async fn me(
    principal: Principal,
    resolver: web::Data<IdentityResolver>,
) -> Result<HttpResponse, AppError> {
    let identity = resolver.resolve_principal(&principal).await?;
    Ok(HttpResponse::Ok().json(identity))
}
