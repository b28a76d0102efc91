use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{CredentialHasher, TokenService};
use crate::configuration::AuthSettings;
use crate::error::AppError;
use crate::identity::IdentityResolver;
use crate::logger::LoggerMiddleware;
use crate::middleware::BearerAuth;
use crate::rbac::{AuthorizationGate, RolePermissionTable};
use crate::routes::{
    complete_murid_profile, create_tugas, delete_tugas, get_murid, get_tugas, health_check,
    list_murid, list_tugas, login, me, register_admin, register_guru, register_murid,
    update_tugas, verify_murid,
};
use crate::store::{IdentityStore, InMemoryStore, PgStore, TugasStore};

/// Data-access backends shared by every worker
#[derive(Clone)]
pub struct Stores {
    pub identities: Arc<dyn IdentityStore>,
    pub tugas: Arc<dyn TugasStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self {
            identities: store.clone(),
            tugas: store,
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            identities: store.clone(),
            tugas: store,
        }
    }
}

/// Token service, permission gate and password hasher, built once from
/// configuration
#[derive(Clone)]
pub struct Security {
    pub tokens: TokenService,
    pub gate: AuthorizationGate,
    pub hasher: CredentialHasher,
}

impl Security {
    pub fn from_settings(
        auth: &AuthSettings,
        permissions: RolePermissionTable,
    ) -> Result<Self, AppError> {
        Ok(Self {
            tokens: TokenService::new(auth)?,
            gate: AuthorizationGate::new(permissions),
            hasher: CredentialHasher::new(auth.password_hash_cost),
        })
    }
}

pub fn run(
    listener: TcpListener,
    stores: Stores,
    security: Security,
) -> Result<Server, std::io::Error> {
    let resolver = web::Data::new(IdentityResolver::new(stores.identities.clone()));
    let identity_store: web::Data<dyn IdentityStore> = web::Data::from(stores.identities);
    let tugas_store: web::Data<dyn TugasStore> = web::Data::from(stores.tugas);
    let tokens = web::Data::new(security.tokens.clone());
    let gate = web::Data::new(security.gate);
    let hasher = web::Data::new(security.hasher);
    let token_service = security.tokens;

    let server = HttpServer::new(move || {
        App::new()
            .wrap(LoggerMiddleware)
            .app_data(resolver.clone())
            .app_data(identity_store.clone())
            .app_data(tugas_store.clone())
            .app_data(tokens.clone())
            .app_data(gate.clone())
            .app_data(hasher.clone())
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/auth")
                    .route("/register/admin", web::post().to(register_admin))
                    .route("/register/guru", web::post().to(register_guru))
                    .route("/register/murid", web::post().to(register_murid))
                    .route("/login", web::post().to(login)),
            )
            // Bearer-protected routes
            .service(
                web::scope("/api")
                    .wrap(BearerAuth::new(token_service.clone()))
                    .route("/me", web::get().to(me))
                    .route(
                        "/auth/murid/complete-profile",
                        web::put().to(complete_murid_profile),
                    )
                    .route("/murid", web::get().to(list_murid))
                    .route("/murid/{id}", web::get().to(get_murid))
                    .route("/murid/{id}/verify", web::patch().to(verify_murid))
                    .route("/tugas", web::post().to(create_tugas))
                    .route("/tugas", web::get().to(list_tugas))
                    .route("/tugas/{id}", web::get().to(get_tugas))
                    .route("/tugas/{id}", web::put().to(update_tugas))
                    .route("/tugas/{id}", web::delete().to(delete_tugas)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
