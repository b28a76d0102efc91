use sekolah::configuration::{get_configuration, StoreBackend};
use sekolah::rbac::RolePermissionTable;
use sekolah::startup::{run, Security, Stores};
use sekolah::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;

fn startup_error(kind: std::io::ErrorKind, what: &str, e: impl std::fmt::Display) -> std::io::Error {
    tracing::error!(error = %e, "{}", what);
    std::io::Error::new(kind, format!("{}: {}", what, e))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();
    tracing::info!("Starting application");

    let configuration = get_configuration().map_err(|e| {
        startup_error(std::io::ErrorKind::InvalidInput, "Failed to read configuration", e)
    })?;
    tracing::info!(auth = ?configuration.auth, "Configuration loaded");

    let permissions = match &configuration.permissions {
        Some(section) => RolePermissionTable::from_config(section).map_err(|e| {
            startup_error(std::io::ErrorKind::InvalidInput, "Invalid permissions table", e)
        })?,
        None => RolePermissionTable::school_default(),
    };

    let security = Security::from_settings(&configuration.auth, permissions).map_err(|e| {
        startup_error(std::io::ErrorKind::InvalidInput, "Invalid auth settings", e)
    })?;

    let stores = match configuration.application.store {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Stores::in_memory()
        }
        StoreBackend::Postgres => {
            let database = configuration.database.as_ref().ok_or_else(|| {
                startup_error(
                    std::io::ErrorKind::InvalidInput,
                    "Missing database settings",
                    "the postgres store needs a `database` section",
                )
            })?;

            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(&database.connection_string())
                .await
                .map_err(|e| {
                    startup_error(
                        std::io::ErrorKind::ConnectionRefused,
                        "Failed to create connection pool",
                        e,
                    )
                })?;

            sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
                startup_error(std::io::ErrorKind::Other, "Failed to run migrations", e)
            })?;
            tracing::info!("Database ready");

            Stores::postgres(pool)
        }
    };

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!(address = %address, "Server listening");

    run(listener, stores, security)?.await
}
