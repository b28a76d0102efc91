/// Persistence seam
///
/// Handlers and the identity resolver only see these traits. `PgStore` backs
/// them with Postgres; `InMemoryStore` keeps everything in process and is
/// used by the integration tests and the `memory` backend.

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;

use crate::error::AppError;
use crate::identity::{AdminRecord, GuruRecord, MuridProfile, MuridRecord, NewAccount};
use crate::tugas::{TugasInput, TugasRecord};

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_admin(&self, email: &str) -> Result<Option<AdminRecord>, AppError>;
    async fn find_guru(&self, email: &str) -> Result<Option<GuruRecord>, AppError>;
    async fn find_murid(&self, email: &str) -> Result<Option<MuridRecord>, AppError>;
    async fn find_murid_by_id(&self, id: i32) -> Result<Option<MuridRecord>, AppError>;

    /// `verified` narrows the listing when present
    async fn list_murid(&self, verified: Option<bool>) -> Result<Vec<MuridRecord>, AppError>;

    /// Each insert fails with `AlreadyRegistered` when the email exists in
    /// any of the three account tables.
    async fn insert_admin(&self, account: NewAccount) -> Result<AdminRecord, AppError>;
    async fn insert_guru(&self, account: NewAccount) -> Result<GuruRecord, AppError>;
    async fn insert_murid(&self, account: NewAccount) -> Result<MuridRecord, AppError>;

    async fn complete_murid_profile(
        &self,
        id: i32,
        profile: MuridProfile,
    ) -> Result<MuridRecord, AppError>;

    async fn set_murid_verified(&self, id: i32) -> Result<MuridRecord, AppError>;
}

#[async_trait]
pub trait TugasStore: Send + Sync {
    async fn insert(&self, guru_id: i32, input: TugasInput) -> Result<TugasRecord, AppError>;
    async fn find(&self, id: i32) -> Result<Option<TugasRecord>, AppError>;
    async fn list_all(&self) -> Result<Vec<TugasRecord>, AppError>;
    async fn list_by_guru(&self, guru_id: i32) -> Result<Vec<TugasRecord>, AppError>;
    async fn list_by_kelas(&self, kelas_id: i32) -> Result<Vec<TugasRecord>, AppError>;
    async fn update(&self, id: i32, input: TugasInput) -> Result<TugasRecord, AppError>;
    async fn delete(&self, id: i32) -> Result<(), AppError>;
}
