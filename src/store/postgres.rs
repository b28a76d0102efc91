use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::error::{AppError, ValidationError};
use crate::identity::{AdminRecord, GuruRecord, MuridProfile, MuridRecord, NewAccount};
use crate::store::{IdentityStore, TugasStore};
use crate::tugas::{TugasInput, TugasRecord};

const ADMIN_COLUMNS: &str = "id, nama, email, password_hash, status";
const GURU_COLUMNS: &str = "id, nama, email, password_hash, status";
const MURID_COLUMNS: &str = "id, nama, email, password_hash, status, is_verified, nis, nisn, \
     kelas_id, jurusan_id, tanggal_lahir, jenis_kelamin, no_telepon, alamat, nama_ortu, \
     no_telepon_ortu";
const TUGAS_COLUMNS: &str = "id, judul, deskripsi, mata_pelajaran_id, kelas_id, guru_id, \
     deadline, bobot, file_tugas, status";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a transaction holding an advisory lock on `email`, then fails if
    /// the address is already used by any account kind
    ///
    /// Concurrent registrations for the same address serialize on the lock,
    /// so only one of them can pass the check and insert.
    async fn claim_email(&self, email: &str) -> Result<Transaction<'static, Postgres>, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(email)
            .execute(&mut tx)
            .await?;

        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (SELECT 1 FROM admin WHERE email = $1)
                OR EXISTS (SELECT 1 FROM guru WHERE email = $1)
                OR EXISTS (SELECT 1 FROM murid WHERE email = $1)
            "#,
        )
        .bind(email)
        .fetch_one(&mut tx)
        .await?;

        if taken {
            tx.rollback().await?;
            return Err(ValidationError::AlreadyRegistered(email.to_string()).into());
        }

        Ok(tx)
    }
}

#[async_trait]
impl IdentityStore for PgStore {
    async fn find_admin(&self, email: &str) -> Result<Option<AdminRecord>, AppError> {
        let record = sqlx::query_as::<_, AdminRecord>(&format!(
            "SELECT {} FROM admin WHERE email = $1",
            ADMIN_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn find_guru(&self, email: &str) -> Result<Option<GuruRecord>, AppError> {
        let record = sqlx::query_as::<_, GuruRecord>(&format!(
            "SELECT {} FROM guru WHERE email = $1",
            GURU_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn find_murid(&self, email: &str) -> Result<Option<MuridRecord>, AppError> {
        let record = sqlx::query_as::<_, MuridRecord>(&format!(
            "SELECT {} FROM murid WHERE email = $1",
            MURID_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn find_murid_by_id(&self, id: i32) -> Result<Option<MuridRecord>, AppError> {
        let record = sqlx::query_as::<_, MuridRecord>(&format!(
            "SELECT {} FROM murid WHERE id = $1",
            MURID_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn list_murid(&self, verified: Option<bool>) -> Result<Vec<MuridRecord>, AppError> {
        // NULL filter matches every row
        let records = sqlx::query_as::<_, MuridRecord>(&format!(
            "SELECT {} FROM murid WHERE ($1::BOOLEAN IS NULL OR is_verified = $1) ORDER BY id",
            MURID_COLUMNS
        ))
        .bind(verified)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn insert_admin(&self, account: NewAccount) -> Result<AdminRecord, AppError> {
        let mut tx = self.claim_email(&account.email).await?;
        let record = sqlx::query_as::<_, AdminRecord>(&format!(
            "INSERT INTO admin (nama, email, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            ADMIN_COLUMNS
        ))
        .bind(&account.nama)
        .bind(&account.email)
        .bind(&account.password_hash)
        .fetch_one(&mut tx)
        .await?;
        tx.commit().await?;
        Ok(record)
    }

    async fn insert_guru(&self, account: NewAccount) -> Result<GuruRecord, AppError> {
        let mut tx = self.claim_email(&account.email).await?;
        let record = sqlx::query_as::<_, GuruRecord>(&format!(
            "INSERT INTO guru (nama, email, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            GURU_COLUMNS
        ))
        .bind(&account.nama)
        .bind(&account.email)
        .bind(&account.password_hash)
        .fetch_one(&mut tx)
        .await?;
        tx.commit().await?;
        Ok(record)
    }

    async fn insert_murid(&self, account: NewAccount) -> Result<MuridRecord, AppError> {
        let mut tx = self.claim_email(&account.email).await?;
        let record = sqlx::query_as::<_, MuridRecord>(&format!(
            "INSERT INTO murid (nama, email, password_hash, is_verified) \
             VALUES ($1, $2, $3, FALSE) RETURNING {}",
            MURID_COLUMNS
        ))
        .bind(&account.nama)
        .bind(&account.email)
        .bind(&account.password_hash)
        .fetch_one(&mut tx)
        .await?;
        tx.commit().await?;
        Ok(record)
    }

    async fn complete_murid_profile(
        &self,
        id: i32,
        profile: MuridProfile,
    ) -> Result<MuridRecord, AppError> {
        let record = sqlx::query_as::<_, MuridRecord>(&format!(
            r#"
            UPDATE murid
            SET nis = $2, nisn = $3, kelas_id = $4, jurusan_id = $5, tanggal_lahir = $6,
                jenis_kelamin = $7, no_telepon = $8, alamat = $9, nama_ortu = $10,
                no_telepon_ortu = $11, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            MURID_COLUMNS
        ))
        .bind(id)
        .bind(&profile.nis)
        .bind(&profile.nisn)
        .bind(profile.kelas_id)
        .bind(profile.jurusan_id)
        .bind(profile.tanggal_lahir)
        .bind(&profile.jenis_kelamin)
        .bind(&profile.no_telepon)
        .bind(&profile.alamat)
        .bind(&profile.nama_ortu)
        .bind(&profile.no_telepon_ortu)
        .fetch_optional(&self.pool)
        .await?;

        record.ok_or_else(|| AppError::not_found(format!("Murid {}", id)))
    }

    async fn set_murid_verified(&self, id: i32) -> Result<MuridRecord, AppError> {
        let record = sqlx::query_as::<_, MuridRecord>(&format!(
            "UPDATE murid SET is_verified = TRUE, updated_at = NOW() WHERE id = $1 RETURNING {}",
            MURID_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        record.ok_or_else(|| AppError::not_found(format!("Murid {}", id)))
    }
}

#[async_trait]
impl TugasStore for PgStore {
    async fn insert(&self, guru_id: i32, input: TugasInput) -> Result<TugasRecord, AppError> {
        let record = sqlx::query_as::<_, TugasRecord>(&format!(
            r#"
            INSERT INTO tugas
                (judul, deskripsi, mata_pelajaran_id, kelas_id, guru_id, deadline, bobot,
                 file_tugas, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            TUGAS_COLUMNS
        ))
        .bind(input.judul.trim())
        .bind(&input.deskripsi)
        .bind(input.mata_pelajaran_id)
        .bind(input.kelas_id)
        .bind(guru_id)
        .bind(input.deadline)
        .bind(input.bobot)
        .bind(&input.file_tugas)
        .bind(&input.status)
        .fetch_one(&self.pool)
        .await?;
        Ok(record)
    }

    async fn find(&self, id: i32) -> Result<Option<TugasRecord>, AppError> {
        let record = sqlx::query_as::<_, TugasRecord>(&format!(
            "SELECT {} FROM tugas WHERE id = $1",
            TUGAS_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn list_all(&self) -> Result<Vec<TugasRecord>, AppError> {
        let records = sqlx::query_as::<_, TugasRecord>(&format!(
            "SELECT {} FROM tugas ORDER BY id",
            TUGAS_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn list_by_guru(&self, guru_id: i32) -> Result<Vec<TugasRecord>, AppError> {
        let records = sqlx::query_as::<_, TugasRecord>(&format!(
            "SELECT {} FROM tugas WHERE guru_id = $1 ORDER BY id",
            TUGAS_COLUMNS
        ))
        .bind(guru_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn list_by_kelas(&self, kelas_id: i32) -> Result<Vec<TugasRecord>, AppError> {
        let records = sqlx::query_as::<_, TugasRecord>(&format!(
            "SELECT {} FROM tugas WHERE kelas_id = $1 ORDER BY id",
            TUGAS_COLUMNS
        ))
        .bind(kelas_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn update(&self, id: i32, input: TugasInput) -> Result<TugasRecord, AppError> {
        let record = sqlx::query_as::<_, TugasRecord>(&format!(
            r#"
            UPDATE tugas
            SET judul = $2, deskripsi = $3, mata_pelajaran_id = $4, kelas_id = $5,
                deadline = $6, bobot = $7, file_tugas = $8, status = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            TUGAS_COLUMNS
        ))
        .bind(id)
        .bind(input.judul.trim())
        .bind(&input.deskripsi)
        .bind(input.mata_pelajaran_id)
        .bind(input.kelas_id)
        .bind(input.deadline)
        .bind(input.bobot)
        .bind(&input.file_tugas)
        .bind(&input.status)
        .fetch_optional(&self.pool)
        .await?;

        record.ok_or_else(|| AppError::not_found(format!("Tugas {}", id)))
    }

    async fn delete(&self, id: i32) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tugas WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Tugas {}", id)));
        }
        Ok(())
    }
}
