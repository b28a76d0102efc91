use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::error::{AppError, ValidationError};
use crate::identity::{AdminRecord, GuruRecord, MuridProfile, MuridRecord, NewAccount};
use crate::store::{IdentityStore, TugasStore};
use crate::tugas::{TugasInput, TugasRecord};

const DEFAULT_STATUS: &str = "Active";

#[derive(Debug, Default)]
struct Tables {
    admin: Vec<AdminRecord>,
    guru: Vec<GuruRecord>,
    murid: Vec<MuridRecord>,
    tugas: Vec<TugasRecord>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn email_taken(&self, email: &str) -> bool {
        self.admin.iter().any(|r| r.email == email)
            || self.guru.iter().any(|r| r.email == email)
            || self.murid.iter().any(|r| r.email == email)
    }

    fn claim_email(&self, email: &str) -> Result<(), AppError> {
        if self.email_taken(email) {
            return Err(ValidationError::AlreadyRegistered(email.to_string()).into());
        }
        Ok(())
    }

    fn murid_mut(&mut self, id: i32) -> Result<&mut MuridRecord, AppError> {
        self.murid
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::not_found(format!("Murid {}", id)))
    }
}

/// Process-local store behind one mutex
///
/// The check and insert for a registration happen under the same lock, so
/// the joint email uniqueness holds across concurrent requests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables
            .lock()
            .map_err(|_| AppError::Internal("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    async fn find_admin(&self, email: &str) -> Result<Option<AdminRecord>, AppError> {
        Ok(self.tables()?.admin.iter().find(|r| r.email == email).cloned())
    }

    async fn find_guru(&self, email: &str) -> Result<Option<GuruRecord>, AppError> {
        Ok(self.tables()?.guru.iter().find(|r| r.email == email).cloned())
    }

    async fn find_murid(&self, email: &str) -> Result<Option<MuridRecord>, AppError> {
        Ok(self.tables()?.murid.iter().find(|r| r.email == email).cloned())
    }

    async fn find_murid_by_id(&self, id: i32) -> Result<Option<MuridRecord>, AppError> {
        Ok(self.tables()?.murid.iter().find(|r| r.id == id).cloned())
    }

    async fn list_murid(&self, verified: Option<bool>) -> Result<Vec<MuridRecord>, AppError> {
        Ok(self
            .tables()?
            .murid
            .iter()
            .filter(|r| verified.map_or(true, |v| r.is_verified == v))
            .cloned()
            .collect())
    }

    async fn insert_admin(&self, account: NewAccount) -> Result<AdminRecord, AppError> {
        let mut tables = self.tables()?;
        tables.claim_email(&account.email)?;
        let record = AdminRecord {
            id: tables.next_id(),
            nama: account.nama,
            email: account.email,
            password_hash: account.password_hash,
            status: DEFAULT_STATUS.to_string(),
        };
        tables.admin.push(record.clone());
        Ok(record)
    }

    async fn insert_guru(&self, account: NewAccount) -> Result<GuruRecord, AppError> {
        let mut tables = self.tables()?;
        tables.claim_email(&account.email)?;
        let record = GuruRecord {
            id: tables.next_id(),
            nama: account.nama,
            email: account.email,
            password_hash: account.password_hash,
            status: DEFAULT_STATUS.to_string(),
        };
        tables.guru.push(record.clone());
        Ok(record)
    }

    async fn insert_murid(&self, account: NewAccount) -> Result<MuridRecord, AppError> {
        let mut tables = self.tables()?;
        tables.claim_email(&account.email)?;
        let record = MuridRecord {
            id: tables.next_id(),
            nama: account.nama,
            email: account.email,
            password_hash: account.password_hash,
            status: DEFAULT_STATUS.to_string(),
            is_verified: false,
            nis: None,
            nisn: None,
            kelas_id: None,
            jurusan_id: None,
            tanggal_lahir: None,
            jenis_kelamin: None,
            no_telepon: None,
            alamat: None,
            nama_ortu: None,
            no_telepon_ortu: None,
        };
        tables.murid.push(record.clone());
        Ok(record)
    }

    async fn complete_murid_profile(
        &self,
        id: i32,
        profile: MuridProfile,
    ) -> Result<MuridRecord, AppError> {
        let mut tables = self.tables()?;
        let record = tables.murid_mut(id)?;
        record.nis = Some(profile.nis);
        record.nisn = Some(profile.nisn);
        record.kelas_id = Some(profile.kelas_id);
        record.jurusan_id = Some(profile.jurusan_id);
        record.tanggal_lahir = Some(profile.tanggal_lahir);
        record.jenis_kelamin = Some(profile.jenis_kelamin);
        record.no_telepon = Some(profile.no_telepon);
        record.alamat = Some(profile.alamat);
        record.nama_ortu = Some(profile.nama_ortu);
        record.no_telepon_ortu = Some(profile.no_telepon_ortu);
        Ok(record.clone())
    }

    async fn set_murid_verified(&self, id: i32) -> Result<MuridRecord, AppError> {
        let mut tables = self.tables()?;
        let record = tables.murid_mut(id)?;
        record.is_verified = true;
        Ok(record.clone())
    }
}

#[async_trait]
impl TugasStore for InMemoryStore {
    async fn insert(&self, guru_id: i32, input: TugasInput) -> Result<TugasRecord, AppError> {
        let mut tables = self.tables()?;
        let record = TugasRecord {
            id: tables.next_id(),
            judul: input.judul.trim().to_string(),
            deskripsi: input.deskripsi,
            mata_pelajaran_id: input.mata_pelajaran_id,
            kelas_id: input.kelas_id,
            guru_id,
            deadline: input.deadline,
            bobot: input.bobot,
            file_tugas: input.file_tugas,
            status: input.status,
        };
        tables.tugas.push(record.clone());
        Ok(record)
    }

    async fn find(&self, id: i32) -> Result<Option<TugasRecord>, AppError> {
        Ok(self.tables()?.tugas.iter().find(|t| t.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<TugasRecord>, AppError> {
        Ok(self.tables()?.tugas.clone())
    }

    async fn list_by_guru(&self, guru_id: i32) -> Result<Vec<TugasRecord>, AppError> {
        Ok(self
            .tables()?
            .tugas
            .iter()
            .filter(|t| t.guru_id == guru_id)
            .cloned()
            .collect())
    }

    async fn list_by_kelas(&self, kelas_id: i32) -> Result<Vec<TugasRecord>, AppError> {
        Ok(self
            .tables()?
            .tugas
            .iter()
            .filter(|t| t.kelas_id == Some(kelas_id))
            .cloned()
            .collect())
    }

    async fn update(&self, id: i32, input: TugasInput) -> Result<TugasRecord, AppError> {
        let mut tables = self.tables()?;
        let record = tables
            .tugas
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| AppError::not_found(format!("Tugas {}", id)))?;

        record.judul = input.judul.trim().to_string();
        record.deskripsi = input.deskripsi;
        record.mata_pelajaran_id = input.mata_pelajaran_id;
        record.kelas_id = input.kelas_id;
        record.deadline = input.deadline;
        record.bobot = input.bobot;
        record.file_tugas = input.file_tugas;
        record.status = input.status;
        Ok(record.clone())
    }

    async fn delete(&self, id: i32) -> Result<(), AppError> {
        let mut tables = self.tables()?;
        let before = tables.tugas.len();
        tables.tugas.retain(|t| t.id != id);
        if tables.tugas.len() == before {
            return Err(AppError::not_found(format!("Tugas {}", id)));
        }
        Ok(())
    }
}
