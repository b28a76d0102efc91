use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::auth::Role;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminRecord {
    pub id: i32,
    pub nama: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct GuruRecord {
    pub id: i32,
    pub nama: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub status: String,
}

/// Student account; `is_verified` flips to true once a teacher approves it
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MuridRecord {
    pub id: i32,
    pub nama: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub status: String,
    pub is_verified: bool,
    pub nis: Option<String>,
    pub nisn: Option<String>,
    pub kelas_id: Option<i32>,
    pub jurusan_id: Option<i32>,
    pub tanggal_lahir: Option<NaiveDate>,
    pub jenis_kelamin: Option<String>,
    pub no_telepon: Option<String>,
    pub alamat: Option<String>,
    pub nama_ortu: Option<String>,
    pub no_telepon_ortu: Option<String>,
}

/// Data needed to create any of the three account kinds
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub nama: String,
    pub email: String,
    pub password_hash: String,
}

/// Profile a student fills in after signing up, including guardian details
#[derive(Debug, Clone, Deserialize)]
pub struct MuridProfile {
    pub nis: String,
    pub nisn: String,
    pub kelas_id: i32,
    pub jurusan_id: i32,
    pub tanggal_lahir: NaiveDate,
    /// `L` or `P`
    pub jenis_kelamin: String,
    pub no_telepon: String,
    pub alamat: String,
    pub nama_ortu: String,
    pub no_telepon_ortu: String,
}

/// One account found in one of the three identity stores
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "role", content = "user")]
pub enum Identity {
    Admin(AdminRecord),
    Guru(GuruRecord),
    Murid(MuridRecord),
}

impl Identity {
    pub fn role(&self) -> Role {
        match self {
            Identity::Admin(_) => Role::Admin,
            Identity::Guru(_) => Role::Guru,
            Identity::Murid(_) => Role::Murid,
        }
    }

    pub fn id(&self) -> i32 {
        match self {
            Identity::Admin(r) => r.id,
            Identity::Guru(r) => r.id,
            Identity::Murid(r) => r.id,
        }
    }

    pub fn email(&self) -> &str {
        match self {
            Identity::Admin(r) => &r.email,
            Identity::Guru(r) => &r.email,
            Identity::Murid(r) => &r.email,
        }
    }

    pub fn password_hash(&self) -> &str {
        match self {
            Identity::Admin(r) => &r.password_hash,
            Identity::Guru(r) => &r.password_hash,
            Identity::Murid(r) => &r.password_hash,
        }
    }

    /// Whether a token issued for `role` may act as this identity
    ///
    /// A registration token belongs to a student record.
    pub fn accepts_role(&self, role: Role) -> bool {
        match (self, role) {
            (Identity::Murid(_), Role::MuridRegistration) => true,
            _ => self.role() == role,
        }
    }
}
