/// Assignments (tugas) created by teachers for a class

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

const MAX_JUDUL_LENGTH: usize = 200;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TugasRecord {
    pub id: i32,
    pub judul: String,
    pub deskripsi: Option<String>,
    pub mata_pelajaran_id: Option<i32>,
    pub kelas_id: Option<i32>,
    /// Teacher who created the assignment; only they may change it
    pub guru_id: i32,
    pub deadline: Option<DateTime<Utc>>,
    pub bobot: i32,
    pub file_tugas: Option<String>,
    pub status: String,
}

/// Request body for creating or replacing an assignment
///
/// The owner is never taken from the body; handlers fill it from the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct TugasInput {
    pub judul: String,
    #[serde(default)]
    pub deskripsi: Option<String>,
    #[serde(default)]
    pub mata_pelajaran_id: Option<i32>,
    #[serde(default)]
    pub kelas_id: Option<i32>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default = "default_bobot")]
    pub bobot: i32,
    #[serde(default)]
    pub file_tugas: Option<String>,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_bobot() -> i32 {
    100
}

fn default_status() -> String {
    "Active".to_string()
}

impl TugasInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let judul = self.judul.trim();
        if judul.is_empty() {
            return Err(ValidationError::EmptyField("judul".to_string()));
        }
        if judul.chars().count() > MAX_JUDUL_LENGTH {
            return Err(ValidationError::TooLong("judul".to_string(), MAX_JUDUL_LENGTH));
        }
        if !(0..=100).contains(&self.bobot) {
            return Err(ValidationError::InvalidFormat(
                "bobot must be between 0 and 100".to_string(),
            ));
        }
        if !matches!(self.status.as_str(), "Active" | "Closed") {
            return Err(ValidationError::InvalidFormat(
                "status must be Active or Closed".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(judul: &str) -> TugasInput {
        serde_json::from_value(serde_json::json!({ "judul": judul })).unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let tugas = input("Latihan Aljabar");
        assert_eq!(tugas.bobot, 100);
        assert_eq!(tugas.status, "Active");
        assert!(tugas.validate().is_ok());
    }

    #[test]
    fn test_blank_title_rejected() {
        assert!(input("   ").validate().is_err());
    }

    #[test]
    fn test_bad_status_and_weight_rejected() {
        let mut tugas = input("Esai");
        tugas.status = "Draft".to_string();
        assert!(tugas.validate().is_err());

        let mut tugas = input("Esai");
        tugas.bobot = 150;
        assert!(tugas.validate().is_err());
    }
}
