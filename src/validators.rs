/// Input validators for registration and profile data
///
/// Each validator returns the cleaned value on success so handlers never
/// store untrimmed input.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;
use crate::identity::MuridProfile;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321
const MAX_LOCAL_PART_LENGTH: usize = 64;
const MAX_NAME_LENGTH: usize = 256;
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

lazy_static! {
    // RFC 5322 simplified
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).unwrap();

    static ref PHONE_REGEX: Regex = Regex::new(r"^\+?[0-9]{8,15}$").unwrap();

    static ref DIGITS_REGEX: Regex = Regex::new(r"^[0-9]{4,20}$").unwrap();
}

/// Trims and lowercases; the result is the account subject
pub fn is_valid_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("email".to_string()));
    }
    if trimmed.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong("email".to_string(), MAX_EMAIL_LENGTH));
    }
    if !EMAIL_REGEX.is_match(trimmed) {
        return Err(ValidationError::InvalidFormat("email".to_string()));
    }
    if has_suspicious_email_patterns(trimmed) {
        return Err(ValidationError::SuspiciousContent("email".to_string()));
    }

    Ok(trimmed.to_lowercase())
}

pub fn is_valid_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("nama".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong("nama".to_string(), MAX_NAME_LENGTH));
    }
    if has_suspicious_name_patterns(trimmed) {
        return Err(ValidationError::SuspiciousContent("nama".to_string()));
    }

    Ok(trimmed.to_string())
}

/// Length is counted in characters. The password itself is never trimmed.
pub fn is_valid_password(password: &str) -> Result<(), ValidationError> {
    let length = password.chars().count();
    if length == 0 {
        return Err(ValidationError::EmptyField("password".to_string()));
    }
    if length < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password".to_string(), MIN_PASSWORD_LENGTH));
    }
    if length > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::TooLong("password".to_string(), MAX_PASSWORD_LENGTH));
    }
    Ok(())
}

/// Checks the student profile and returns a trimmed copy
pub fn is_valid_profile(profile: MuridProfile) -> Result<MuridProfile, ValidationError> {
    let nis = profile.nis.trim().to_string();
    let nisn = profile.nisn.trim().to_string();
    if !DIGITS_REGEX.is_match(&nis) {
        return Err(ValidationError::InvalidFormat("nis".to_string()));
    }
    if !DIGITS_REGEX.is_match(&nisn) {
        return Err(ValidationError::InvalidFormat("nisn".to_string()));
    }

    let jenis_kelamin = profile.jenis_kelamin.trim().to_uppercase();
    if jenis_kelamin != "L" && jenis_kelamin != "P" {
        return Err(ValidationError::InvalidFormat("jenis_kelamin".to_string()));
    }

    let no_telepon = is_valid_phone("no_telepon", &profile.no_telepon)?;
    let no_telepon_ortu = is_valid_phone("no_telepon_ortu", &profile.no_telepon_ortu)?;

    let alamat = profile.alamat.trim().to_string();
    if alamat.is_empty() {
        return Err(ValidationError::EmptyField("alamat".to_string()));
    }

    Ok(MuridProfile {
        nis,
        nisn,
        jenis_kelamin,
        no_telepon,
        no_telepon_ortu,
        alamat,
        nama_ortu: is_valid_name(&profile.nama_ortu)?,
        ..profile
    })
}

fn is_valid_phone(field: &str, phone: &str) -> Result<String, ValidationError> {
    let compact: String = phone.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    if compact.is_empty() {
        return Err(ValidationError::EmptyField(field.to_string()));
    }
    if !PHONE_REGEX.is_match(&compact) {
        return Err(ValidationError::InvalidFormat(field.to_string()));
    }
    Ok(compact)
}

fn has_suspicious_email_patterns(email: &str) -> bool {
    if let Some(at_pos) = email.find('@') {
        if at_pos > MAX_LOCAL_PART_LENGTH {
            return true;
        }
    }

    email.matches('@').count() != 1 || email.contains('\0')
}

fn has_suspicious_name_patterns(name: &str) -> bool {
    if name.chars().any(|c| c.is_control()) {
        return true;
    }

    let special_char_count = name
        .chars()
        .filter(|c| {
            !c.is_alphanumeric() && !c.is_whitespace() && !matches!(c, '-' | '.' | '_' | '\'' | ',')
        })
        .count();

    special_char_count > 5
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn profile() -> MuridProfile {
        MuridProfile {
            nis: " 12345 ".to_string(),
            nisn: "0098765432".to_string(),
            kelas_id: 1,
            jurusan_id: 2,
            tanggal_lahir: NaiveDate::from_ymd_opt(2008, 5, 17).unwrap(),
            jenis_kelamin: "p".to_string(),
            no_telepon: "0812-3456-7890".to_string(),
            alamat: "Jl. Merdeka 10".to_string(),
            nama_ortu: "Budi Santoso".to_string(),
            no_telepon_ortu: "+6281234567890".to_string(),
        }
    }

    #[test]
    fn test_valid_email_is_normalized() {
        assert_eq!(is_valid_email("  Guru@Sekolah.ID ").unwrap(), "guru@sekolah.id");
        assert!(is_valid_email("user+tag@example.com").is_ok());
    }

    #[test]
    fn test_invalid_email_format() {
        assert!(is_valid_email("").is_err());
        assert!(is_valid_email("invalid").is_err());
        assert!(is_valid_email("user@").is_err());
        assert!(is_valid_email("@example.com").is_err());
        assert!(is_valid_email("user@@example.com").is_err());
    }

    #[test]
    fn test_email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(is_valid_email(&too_long).is_err());

        let long_local = format!("{}@example.com", "a".repeat(65));
        assert!(is_valid_email(&long_local).is_err());
    }

    #[test]
    fn test_valid_name() {
        assert_eq!(is_valid_name("  Siti Nurhaliza ").unwrap(), "Siti Nurhaliza");
        assert!(is_valid_name("Jean-Pierre").is_ok());
        assert!(is_valid_name("O'Brien").is_ok());
    }

    #[test]
    fn test_invalid_name() {
        assert!(is_valid_name("").is_err());
        assert!(is_valid_name(&"a".repeat(257)).is_err());
        assert!(is_valid_name("Name\0with\0null").is_err());
        assert!(is_valid_name("!!!!!!@@@@").is_err());
    }

    #[test]
    fn test_password_length_bounds() {
        assert!(is_valid_password("rahasia1").is_ok());
        assert!(matches!(
            is_valid_password("pendek"),
            Err(ValidationError::TooShort(_, MIN_PASSWORD_LENGTH))
        ));
        assert!(is_valid_password(&"x".repeat(129)).is_err());
        assert!(is_valid_password("").is_err());
    }

    #[test]
    fn test_profile_is_cleaned() {
        let cleaned = is_valid_profile(profile()).unwrap();
        assert_eq!(cleaned.nis, "12345");
        assert_eq!(cleaned.jenis_kelamin, "P");
        assert_eq!(cleaned.no_telepon, "081234567890");
        assert_eq!(cleaned.kelas_id, 1);
    }

    #[test]
    fn test_profile_rejects_bad_fields() {
        let mut bad = profile();
        bad.jenis_kelamin = "X".to_string();
        assert!(is_valid_profile(bad).is_err());

        let mut bad = profile();
        bad.nis = "12a45".to_string();
        assert!(is_valid_profile(bad).is_err());

        let mut bad = profile();
        bad.no_telepon_ortu = "123".to_string();
        assert!(is_valid_profile(bad).is_err());
    }
}
