//! Module names used as the unit of permission granting.
//!
//! Handlers pass one of these to `AuthorizationGate::check_permission`
//! instead of a string literal.

/// Sentinel in a permission list meaning every module
pub const ALL: &str = "all";

pub const ADMIN: &str = "admin";
pub const MURID: &str = "murid";
pub const KELAS: &str = "kelas";
pub const MATA_PELAJARAN: &str = "mata_pelajaran";
pub const ABSENSI: &str = "absensi";
pub const TUGAS: &str = "tugas";
pub const MATERI: &str = "materi";
pub const QUIZ: &str = "quiz";
pub const SOAL_QUIZ: &str = "soal_quiz";
pub const HASIL_QUIZ: &str = "hasil_quiz";
pub const VIDEO: &str = "video";
pub const PKL: &str = "pkl";
pub const JURUSAN: &str = "jurusan";
pub const BERITA: &str = "berita";
pub const DASHBOARD_GURU: &str = "dashboard_guru";
pub const CLUSTER: &str = "cluster";

/// Modules a teacher may touch
pub const GURU_MODULES: &[&str] = &[
    MURID,
    KELAS,
    MATA_PELAJARAN,
    ABSENSI,
    TUGAS,
    MATERI,
    QUIZ,
    SOAL_QUIZ,
    HASIL_QUIZ,
    VIDEO,
    PKL,
    JURUSAN,
    DASHBOARD_GURU,
    CLUSTER,
];

/// Modules a student may read
pub const MURID_MODULES: &[&str] = &[
    KELAS,
    MATERI,
    MATA_PELAJARAN,
    QUIZ,
    HASIL_QUIZ,
    TUGAS,
    BERITA,
    VIDEO,
    JURUSAN,
];
