//! Shared helpers for the black-box HTTP tests

#![allow(dead_code)]

use serde_json::{json, Value};
use std::net::TcpListener;

use sekolah::auth::TokenService;
use sekolah::configuration::AuthSettings;
use sekolah::rbac::RolePermissionTable;
use sekolah::startup::{run, Security, Stores};

pub const TEST_SECRET: &str = "integration-test-secret-key-with-enough-bytes";
pub const PASSWORD: &str = "RahasiaSekali123";

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    /// Signs tokens with the server's secret
    pub tokens: TokenService,
}

fn auth_settings() -> AuthSettings {
    let mut settings = AuthSettings::new(TEST_SECRET);
    settings.password_hash_cost = 4;
    settings
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(RolePermissionTable::school_default())
}

/// Same as `spawn_app`, gated by `permissions` instead of the school matrix
pub fn spawn_app_with(permissions: RolePermissionTable) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let settings = auth_settings();
    let security = Security::from_settings(&settings, permissions)
        .expect("Failed to build security settings");
    let server = run(listener, Stores::in_memory(), security).expect("Failed to create server");
    let _ = tokio::spawn(server);

    TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        tokens: TokenService::new(&settings).expect("Failed to build token service"),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn register(&self, kind: &str, nama: &str, email: &str) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/auth/register/{}", kind)))
            .json(&json!({ "nama": nama, "email": email, "password": PASSWORD }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Logs in and returns the access token, panicking on failure
    pub async fn access_token(&self, email: &str) -> String {
        let response = self.login(email, PASSWORD).await;
        assert_eq!(200, response.status().as_u16(), "login failed for {}", email);
        let body: Value = response.json().await.unwrap();
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Registers a Guru and returns their access token
    pub async fn guru(&self, email: &str) -> String {
        let response = self.register("guru", "Ibu Sari", email).await;
        assert_eq!(201, response.status().as_u16());
        self.access_token(email).await
    }

    /// Registers a Murid; returns (id, registration token)
    pub async fn pending_murid(&self, email: &str) -> (i64, String) {
        let response = self.register("murid", "Andi Pratama", email).await;
        assert_eq!(201, response.status().as_u16());
        let body: Value = response.json().await.unwrap();
        (
            body["user"]["id"].as_i64().unwrap(),
            body["registration_token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn complete_profile(&self, registration_token: &str, kelas_id: i32) -> reqwest::Response {
        self.client
            .put(self.url("/api/auth/murid/complete-profile"))
            .bearer_auth(registration_token)
            .json(&json!({
                "nis": "12345",
                "nisn": "0098765432",
                "kelas_id": kelas_id,
                "jurusan_id": 1,
                "tanggal_lahir": "2008-05-17",
                "jenis_kelamin": "L",
                "no_telepon": "081234567890",
                "alamat": "Jl. Merdeka 10",
                "nama_ortu": "Budi Pratama",
                "no_telepon_ortu": "081298765432"
            }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn verify(&self, guru_token: &str, murid_id: i64) -> reqwest::Response {
        self.client
            .patch(self.url(&format!("/api/murid/{}/verify", murid_id)))
            .bearer_auth(guru_token)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Full student onboarding; returns the student's access token
    pub async fn verified_murid(&self, guru_token: &str, email: &str, kelas_id: i32) -> String {
        let (id, registration_token) = self.pending_murid(email).await;
        assert_eq!(200, self.complete_profile(&registration_token, kelas_id).await.status().as_u16());
        assert_eq!(200, self.verify(guru_token, id).await.status().as_u16());
        self.access_token(email).await
    }
}

pub async fn error_code(response: reqwest::Response) -> String {
    let body: Value = response.json().await.expect("Failed to parse error body");
    body["code"].as_str().unwrap_or_default().to_string()
}
