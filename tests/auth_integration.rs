mod common;

use chrono::Duration;
use serde_json::{json, Map, Value};

use common::{error_code, spawn_app, PASSWORD};
use sekolah::auth::{Role, TokenService};
use sekolah::configuration::AuthSettings;

fn claims(pairs: &[(&str, &str)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), Value::from(*v)))
        .collect()
}

// --- Registration ---

#[tokio::test]
async fn register_admin_returns_201_without_password_hash() {
    let app = spawn_app();

    let response = app.register("admin", "Pak Kepala", "kepala@sekolah.id").await;
    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["email"], "kepala@sekolah.id");
    assert_eq!(body["status"], "Active");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn register_murid_returns_registration_token() {
    let app = spawn_app();

    let response = app.register("murid", "Andi", "andi@sekolah.id").await;
    assert_eq!(201, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["is_verified"], false);
    assert!(body["next_step"].as_str().unwrap().contains("complete-profile"));

    let token = body["registration_token"].as_str().unwrap();
    let claims = app.tokens.validate(token).expect("registration token should validate");
    assert_eq!(claims.role, Role::MuridRegistration);
    assert_eq!(claims.sub, "andi@sekolah.id");
}

#[tokio::test]
async fn duplicate_email_is_rejected_across_roles() {
    let app = spawn_app();

    assert_eq!(201, app.register("guru", "Ibu Sari", "sari@sekolah.id").await.status().as_u16());

    for kind in ["admin", "guru", "murid"] {
        let response = app.register(kind, "Orang Lain", "SARI@sekolah.id").await;
        assert_eq!(400, response.status().as_u16(), "kind {} accepted a duplicate", kind);
        assert_eq!(error_code(response).await, "ALREADY_REGISTERED");
    }
}

#[tokio::test]
async fn register_rejects_invalid_input() {
    let app = spawn_app();
    let cases = [
        (json!({ "nama": "Sari", "email": "not-an-email", "password": PASSWORD }), "bad email"),
        (json!({ "nama": "", "email": "a@sekolah.id", "password": PASSWORD }), "empty name"),
        (json!({ "nama": "Sari", "email": "b@sekolah.id", "password": "pendek" }), "short password"),
        (json!({ "nama": "Sari", "email": "c@sekolah.id" }), "missing password"),
    ];

    for (body, description) in cases {
        let response = app
            .client
            .post(app.url("/auth/register/guru"))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.");
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request for {}.",
            description
        );
    }
}

// --- Login ---

#[tokio::test]
async fn login_returns_bearer_token_and_identity() {
    let app = spawn_app();
    app.register("guru", "Ibu Sari", "sari@sekolah.id").await;

    let response = app.login("sari@sekolah.id", PASSWORD).await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["role"], "Guru");
    assert_eq!(body["user"]["email"], "sari@sekolah.id");
    assert!(body["user"].get("password_hash").is_none());

    let claims = app.tokens.validate(body["access_token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.role, Role::Guru);
}

#[tokio::test]
async fn unknown_email_and_wrong_password_look_the_same() {
    let app = spawn_app();
    app.register("admin", "Pak Kepala", "kepala@sekolah.id").await;

    let unknown = app.login("siapa@sekolah.id", PASSWORD).await;
    assert_eq!(401, unknown.status().as_u16());
    let unknown: Value = unknown.json().await.unwrap();

    let wrong = app.login("kepala@sekolah.id", "SalahTotal999").await;
    assert_eq!(401, wrong.status().as_u16());
    let wrong: Value = wrong.json().await.unwrap();

    assert_eq!(unknown["code"], "INVALID_CREDENTIALS");
    assert_eq!(unknown["code"], wrong["code"]);
    assert_eq!(unknown["message"], wrong["message"]);
}

#[tokio::test]
async fn unverified_murid_cannot_log_in() {
    let app = spawn_app();
    app.pending_murid("andi@sekolah.id").await;

    let response = app.login("andi@sekolah.id", PASSWORD).await;
    assert_eq!(403, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "ACCOUNT_NOT_VERIFIED");
    assert!(body.get("access_token").is_none());
}

#[tokio::test]
async fn unverified_murid_with_wrong_password_gets_401() {
    let app = spawn_app();
    app.pending_murid("andi@sekolah.id").await;

    let response = app.login("andi@sekolah.id", "BukanPassword1").await;
    assert_eq!(401, response.status().as_u16());
}

// --- Bearer credential handling ---

#[tokio::test]
async fn missing_bearer_returns_401_with_challenge() {
    let app = spawn_app();

    let response = app
        .client
        .get(app.url("/api/me"))
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    assert_eq!(
        response.headers().get("www-authenticate").and_then(|v| v.to_str().ok()),
        Some("Bearer")
    );
    assert_eq!(error_code(response).await, "UNAUTHENTICATED");
}

#[tokio::test]
async fn non_bearer_scheme_is_unauthenticated() {
    let app = spawn_app();

    let response = app
        .client
        .get(app.url("/api/me"))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(401, response.status().as_u16());
    assert_eq!(error_code(response).await, "UNAUTHENTICATED");
}

#[tokio::test]
async fn expired_token_is_reported_as_expired() {
    let app = spawn_app();
    app.register("guru", "Ibu Sari", "sari@sekolah.id").await;

    let token = app
        .tokens
        .issue(
            claims(&[("sub", "sari@sekolah.id"), ("role", "Guru")]),
            Some(Duration::minutes(-1)),
        )
        .unwrap();

    let response = app.get("/api/me", &token).await;
    assert_eq!(401, response.status().as_u16());
    assert_eq!(error_code(response).await, "TOKEN_EXPIRED");
}

#[tokio::test]
async fn token_signed_with_another_secret_is_invalid() {
    let app = spawn_app();
    app.register("guru", "Ibu Sari", "sari@sekolah.id").await;

    let foreign = TokenService::new(&AuthSettings::new("some-other-secret-entirely-different")).unwrap();
    let token = foreign.issue_for("sari@sekolah.id", Role::Guru).unwrap();

    let response = app.get("/api/me", &token).await;
    assert_eq!(401, response.status().as_u16());
    assert_eq!(error_code(response).await, "TOKEN_INVALID");
}

#[tokio::test]
async fn token_without_role_is_incomplete() {
    let app = spawn_app();
    let token = app
        .tokens
        .issue(claims(&[("sub", "sari@sekolah.id")]), None)
        .unwrap();

    let response = app.get("/api/me", &token).await;
    assert_eq!(401, response.status().as_u16());
    assert_eq!(error_code(response).await, "TOKEN_INCOMPLETE");
}

#[tokio::test]
async fn garbage_token_is_invalid() {
    let app = spawn_app();

    let response = app.get("/api/me", "not.a.token").await;
    assert_eq!(401, response.status().as_u16());
    assert_eq!(error_code(response).await, "TOKEN_INVALID");
}

#[tokio::test]
async fn token_role_must_match_stored_identity() {
    let app = spawn_app();
    app.pending_murid("andi@sekolah.id").await;

    // Correctly signed, but the subject is a student
    let forged = app.tokens.issue_for("andi@sekolah.id", Role::Guru).unwrap();

    let response = app.get("/api/me", &forged).await;
    assert_eq!(401, response.status().as_u16());
    assert_eq!(error_code(response).await, "TOKEN_INVALID");
}

#[tokio::test]
async fn me_returns_the_resolved_identity() {
    let app = spawn_app();
    let token = app.guru("sari@sekolah.id").await;

    let response = app.get("/api/me", &token).await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["role"], "Guru");
    assert_eq!(body["user"]["email"], "sari@sekolah.id");
}

// --- Student onboarding ---

#[tokio::test]
async fn registration_token_is_forbidden_on_murid_module() {
    let app = spawn_app();
    let (_, registration_token) = app.pending_murid("andi@sekolah.id").await;

    let response = app.get("/api/murid", &registration_token).await;
    assert_eq!(403, response.status().as_u16());
    assert_eq!(error_code(response).await, "FORBIDDEN");

    let response = app.get("/api/tugas", &registration_token).await;
    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn complete_profile_fills_fields() {
    let app = spawn_app();
    let (_, registration_token) = app.pending_murid("andi@sekolah.id").await;

    let response = app.complete_profile(&registration_token, 3).await;
    assert_eq!(200, response.status().as_u16());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["kelas_id"], 3);
    assert_eq!(body["user"]["nis"], "12345");
    assert_eq!(body["user"]["is_verified"], false);
}

#[tokio::test]
async fn complete_profile_needs_registration_token() {
    let app = spawn_app();
    let guru_token = app.guru("sari@sekolah.id").await;

    let response = app.complete_profile(&guru_token, 3).await;
    assert_eq!(403, response.status().as_u16());
}

#[tokio::test]
async fn complete_profile_after_verification_is_rejected() {
    let app = spawn_app();
    let guru_token = app.guru("sari@sekolah.id").await;
    let (id, registration_token) = app.pending_murid("andi@sekolah.id").await;
    assert_eq!(200, app.verify(&guru_token, id).await.status().as_u16());

    let response = app.complete_profile(&registration_token, 3).await;
    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn guru_verifies_murid_once() {
    let app = spawn_app();
    let guru_token = app.guru("sari@sekolah.id").await;
    let (id, _) = app.pending_murid("andi@sekolah.id").await;

    let response = app.verify(&guru_token, id).await;
    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["is_verified"], true);

    let again = app.verify(&guru_token, id).await;
    assert_eq!(400, again.status().as_u16());

    assert_eq!(200, app.login("andi@sekolah.id", PASSWORD).await.status().as_u16());
}

#[tokio::test]
async fn admin_cannot_verify_and_missing_murid_is_404() {
    let app = spawn_app();
    app.register("admin", "Pak Kepala", "kepala@sekolah.id").await;
    let admin_token = app.access_token("kepala@sekolah.id").await;
    let guru_token = app.guru("sari@sekolah.id").await;
    let (id, _) = app.pending_murid("andi@sekolah.id").await;

    assert_eq!(403, app.verify(&admin_token, id).await.status().as_u16());
    assert_eq!(404, app.verify(&guru_token, 9999).await.status().as_u16());
}

#[tokio::test]
async fn murid_listing_respects_roles() {
    let app = spawn_app();
    let guru_token = app.guru("sari@sekolah.id").await;
    let andi = app.verified_murid(&guru_token, "andi@sekolah.id", 3).await;
    let (budi_id, _) = app.pending_murid("budi@sekolah.id").await;

    // Guru sees everyone, and can filter
    let all: Value = app.get("/api/murid", &guru_token).await.json().await.unwrap();
    assert_eq!(all.as_array().unwrap().len(), 2);
    let pending: Value = app
        .get("/api/murid?verified=false", &guru_token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["email"], "budi@sekolah.id");

    // A student only sees itself
    let own: Value = app.get("/api/murid", &andi).await.json().await.unwrap();
    assert_eq!(own.as_array().unwrap().len(), 1);
    assert_eq!(own[0]["email"], "andi@sekolah.id");

    let other = app.get(&format!("/api/murid/{}", budi_id), &andi).await;
    assert_eq!(403, other.status().as_u16());
}
