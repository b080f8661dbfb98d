//! End-to-end checks of the HTTP surface against an in-memory database

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use parks_server::auth::{password, AuthService};
use parks_server::config::{AuthConfig, StorageConfig};
use parks_server::models::Coordinates;
use parks_server::services::{
    CurrentWeather, Forecast, LocalStorage, WeatherError, WeatherProvider,
};
use parks_server::{build_router, create_memory_pool, AppState, ServerConfig};

const ADMIN_PASSWORD: &str = "correct horse";

/// Weather provider with no upstream configured
struct Offline;

#[async_trait]
impl WeatherProvider for Offline {
    async fn current(&self, _at: Coordinates) -> Result<CurrentWeather, WeatherError> {
        Err(WeatherError::NotConfigured)
    }

    async fn forecast(&self, _at: Coordinates, _days: usize) -> Result<Forecast, WeatherError> {
        Err(WeatherError::NotConfigured)
    }
}

struct TestApp {
    router: Router,
    uploads: tempfile::TempDir,
}

impl TestApp {
    async fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("parks_server=debug")
            .with_test_writer()
            .try_init();

        let uploads = tempfile::tempdir().unwrap();
        let pool = create_memory_pool().await.unwrap();
        let hash = password::hash_password(ADMIN_PASSWORD).unwrap();

        let state = AppState {
            pool,
            auth: AuthService::new(AuthConfig::with_admin("admin", hash, "test-signing-secret")),
            storage: Arc::new(LocalStorage::new(&StorageConfig::with_dir(uploads.path()))),
            weather: Arc::new(Offline),
        };
        let config = ServerConfig {
            upload_dir: uploads.path().to_path_buf(),
            ..ServerConfig::default()
        };

        Self {
            router: build_router(state, &config),
            uploads,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> Response {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn json(&self, method: &str, uri: &str, token: Option<&str>, body: Value) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn login(&self) -> String {
        let response = self
            .json(
                "POST",
                "/api/auth/login",
                None,
                json!({ "username": "admin", "password": ADMIN_PASSWORD }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["token_type"], "bearer");
        body["access_token"].as_str().unwrap().to_owned()
    }

    async fn create_park(&self, token: &str, name: &str) -> i64 {
        let response = self
            .json(
                "POST",
                "/api/parks",
                Some(token),
                json!({
                    "name": name,
                    "governorate": "Bizerte",
                    "description": "Zone humide",
                    "latitude": 37.16,
                    "longitude": 9.67
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["id"].as_i64().unwrap()
    }

    /// Multipart POST of a small JPEG to `uri`
    async fn upload_jpeg(&self, token: &str, uri: &str) -> Response {
        let boundary = "parks-test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"lac.jpg\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0]);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        self.send(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::from(body))
                .unwrap(),
        )
        .await
    }

    async fn delete(&self, token: &str, uri: &str) -> Response {
        self.send(
            Request::builder()
                .method("DELETE")
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    fn stored_file(&self, bucket: &str, filename: &str) -> std::path::PathBuf {
        self.uploads.path().join(bucket).join(filename)
    }
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let app = TestApp::new().await;
    let response = app.get("/api/health").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = TestApp::new().await;
    let response = app
        .json(
            "POST",
            "/api/auth/login",
            None,
            json!({ "username": "admin", "password": "nope" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
}

#[tokio::test]
async fn writes_require_a_token() {
    let app = TestApp::new().await;
    let response = app
        .json("POST", "/api/badges", None, json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .json("POST", "/api/badges", Some("not-a-jwt"), json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "unauthorized");
}

#[tokio::test]
async fn me_returns_admin_profile() {
    let app = TestApp::new().await;
    let token = app.login().await;
    let response = app
        .send(
            Request::builder()
                .uri("/api/auth/me")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["username"], "admin");
}

#[tokio::test]
async fn species_lifecycle_through_api() {
    let app = TestApp::new().await;
    let token = app.login().await;
    let ichkeul = app.create_park(&token, "Ichkeul").await;
    let chaambi = app.create_park(&token, "Chaambi").await;

    let response = app
        .json(
            "POST",
            "/api/species",
            Some(&token),
            json!({
                "name": "Gazelle de Cuvier",
                "scientific_name": "Gazella cuvieri",
                "type": "animal",
                "description": "Antilope",
                "park_ids": [chaambi, chaambi + 1000]
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["park_ids"], json!([chaambi]));
    let id = created["id"].as_i64().unwrap();

    let response = app
        .json(
            "PUT",
            &format!("/api/species/{id}"),
            Some(&token),
            json!({ "park_ids": [ichkeul, chaambi] }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["park_ids"], json!([ichkeul, chaambi]));

    let response = app
        .get(&format!("/api/species?type=animal&park_id={ichkeul}"))
        .await;
    let listed = body_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let response = app.get(&format!("/api/parks/{ichkeul}/species")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await[0]["name"], "Gazelle de Cuvier");

    let response = app
        .send(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/species/{id}"))
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.get(&format!("/api/parks/{chaambi}/species")).await;
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn unknown_species_type_is_a_validation_error() {
    let app = TestApp::new().await;
    let response = app.get("/api/species?type=fungus").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "validation_error");
}

#[tokio::test]
async fn missing_records_are_not_found() {
    let app = TestApp::new().await;
    for uri in ["/api/species/404", "/api/parks/404", "/api/parks/404/species"] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body_json(response).await["error"], "not_found");
    }
}

#[tokio::test]
async fn non_numeric_id_is_rejected() {
    let app = TestApp::new().await;
    let response = app.get("/api/parks/abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_a_validation_error() {
    let app = TestApp::new().await;
    let token = app.login().await;
    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/parks")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::AUTHORIZATION, format!("Bearer {token}"))
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_badge_is_a_conflict() {
    let app = TestApp::new().await;
    let token = app.login().await;
    let badge = json!({
        "name": "Explorateur",
        "description": "Visiter trois parcs",
        "icon": "compass",
        "requirement": "visit_3_parks",
        "points": 50
    });

    let first = app.json("POST", "/api/badges", Some(&token), badge.clone()).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.json("POST", "/api/badges", Some(&token), badge).await;
    assert_eq!(second.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(second).await["error"], "conflict");
}

#[tokio::test]
async fn reviews_update_park_rating() {
    let app = TestApp::new().await;
    let token = app.login().await;
    let park = app.create_park(&token, "Boukornine").await;

    for (rating, title) in [(5, "Superbe"), (4, "Bien")] {
        let response = app
            .json(
                "POST",
                &format!("/api/parks/{park}/reviews"),
                None,
                json!({
                    "author_name": "Sami",
                    "rating": rating,
                    "title": title,
                    "comment": "Belle randonnée"
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app.get(&format!("/api/parks/{park}")).await;
    let body = body_json(response).await;
    assert_eq!(body["average_rating"], 4.5);
    assert_eq!(body["total_reviews"], 2);
}

#[tokio::test]
async fn weather_without_upstream_is_unavailable() {
    let app = TestApp::new().await;
    let token = app.login().await;
    let park = app.create_park(&token, "El Feija").await;

    let response = app.get(&format!("/api/parks/{park}/weather")).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = app.get(&format!("/api/parks/{park}/map")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let links = body_json(response).await;
    assert!(links["directions_url"]
        .as_str()
        .unwrap()
        .contains("destination=37.16,9.67"));
}

#[tokio::test]
async fn park_image_upload_and_removal() {
    let app = TestApp::new().await;
    let token = app.login().await;
    let park = app.create_park(&token, "Ichkeul").await;

    let response = app
        .upload_jpeg(&token, &format!("/api/parks/{park}/images"))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let park_body = body_json(response).await;
    let filename = park_body["images"][0].as_str().unwrap().to_owned();
    assert!(filename.ends_with(".jpg"));
    assert!(park_body["image_urls"][0]
        .as_str()
        .unwrap()
        .starts_with("/uploads/parks/"));
    assert!(app.stored_file("parks", &filename).exists());

    let response = app
        .delete(&token, &format!("/api/parks/{park}/images/{filename}"))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!app.stored_file("parks", &filename).exists());
}

#[tokio::test]
async fn deleting_a_park_removes_its_stored_images() {
    let app = TestApp::new().await;
    let token = app.login().await;
    let park = app.create_park(&token, "El Feija").await;

    let response = app
        .upload_jpeg(&token, &format!("/api/parks/{park}/images"))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let filename = body_json(response).await["images"][0]
        .as_str()
        .unwrap()
        .to_owned();
    let stored = app.stored_file("parks", &filename);
    assert!(stored.exists());

    let response = app.delete(&token, &format!("/api/parks/{park}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!stored.exists());
    assert_eq!(
        app.get(&format!("/api/parks/{park}")).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn deleting_a_species_removes_its_stored_image() {
    let app = TestApp::new().await;
    let token = app.login().await;

    let response = app
        .json(
            "POST",
            "/api/species",
            Some(&token),
            json!({
                "name": "Cerf de Barbarie",
                "scientific_name": "Cervus elaphus barbarus",
                "type": "animal",
                "description": "Cerf d'Afrique du Nord"
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .upload_jpeg(&token, &format!("/api/species/{id}/image"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let url = body_json(response).await["image_url"]
        .as_str()
        .unwrap()
        .to_owned();
    let filename = url.strip_prefix("/uploads/species/").unwrap();
    let stored = app.stored_file("species", filename);
    assert!(stored.exists());

    let response = app.delete(&token, &format!("/api/species/{id}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!stored.exists());
}
