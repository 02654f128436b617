//! Shared harness for the end-to-end HTTP tests.
//!
//! Wires the real router over `MemoryStore`, argon2 (cheap parameters), JWT
//! and local media in a scratch directory, then drives it with
//! `tower::ServiceExt::oneshot`.
#![cfg(feature = "web-axum")]

use std::path::PathBuf;
use std::sync::Arc;

use api_adapters::{router, ApiConfig, AppState};
use auth_adapters::{Argon2Hasher, JwtTokenIssuer};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use services::{CredentialService, ProductCatalog, ReviewLedger};
use storage_adapters::{LocalMediaStorage, MemoryStore};
use tower::ServiceExt;
use uuid::Uuid;

/// Smallest PNG header `image::guess_format` recognizes.
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01\x08\x06\0\0\0";

const BOUNDARY: &str = "catalog-test-boundary";

pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub raw: Vec<u8>,
}

/// One part of a multipart form.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
}

pub struct TestApp {
    router: Router,
    pub store: Arc<MemoryStore>,
    pub upload_dir: PathBuf,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    pub fn new() -> Self {
        let upload_dir = std::env::temp_dir().join(format!("catalog-it-{}", Uuid::new_v4()));
        let store = Arc::new(MemoryStore::new());
        let media = Arc::new(LocalMediaStorage::new(upload_dir.clone(), "/uploads"));
        let hasher = Arc::new(Argon2Hasher::with_cost(1024, 1).expect("argon2 params"));
        let tokens = Arc::new(JwtTokenIssuer::new(b"integration-secret", chrono::Duration::hours(1)));

        let state = AppState {
            credentials: Arc::new(CredentialService::new(store.clone(), hasher, tokens)),
            catalog: Arc::new(ProductCatalog::new(store.clone(), store.clone(), media)),
            reviews: Arc::new(ReviewLedger::new(store.clone(), store.clone())),
        };
        let config = ApiConfig {
            allowed_origin: "http://localhost:5173".into(),
            body_limit_bytes: 1024 * 1024,
            upload_dir: upload_dir.clone(),
            url_prefix: "/uploads".into(),
        };

        Self {
            router: router(state, &config),
            store,
            upload_dir,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let raw = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body")
            .to_vec();
        let body = serde_json::from_slice(&raw).unwrap_or(Value::Null);
        TestResponse { status, body, raw }
    }

    fn builder(method: Method, path: &str, token: Option<&str>) -> axum::http::request::Builder {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(Self::builder(Method::GET, path, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(Self::builder(Method::DELETE, path, token).body(Body::empty()).unwrap())
            .await
    }

    pub async fn json(&self, method: Method, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        let request = Self::builder(method, path, token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn form(&self, method: Method, path: &str, token: Option<&str>, parts: &[Part<'_>]) -> TestResponse {
        let request = Self::builder(method, path, token)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();
        self.send(request).await
    }

    /// Registers an account and returns `(token, user id)`.
    pub async fn register(&self, email: &str, password: &str) -> (String, String) {
        let res = self
            .json(
                Method::POST,
                "/api/auth/register",
                None,
                json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "register failed: {}", res.body);
        (
            res.body["token"].as_str().unwrap().to_owned(),
            res.body["user"]["id"].as_str().unwrap().to_owned(),
        )
    }

    /// Creates a product without an image and returns its JSON.
    pub async fn create_product(&self, token: &str, name: &str) -> Value {
        let res = self
            .form(Method::POST, "/api/products", Some(token), &[Part::Text("name", name)])
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "create failed: {}", res.body);
        res.body
    }

    pub async fn add_review(&self, token: &str, product_id: &str, body: Value) -> TestResponse {
        self.json(
            Method::POST,
            &format!("/api/products/{product_id}/reviews"),
            Some(token),
            body,
        )
        .await
    }

    pub async fn products(&self) -> Vec<Value> {
        let res = self.get("/api/products", None).await;
        assert_eq!(res.status, StatusCode::OK);
        res.body.as_array().cloned().unwrap_or_default()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File {
                name,
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
