//! HTTP transport.
//!
//! API endpoints:
//! - POST /register - {image, name, email, userId} enrollment
//! - POST /login    - {image} verification
//! - GET  /health   - liveness check

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use faceid_service::{EnrollImageRequest, EnrollOutcome, FaceService, ValidationError};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::response::{enroll_response, validation_body, verify_response};

/// Upper bound on a request body; images arrive base64 encoded.
const BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Fields are optional so that `null` and absent values both count as
/// missing rather than failing deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RegisterBody {
    image: Option<String>,
    name: Option<String>,
    email: Option<String>,
    #[serde(rename = "userId")]
    user_id: Option<String>,
}

impl RegisterBody {
    /// Blank text fields, in request order. The image is checked separately.
    fn blank_fields(&self) -> Vec<&'static str> {
        [
            ("name", self.name.as_deref()),
            ("email", self.email.as_deref()),
            ("userId", self.user_id.as_deref()),
        ]
        .into_iter()
        .filter(|(_, value)| is_blank(*value))
        .map(|(field, _)| field)
        .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoginBody {
    image: Option<String>,
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

#[derive(Clone)]
struct AppState {
    service: Arc<FaceService>,
}

pub fn router(service: Arc<FaceService>, cors_origin: Option<&str>) -> Result<Router> {
    let cors = match cors_origin {
        Some(origin) => CorsLayer::new().allow_origin(
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("invalid cors_origin {origin:?}"))?,
        ),
        None => CorsLayer::new().allow_origin(Any),
    }
    .allow_methods(Any)
    .allow_headers(Any);

    Ok(Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(cors)
        .with_state(AppState { service }))
}

/// Start the HTTP server and run until the process exits.
pub async fn serve(addr: &str, service: Arc<FaceService>, cors_origin: Option<&str>) -> Result<()> {
    let app = router(service, cors_origin)?;
    let addr = parse_addr(addr)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");
    println!("Server started at http://{}", addr);
    println!("  - POST /register  Enroll a face");
    println!("  - POST /login     Verify a face");
    println!("  - GET  /health    Liveness");
    println!();

    axum::serve(listener, app).await?;
    Ok(())
}

async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return reject(rejection),
    };

    let image = match body.image.as_deref() {
        Some(image) if !image.trim().is_empty() => match decode_image(image) {
            Ok(image) => image,
            Err(err) => {
                let blank = body.blank_fields();
                let err = if blank.is_empty() {
                    ValidationError::InvalidImage(err)
                } else {
                    ValidationError::MissingFields(blank)
                };
                let outcome = EnrollOutcome::ValidationError(err);
                let (status, body) = enroll_response(&outcome);
                return (status, Json(body)).into_response();
            }
        },
        _ => Vec::new(),
    };

    let outcome = state
        .service
        .enroll(EnrollImageRequest {
            image,
            name: body.name.unwrap_or_default(),
            email: body.email.unwrap_or_default(),
            external_user_id: body.user_id.unwrap_or_default(),
        })
        .await;
    let (status, body) = enroll_response(&outcome);
    (status, Json(body)).into_response()
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return reject(rejection),
    };

    let image = match body.image.as_deref() {
        Some(image) if !image.trim().is_empty() => image,
        _ => {
            let body = validation_body(ValidationError::MissingFields(vec!["image"]).to_string());
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };
    let image = match decode_image(image) {
        Ok(image) => image,
        Err(err) => {
            let body = validation_body(ValidationError::InvalidImage(err).to_string());
            return (StatusCode::BAD_REQUEST, Json(body)).into_response();
        }
    };

    let outcome = state.service.verify(&image).await;
    let (status, body) = verify_response(&outcome);
    (status, Json(body)).into_response()
}

/// Renders a body that could not be read as JSON in the response vocabulary.
/// Oversized bodies keep 413; everything else is 400.
fn reject(rejection: JsonRejection) -> Response {
    debug!(status = %rejection.status(), error = %rejection.body_text(), "request body rejected");
    let (status, message) = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("request body exceeds {} MiB", BODY_LIMIT / (1024 * 1024)),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            format!("invalid request body: {}", rejection.body_text()),
        )
    };
    (status, Json(validation_body(message))).into_response()
}

async fn health() -> &'static str {
    "ok"
}

/// Decodes a base64 image, optionally wrapped in a `data:` URL.
fn decode_image(input: &str) -> Result<Vec<u8>, String> {
    let input = input.trim();
    let payload = match input.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .ok_or_else(|| "data URL without payload".to_string())?;
            if !header.ends_with(";base64") {
                return Err("data URL is not base64 encoded".to_string());
            }
            data
        }
        None => input,
    };
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|err| format!("bad base64: {err}"))?;
    if bytes.is_empty() {
        return Err("empty image".to_string());
    }
    Ok(bytes)
}

/// Parse address string to SocketAddr.
fn parse_addr(addr: &str) -> Result<SocketAddr> {
    let addr = if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    };
    addr.parse()
        .with_context(|| format!("invalid listen address {addr:?}"))
}
