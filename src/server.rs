use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::info;

use crate::{
    constants::Dataset,
    nlp::chinese::{g2p::G2p, prosody_label::parse_label},
    preprocess::label_format,
};

#[derive(Clone)]
pub struct AppState {
    g2p: Arc<G2p>,
    level: u8,
    use_prosody: bool,
}

impl AppState {
    pub fn new(g2p: G2p, level: u8, use_prosody: bool) -> Self {
        Self {
            g2p: Arc::new(g2p),
            level,
            use_prosody,
        }
    }
}

#[derive(Debug, Deserialize)]
struct G2pRequest {
    text: String,
    #[serde(default)]
    level: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct G2pResponse {
    phonemes: String,
}

#[derive(Debug, Deserialize)]
struct LabelRequest {
    format: Dataset,
    text: String,
    pinyin: String,
    #[serde(default)]
    use_prosody: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LabelResponse {
    sentence_id: String,
    phonemes: String,
}

#[derive(Serialize)]
struct ApiErrorBody {
    message: String,
}

type ApiResult<T> = std::result::Result<T, ApiError>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/v1/g2p", post(convert))
        .route("/v1/labels", post(labels))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {addr}"))?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service())
        .await
        .context("HTTP server terminated unexpectedly")
}

async fn health() -> &'static str {
    "ok"
}

async fn convert(
    State(state): State<AppState>,
    Json(payload): Json<G2pRequest>,
) -> ApiResult<Json<G2pResponse>> {
    let level = payload.level.unwrap_or(state.level);
    let g2p = state.g2p.clone();
    let phonemes = tokio::task::spawn_blocking(move || g2p.convert(&payload.text, level))
        .await
        .map_err(|err| ApiError::internal(format!("g2p task panicked: {err}")))?;
    Ok(Json(G2pResponse { phonemes }))
}

async fn labels(
    State(state): State<AppState>,
    Json(payload): Json<LabelRequest>,
) -> ApiResult<Json<LabelResponse>> {
    let use_prosody = payload.use_prosody.unwrap_or(state.use_prosody);
    let parsed = parse_label(
        label_format(payload.format),
        &payload.text,
        &payload.pinyin,
        use_prosody,
    )
    .map_err(|err| ApiError::unprocessable(err.to_string()))?;
    Ok(Json(LabelResponse {
        sentence_id: parsed.sentence_id,
        phonemes: parsed.phonemes,
    }))
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn unprocessable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(ApiErrorBody {
            message: self.message,
        });
        (self.status, body).into_response()
    }
}
