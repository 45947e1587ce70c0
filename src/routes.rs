use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::{ChatResponse, FollowUp, SharedContext};

const INDEX_HTML: &str = include_str!("../templates/index.html");

pub fn router(ctx: SharedContext, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/chat", post(chat))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("malformed form data: {0}")]
    Multipart(#[from] MultipartError),

    #[error("request had neither a message nor an image")]
    EmptyRequest,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(error = %self, "rejected chat request");
        let (status, text) = match &self {
            ApiError::Multipart(e) => (
                e.status(),
                "I couldn't read that request. Please try sending it again.",
            ),
            ApiError::EmptyRequest => (
                StatusCode::BAD_REQUEST,
                "Please type a message or attach a photo of a plant leaf.",
            ),
        };
        (status, Json(ChatResponse::text(text))).into_response()
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Default)]
struct ChatForm {
    message: String,
    image: Option<Bytes>,
    context_disease: Option<String>,
    context_confidence: Option<f32>,
    district: Option<String>,
}

impl ChatForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = ChatForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "image" => {
                    let bytes = field.bytes().await?;
                    if !bytes.is_empty() {
                        form.image = Some(bytes);
                    }
                }
                "message" => form.message = field.text().await?,
                "context_disease" => form.context_disease = non_blank(field.text().await?),
                "district" => form.district = non_blank(field.text().await?),
                "context_confidence" => {
                    form.context_confidence = field
                        .text()
                        .await?
                        .trim()
                        .parse::<f32>()
                        .ok()
                        .filter(|c| (0.0..=1.0).contains(c));
                }
                _ => {}
            }
        }

        Ok(form)
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

async fn chat(
    State(ctx): State<SharedContext>,
    multipart: Multipart,
) -> Result<Json<ChatResponse>, ApiError> {
    let form = ChatForm::read(multipart).await?;

    if let Some(image) = form.image {
        return Ok(Json(ctx.analyze(image).await));
    }

    if form.message.trim().is_empty() {
        return Err(ApiError::EmptyRequest);
    }

    let turn = FollowUp {
        message: form.message,
        context_disease: form.context_disease,
        context_confidence: form.context_confidence,
        district: form.district,
    };
    Ok(Json(ctx.follow_up(turn).await))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    llm_configured: bool,
    version: &'static str,
}

async fn health_check(State(ctx): State<SharedContext>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        model_loaded: ctx.model_loaded(),
        llm_configured: ctx.llm_configured(),
        version: env!("CARGO_PKG_VERSION"),
    })
}
