//! HTTP request handlers

use super::assets::{get_index_html, serve_static};
use super::types::{
    ChatRequest, ChatResponse, ErrorResponse, NewSessionResponse, SuccessResponse,
    TranscriptResponse,
};
use super::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Root serves the chat page
        .route("/", get(serve_chat_page))
        // Static assets (embedded or filesystem fallback)
        .route("/assets/*path", get(serve_static))
        // Session lifecycle
        .route("/api/sessions/new", post(new_session))
        .route("/api/sessions/:id", get(get_transcript))
        .route("/api/sessions/:id/chat", post(send_chat))
        .route("/api/sessions/:id/reset", post(reset_session))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Chat Page
// ============================================================

async fn serve_chat_page() -> impl IntoResponse {
    match get_index_html() {
        Some(content) => Html(content).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Html("<h1>404 - chat page not found in ui/dist</h1>".to_string()),
        )
            .into_response(),
    }
}

// ============================================================
// Session Lifecycle
// ============================================================

async fn new_session(State(state): State<AppState>) -> Json<NewSessionResponse> {
    let id = state.store.create().await;
    Json(NewSessionResponse {
        session_id: id.to_string(),
    })
}

async fn get_transcript(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TranscriptResponse>, AppError> {
    let id = parse_session_id(&id)?;
    let messages = state
        .store
        .messages(id)
        .await
        .ok_or_else(|| AppError::NotFound("Unknown session".to_string()))?;

    Ok(Json(TranscriptResponse { messages }))
}

async fn send_chat(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let id = parse_session_id(&id)?;

    let text = req.text.trim();
    if text.is_empty() {
        return Err(AppError::BadRequest("Message text is empty".to_string()));
    }

    let (reply, messages) = state
        .store
        .apply_turn(id, state.gateway.as_ref(), text)
        .await
        .ok_or_else(|| AppError::NotFound("Unknown session".to_string()))?;

    Ok(Json(ChatResponse { reply, messages }))
}

async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    let id = parse_session_id(&id)?;
    if !state.store.reset(id).await {
        return Err(AppError::NotFound("Unknown session".to_string()));
    }
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("finbot ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

fn parse_session_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid session id".to_string()))
}

enum AppError {
    BadRequest(String),
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionOutcome, CompletionService, LlmError, ProviderTurn};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    /// Gateway that replies with a canned acknowledgement of the question
    struct EchoGateway;

    #[async_trait]
    impl CompletionService for EchoGateway {
        async fn complete(
            &self,
            user_message: &str,
            prior_turns: &[ProviderTurn],
        ) -> Result<CompletionOutcome, LlmError> {
            let reply = format!("You asked: {user_message}");
            let mut updated_turns = prior_turns.to_vec();
            updated_turns.push(ProviderTurn::user(user_message));
            updated_turns.push(ProviderTurn::model(reply.clone()));
            Ok(CompletionOutcome {
                reply,
                updated_turns,
            })
        }

        fn model_id(&self) -> &str {
            "echo"
        }
    }

    fn test_router() -> Router {
        create_router(AppState::new(Arc::new(EchoGateway)))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn create_session_then_chat() {
        let app = test_router();

        let response = app
            .clone()
            .oneshot(
                Request::post("/api/sessions/new")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let session = body_json(response).await;
        let id = session["session_id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(
                Request::post(format!("/api/sessions/{id}/chat"))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"text":"What is a stock?"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["reply"], "You asked: What is a stock?");
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][1]["role"], "assistant");
    }

    #[tokio::test]
    async fn chat_with_unknown_session_is_404() {
        let app = test_router();
        let response = app
            .oneshot(
                Request::post(format!("/api/sessions/{}/chat", Uuid::new_v4()))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"text":"hello"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_message_is_rejected() {
        let app = test_router();

        let response = app
            .clone()
            .oneshot(
                Request::post("/api/sessions/new")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let id = body_json(response).await["session_id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = app
            .oneshot(
                Request::post(format!("/api/sessions/{id}/chat"))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"text":"   "}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_session_id_is_400() {
        let app = test_router();
        let response = app
            .oneshot(
                Request::get("/api/sessions/not-a-uuid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn version_reports_package() {
        let app = test_router();
        let response = app
            .oneshot(Request::get("/version").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&bytes).starts_with("finbot "));
    }
}
