use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{Orchestrator, TurnError, GREETING_TEXT};
use crate::models::{
    ChatRequest, ChatResponse, ErrorResponse, HealthResponse, HistoryResponse, SessionQuery,
    StartConversationRequest, StartConversationResponse,
};
use crate::services::{GenerationError, SessionStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub sessions: SessionStore,
}

/// Configure all conversation routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/info", web::get().to(api_info))
        .route("/conversations", web::post().to(start_conversation))
        .route("/chat", web::post().to(chat))
        .route("/chat/history", web::get().to(get_history))
        .route("/chat/history", web::delete().to(reset_history));
}

fn error_response(status: StatusCode, error: &str, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.into(),
        status_code: status.as_u16(),
    })
}

fn session_not_found(session_id: &uuid::Uuid) -> HttpResponse {
    error_response(
        StatusCode::NOT_FOUND,
        "Session not found",
        format!("No active conversation with id {}", session_id),
    )
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let listings = state.orchestrator.catalog().current().listings().len();

    // Without listings only greetings and the default prompt work
    let status = if listings > 0 { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
        listings,
        sessions: state.sessions.len(),
    })
}

/// Endpoint catalogue
async fn api_info() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "name": "UAE Property Assistant",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "GET /api/v1/health": "Service health and catalogue size",
            "GET /api/v1/info": "This endpoint catalogue",
            "POST /api/v1/conversations": "Start a conversation, optional reply language",
            "POST /api/v1/chat": "Send a message, optionally within an existing session",
            "GET /api/v1/chat/history?sessionId=": "Conversation transcript",
            "DELETE /api/v1/chat/history?sessionId=": "Reset a conversation",
        }
    }))
}

/// Start a conversation
///
/// POST /api/v1/conversations
///
/// Request body (optional):
/// ```json
/// { "language": "Arabic" }
/// ```
async fn start_conversation(
    state: web::Data<AppState>,
    req: Option<web::Json<StartConversationRequest>>,
) -> impl Responder {
    let req = req.map(web::Json::into_inner).unwrap_or_default();

    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }

    let (session_id, _) = state.sessions.create(req.language.as_deref()).await;
    tracing::info!("Started conversation {}", session_id);

    HttpResponse::Ok().json(StartConversationResponse {
        session_id,
        status: "ready".to_string(),
        greeting_text: GREETING_TEXT.to_string(),
    })
}

/// Process one user message
///
/// POST /api/v1/chat
///
/// Request body:
/// ```json
/// {
///   "message": "string",
///   "sessionId": "uuid"
/// }
/// ```
/// Without `sessionId` a new conversation is started.
async fn chat(state: web::Data<AppState>, req: web::Json<ChatRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return error_response(StatusCode::BAD_REQUEST, "Validation failed", errors.to_string());
    }

    let Some((session_id, shared)) = state.sessions.get_or_create(req.session_id).await else {
        // get_or_create only fails for a provided id
        return session_not_found(&req.session_id.unwrap_or_default());
    };

    // Held for the whole turn so turns on one conversation never interleave
    let mut conversation = shared.lock().await;

    match state.orchestrator.handle_turn(&mut conversation, &req.message).await {
        Ok(outcome) => HttpResponse::Ok().json(ChatResponse {
            session_id,
            response: outcome.reply,
            classification: outcome.classification,
            mode: outcome.mode,
            matched_listings: outcome.matched,
        }),
        Err(e @ (TurnError::EmptyMessage | TurnError::MessageTooLong(_))) => {
            error_response(StatusCode::BAD_REQUEST, "Invalid message", e.to_string())
        }
        Err(TurnError::Generation(e @ GenerationError::Timeout(_))) => {
            error_response(StatusCode::GATEWAY_TIMEOUT, "Generation timed out", e.to_string())
        }
        Err(TurnError::Generation(e)) => {
            error_response(StatusCode::BAD_GATEWAY, "Generation failed", e.to_string())
        }
    }
}

/// Get a conversation transcript
///
/// GET /api/v1/chat/history?sessionId={sessionId}
async fn get_history(state: web::Data<AppState>, query: web::Query<SessionQuery>) -> impl Responder {
    let Some(shared) = state.sessions.get(&query.session_id).await else {
        return session_not_found(&query.session_id);
    };
    let conversation = shared.lock().await;

    HttpResponse::Ok().json(HistoryResponse::from_conversation(&conversation))
}

/// Reset a conversation to a fresh system turn
///
/// DELETE /api/v1/chat/history?sessionId={sessionId}
async fn reset_history(state: web::Data<AppState>, query: web::Query<SessionQuery>) -> impl Responder {
    let Some(shared) = state.sessions.reset(&query.session_id, None).await else {
        return session_not_found(&query.session_id);
    };
    tracing::info!("Reset conversation {}", query.session_id);

    let conversation = shared.lock().await;
    HttpResponse::Ok().json(HistoryResponse::from_conversation(&conversation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_carries_status() {
        let response = error_response(StatusCode::BAD_GATEWAY, "Generation failed", "upstream down");
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
