use std::sync::Arc;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use helpdesk_common::error::error::Error;
use helpdesk_orchestrator::chains::workflow::Plan;
use helpdesk_orchestrator::memory::session_memory::SessionExport;
use helpdesk_orchestrator::orchestrator::orchestrator::{Orchestrator, Recommendation};
use helpdesk_orchestrator::session::session::Channel;
use crate::request::request::{ends_call, TeamsRequest, TelephonyRequest};
use crate::response::response::{completion_id, sse_reply, ApiError, HealthResponse, TeamsReply};

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/telephony/chat/completions", post(telephony_chat))
        .route("/teams/chat/completions", post(teams_chat))
        .route("/webhook", post(telephony_chat))
        .route("/webhook/chat/completions", post(webhook_chat))
        .route("/health", get(health))
        .route("/sessions/:id", delete(end_session))
        .route("/sessions/:id/export", get(export_session))
        .route("/sessions/:id/plan", get(plan_session))
        .route("/sessions/:id/recommendations", get(recommend_actions))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(host: &str, port: u16, state: AppState) -> std::io::Result<()> {
    let listener = TcpListener::bind((host, port)).await?;
    info!("Helpdesk listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}

async fn health() -> (StatusCode, Json<HealthResponse>) {
    (StatusCode::OK, Json(HealthResponse::healthy()))
}

async fn telephony_chat(State(state): State<AppState>, Json(request): Json<TelephonyRequest>) -> Response {
    handle_telephony(&state, request).await
}

async fn teams_chat(State(state): State<AppState>, Json(request): Json<TeamsRequest>) -> Response {
    handle_teams(&state, request).await
}

/// Legacy endpoint that carries both channels and tells them apart by `channel`.
async fn webhook_chat(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    if body.get("channel").and_then(Value::as_str) == Some("teams") {
        let request = serde_json::from_value(body).unwrap_or_else(|e| {
            warn!("Malformed Teams payload, treating as empty: {}", e);
            TeamsRequest::default()
        });
        handle_teams(&state, request).await
    } else {
        let request = serde_json::from_value(body).unwrap_or_else(|e| {
            warn!("Malformed telephony payload, treating as empty: {}", e);
            TelephonyRequest::default()
        });
        handle_telephony(&state, request).await
    }
}

async fn handle_telephony(state: &AppState, request: TelephonyRequest) -> Response {
    let session_id = request.session_id();
    let sessions = state.orchestrator.sessions();

    if let Some(call) = request.call.clone().filter(|call| !call.is_empty()) {
        let session = sessions.get_or_create(&session_id).await;
        session.lock().await.update_call_data(call);
    }

    let incoming = request.incoming(&session_id);
    let hang_up = ends_call(&incoming.message);
    info!("Telephony turn for session {} ({} chars)", session_id, incoming.message.len());
    let reply = state.orchestrator.process_message(incoming).await;

    if hang_up {
        if let Some(session) = sessions.get(&session_id).await {
            session.lock().await.update_channel_status(Channel::Telephony, false);
            info!("Caller ended telephony session {}", session_id);
        }
    }
    sse_reply(&completion_id(), &reply)
}

async fn handle_teams(state: &AppState, request: TeamsRequest) -> Response {
    let session_id = request.session_id();
    let incoming = request.incoming(&session_id);
    info!("Teams turn for session {} ({} chars)", session_id, incoming.message.len());
    let reply = state.orchestrator.process_message(incoming).await;

    if request.is_teams_channel() {
        TeamsReply::message(&reply).into_response()
    } else {
        sse_reply(&session_id, &reply)
    }
}

async fn export_session(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<SessionExport>, ApiError> {
    Ok(Json(state.orchestrator.export_conversation(&id).await?))
}

async fn plan_session(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Plan>, ApiError> {
    Ok(Json(state.orchestrator.plan_next_step(&id).await?))
}

async fn recommend_actions(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Recommendation>, ApiError> {
    Ok(Json(state.orchestrator.recommend_actions(&id).await?))
}

async fn end_session(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode, ApiError> {
    if state.orchestrator.end_session(&id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError(Error::SessionNotFound { session_id: id }))
    }
}
