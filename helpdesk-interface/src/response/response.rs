use std::convert::Infallible;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use futures::stream;
use serde::Serialize;
use serde_json::json;
use tracing::{error, warn};
use helpdesk_common::error::error::Error;

pub const DONE: &str = "[DONE]";

#[derive(Clone, Debug, Serialize)]
pub struct Delta {
    pub content: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChunkChoice {
    pub delta: Delta,
}

/// One chat-completions stream chunk carrying the whole reply.
#[derive(Clone, Debug, Serialize)]
pub struct CompletionChunk {
    pub id: String,
    pub choices: Vec<ChunkChoice>,
}

impl CompletionChunk {
    pub fn new(id: &str, content: &str) -> Self {
        Self {
            id: id.to_string(),
            choices: vec![ChunkChoice { delta: Delta { content: content.to_string() } }],
        }
    }
}

pub fn completion_id() -> String {
    format!("chatcmpl-{}", Utc::now().timestamp())
}

/// Reply as a single SSE data event followed by the `[DONE]` marker.
pub fn sse_reply(id: &str, content: &str) -> Response {
    let mut events: Vec<Result<Event, Infallible>> = Vec::with_capacity(2);
    match Event::default().json_data(CompletionChunk::new(id, content)) {
        Ok(event) => events.push(Ok(event)),
        Err(e) => error!("Could not encode completion chunk: {}", e),
    }
    events.push(Ok(Event::default().data(DONE)));

    ([("x-accel-buffering", "no")], Sse::new(stream::iter(events))).into_response()
}

/// Message object understood by the Teams connector.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TeamsReply {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl TeamsReply {
    pub fn message(text: &str) -> Self {
        Self { text: text.to_string(), kind: String::from("message") }
    }
}

impl IntoResponse for TeamsReply {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub framework: String,
    pub version: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: String::from("healthy"),
            service: String::from("Helpdesk Agent Orchestrator"),
            framework: String::from("axum"),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, client_error) = self.0.client_status_and_error();
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        warn!("Request failed with {}: {}", status, self.0);

        let body = json!({
            "error": {
                "code": client_error.as_ref(),
                "type": self.0.as_ref(),
            }
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use serde_json::Value;
    use super::*;

    async fn body_text(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn data_lines(body: &str) -> Vec<String> {
        body.lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|data| data.trim().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_sse_framing() {
        let response = sse_reply("chatcmpl-1700000000", "Restart the printer.");
        assert_eq!(response.headers()["content-type"], "text/event-stream");
        assert_eq!(response.headers()["x-accel-buffering"], "no");

        let lines = data_lines(&body_text(response).await);
        assert_eq!(lines.len(), 2);
        let chunk: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(chunk["id"], "chatcmpl-1700000000");
        assert_eq!(chunk["choices"][0]["delta"]["content"], "Restart the printer.");
        assert_eq!(lines[1], DONE);
    }

    #[test]
    fn test_completion_id_and_teams_reply() {
        assert!(completion_id().starts_with("chatcmpl-"));
        let value = serde_json::to_value(TeamsReply::message("hi")).unwrap();
        assert_eq!(value, json!({"text": "hi", "type": "message"}));
    }

    #[tokio::test]
    async fn test_api_error_hides_details() {
        let response = ApiError(Error::SessionNotFound { session_id: String::from("s-9") }).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body: Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"]["code"], "NOT_FOUND");
        assert!(!body.to_string().contains("s-9"));
    }
}
