//! HTTP-level tests through the full router.

use std::io::Write;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::{json, Value};
use tower::util::ServiceExt;

use lovebot_core::{
    AdvisoryOrchestrator, ContextStore, GenerationOptions, Lexicon, Llm, LlmResponse,
    LovebotConfig, LovebotError, LovebotResult, Message, SqliteContextPersistence,
};
use lovebot_server::{create_server, AppState};

struct EchoLlm {
    fail: bool,
}

#[async_trait]
impl Llm for EchoLlm {
    async fn generate(
        &self,
        _messages: &[Message],
        _options: Option<GenerationOptions>,
    ) -> LovebotResult<LlmResponse> {
        if self.fail {
            return Err(LovebotError::llm("provider down"));
        }
        Ok(LlmResponse::text("It sounds like you both care a lot."))
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

fn app_with(fail: bool) -> Router {
    let config = LovebotConfig::default();
    let store = Arc::new(ContextStore::new(
        Arc::new(SqliteContextPersistence::in_memory().unwrap()),
        &config,
    ));
    let orchestrator = AdvisoryOrchestrator::new(
        config,
        Arc::new(Lexicon::builtin().unwrap()),
        store,
        Arc::new(EchoLlm { fail }),
    );
    create_server(AppState::new(Arc::new(orchestrator)))
}

fn app() -> Router {
    app_with(false)
}

async fn decode_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn message(conversation_id: &str, text: &str) -> Value {
    json!({
        "conversation_id": conversation_id,
        "sender_id": "ana@c.us",
        "sender_display_name": "Ana",
        "text": text,
        "timestamp": "2024-05-01T20:00:00Z",
        "is_private": !conversation_id.ends_with("@g.us"),
    })
}

#[tokio::test]
async fn test_health() {
    let response = app().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = decode_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model"], "echo");
    assert_eq!(body["conversations"], 0);
}

#[tokio::test]
async fn test_post_message_intervenes_on_partner_trouble() {
    let app = app();
    let response = app
        .clone()
        .oneshot(post_json(
            "/messages",
            message(
                "120363@g.us",
                "I feel like my partner doesn't understand me. We've been arguing a lot lately.",
            ),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = decode_json(response).await;
    assert_eq!(body["decision"]["should_intervene"], true);
    assert_eq!(body["decision"]["kind"], "RESPOND_IN_CONVERSATION");
    assert_eq!(body["outbound"][0]["recipient"], "120363@g.us");
    assert_eq!(
        body["outbound"][0]["text"],
        "It sounds like you both care a lot."
    );

    // Message and reply are both remembered.
    let response = app.oneshot(get("/conversations/120363@g.us")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = decode_json(response).await;
    assert_eq!(body["messages"].as_array().unwrap().len(), 2);
    assert_eq!(body["messages"][1]["isFromBot"], true);
}

#[tokio::test]
async fn test_post_message_stays_quiet_on_small_talk() {
    let response = app()
        .oneshot(post_json(
            "/messages",
            message("120363@g.us", "What's the weather like today?"),
        ))
        .await
        .unwrap();
    let body = decode_json(response).await;
    assert_eq!(body["decision"]["should_intervene"], false);
    assert_eq!(body["decision"]["kind"], "NONE");
    assert!(body["outbound"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_provider_failure_sends_fallback() {
    let response = app_with(true)
        .oneshot(post_json("/messages", message("ana@c.us", "hello there")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = decode_json(response).await;
    assert_eq!(
        body["outbound"][0]["text"],
        LovebotConfig::default().fallback_response
    );
}

#[tokio::test]
async fn test_unknown_conversation_is_404() {
    let response = app().oneshot(get("/conversations/nobody@g.us")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = decode_json(response).await;
    assert_eq!(body["error"]["code"], "CONV_001");
}

#[tokio::test]
async fn test_render_without_history() {
    let response = app()
        .oneshot(get("/conversations/nobody@g.us/render"))
        .await
        .unwrap();
    let body = decode_json(response).await;
    assert_eq!(body["rendered"], "No conversation history available.");
}

const TRANSCRIPT: &str = "[13/01/2024, 10:00:00] Ana: we need to talk\n\
[13/01/2024, 10:01:00] Ben: about what?\n\
[13/01/2024, 10:02:00] Ana: <Media omitted>\n\
[13/01/2024, 10:03:00] Ana: about the holidays";

#[tokio::test]
async fn test_import_transcript() {
    let app = app();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/conversations/120363@g.us/import")
                .header("content-type", "text/plain")
                .body(Body::from(TRANSCRIPT))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = decode_json(response).await;
    assert_eq!(body["parsed"], 4);
    assert_eq!(body["media_skipped"], 1);
    assert_eq!(body["imported"], 3);

    let response = app.oneshot(get("/conversations/120363@g.us")).await.unwrap();
    let body = decode_json(response).await;
    let history = body["importedChatHistory"].as_str().unwrap();
    assert_eq!(history.lines().count(), 3);
}

#[tokio::test]
async fn test_import_rejects_non_transcript() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/conversations/120363@g.us/import")
                .body(Body::from("just some notes\nnothing else"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_import_archive() {
    let mut buffer = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buffer);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("WhatsApp Chat with Ana.txt", options).unwrap();
        writer.write_all(TRANSCRIPT.as_bytes()).unwrap();
        writer.finish().unwrap();
    }

    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/conversations/120363@g.us/import-archive")
                .header("content-type", "application/zip")
                .body(Body::from(buffer.into_inner()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = decode_json(response).await;
    assert_eq!(body["imported"], 3);
    assert_eq!(body["entries"][0]["recognized"], true);
}

#[tokio::test]
async fn test_import_archive_rejects_garbage() {
    let response = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/conversations/120363@g.us/import-archive")
                .body(Body::from("not a zip"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
