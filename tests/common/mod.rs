//! Shared test utilities
#![allow(dead_code)]

use std::io::Write;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use voice_query::{Answer, VoiceQueryResult};

/// One multipart field received by the stub server
#[derive(Debug, Clone)]
pub struct ReceivedField {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Stub `/process_voice` that records uploads and answers with a fixed body
#[derive(Clone)]
pub struct StubServer {
    pub addr: SocketAddr,
    received: Arc<Mutex<Vec<ReceivedField>>>,
}

impl StubServer {
    /// Fields received so far
    pub fn received(&self) -> Vec<ReceivedField> {
        self.received.lock().expect("stub state poisoned").clone()
    }

    /// Base URL of the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Full endpoint URL
    pub fn endpoint(&self) -> url::Url {
        url::Url::parse(&format!("{}/process_voice", self.base_url())).expect("valid url")
    }
}

#[derive(Clone)]
struct StubState {
    reply: serde_json::Value,
    received: Arc<Mutex<Vec<ReceivedField>>>,
}

async fn process_voice(
    State(state): State<StubState>,
    mut multipart: Multipart,
) -> Json<serde_json::Value> {
    while let Some(field) = multipart.next_field().await.expect("multipart field") {
        let received = ReceivedField {
            name: field.name().unwrap_or_default().to_string(),
            file_name: field.file_name().map(str::to_string),
            content_type: field.content_type().map(str::to_string),
            bytes: field.bytes().await.expect("field bytes").to_vec(),
        };
        state.received.lock().expect("stub state poisoned").push(received);
    }

    Json(state.reply.clone())
}

/// Start a stub answering every upload with `reply`
pub async fn spawn_stub(reply: serde_json::Value) -> StubServer {
    let received = Arc::new(Mutex::new(Vec::new()));
    let state = StubState {
        reply,
        received: Arc::clone(&received),
    };

    let router = Router::new()
        .route("/process_voice", post(process_voice))
        .with_state(state);

    StubServer {
        addr: serve(router).await,
        received,
    }
}

/// Serve `router` on an ephemeral local port
pub async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });

    addr
}

/// Successful server answer
pub fn answered(question: &str, answer: &str, audio_url: &str) -> VoiceQueryResult {
    VoiceQueryResult::Answered(Answer {
        question: question.to_string(),
        answer: answer.to_string(),
        audio_url: audio_url.to_string(),
    })
}

/// Write a minimal WebM-looking clip to a temp file
pub fn webm_clip(payload_len: usize) -> (tempfile::NamedTempFile, Vec<u8>) {
    let mut bytes = vec![0x1A, 0x45, 0xDF, 0xA3];
    bytes.extend((0..payload_len).map(|i| (i % 251) as u8));

    let mut file = tempfile::NamedTempFile::new().expect("temp clip");
    file.write_all(&bytes).expect("write clip");
    file.flush().expect("flush clip");

    (file, bytes)
}
