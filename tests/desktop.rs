//! Terminal host end to end: clip replay, upload to a stub, rendered result

use std::io::Write;
use std::time::Duration;

use serde_json::json;
use voice_query::desktop::{ClipSource, TerminalHost};
use voice_query::voice::{Driver, Input, Outcome, RecordingController};
use voice_query::Config;

mod common;
use common::{spawn_stub, webm_clip};

fn http() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("http client")
}

fn config(server_url: String) -> Config {
    Config {
        server_url: Some(server_url),
        playback: false,
        fragment_bytes: 64,
        ..Config::default()
    }
}

async fn ask(host: TerminalHost, playback: bool) -> Driver<TerminalHost> {
    let supported = host.capture_supported();
    let mut driver = Driver::new(
        RecordingController::new(supported).with_playback(playback),
        host,
    );
    driver.inbox().send(Input::Toggle);

    tokio::time::timeout(
        Duration::from_secs(10),
        driver.run_until(RecordingController::is_settled),
    )
    .await
    .expect("driver settled");

    driver
}

#[tokio::test]
async fn test_clip_is_uploaded_and_answer_shown() {
    let stub = spawn_stub(json!({
        "success": true,
        "question": "How far is the moon?",
        "answer": "About 384,400 km.",
        "audio_url": "/static/answer.mp3"
    }))
    .await;
    let (clip, bytes) = webm_clip(300);

    let config = config(stub.base_url());
    let source = ClipSource::new(clip.path(), config.fragment_bytes);
    let host = TerminalHost::with_http(&config, source, http()).unwrap();

    let driver = ask(host, config.playback).await;
    let screen = driver.host().screen();

    assert_eq!(screen.status, "Ready");
    assert_eq!(screen.question.as_deref(), Some("How far is the moon?"));
    assert_eq!(screen.answer.as_deref(), Some("About 384,400 km."));
    assert!(!screen.trigger_disabled);
    assert_eq!(driver.controller().last_outcome(), Some(&Outcome::Answered));

    let received = stub.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].name, "audio");
    assert_eq!(received[0].file_name.as_deref(), Some("recording.webm"));
    assert!(received[0]
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("audio/webm")));
    assert_eq!(received[0].bytes, bytes);
}

#[tokio::test]
async fn test_server_rejection_shown_as_error() {
    let stub = spawn_stub(json!({"success": false, "error": "No speech detected"})).await;
    let (clip, _) = webm_clip(10);

    let config = config(stub.base_url());
    let source = ClipSource::new(clip.path(), config.fragment_bytes);
    let host = TerminalHost::with_http(&config, source, http()).unwrap();

    let driver = ask(host, config.playback).await;
    let screen = driver.host().screen();

    assert_eq!(screen.status, "Error: No speech detected");
    assert_eq!(screen.question, None);
    assert_eq!(screen.answer, None);
}

#[tokio::test]
async fn test_missing_clip_disables_trigger() {
    let dir = tempfile::tempdir().unwrap();
    let config = config("http://127.0.0.1:9".to_string());
    let source = ClipSource::new(dir.path().join("absent.webm"), config.fragment_bytes);
    let host = TerminalHost::with_http(&config, source, http()).unwrap();
    assert!(!host.capture_supported());

    let mut driver = Driver::new(RecordingController::new(false), host);
    driver.flush();

    let screen = driver.host().screen();
    assert!(screen.trigger_disabled);
    assert_eq!(
        screen.status,
        format!(
            "No recording found at {}",
            dir.path().join("absent.webm").display()
        )
    );
}

#[tokio::test]
async fn test_non_webm_clip_reports_unavailable_microphone() {
    let stub = spawn_stub(json!({"success": false, "error": "unused"})).await;
    let mut clip = tempfile::NamedTempFile::new().unwrap();
    clip.write_all(b"RIFF....WAVEfmt ").unwrap();
    clip.flush().unwrap();

    let config = config(stub.base_url());
    let source = ClipSource::new(clip.path(), config.fragment_bytes);
    let host = TerminalHost::with_http(&config, source, http()).unwrap();

    let driver = ask(host, config.playback).await;

    let status = &driver.host().screen().status;
    assert!(status.starts_with("Error: "), "{status}");
    assert!(status.ends_with("is not a WebM recording"), "{status}");
    assert!(stub.received().is_empty());
}

#[tokio::test]
async fn test_missing_answer_audio_keeps_answer() {
    let stub = spawn_stub(json!({
        "success": true,
        "question": "What time is it?",
        "answer": "Noon.",
        "audio_url": "/static/missing.mp3"
    }))
    .await;
    let (clip, _) = webm_clip(32);

    let config = Config {
        playback: true,
        ..config(stub.base_url())
    };
    let source = ClipSource::new(clip.path(), config.fragment_bytes);
    let host = TerminalHost::with_http(&config, source, http()).unwrap();

    let driver = ask(host, config.playback).await;
    let screen = driver.host().screen();

    // Relative URL is resolved against the server, which has no such file
    assert_eq!(
        screen.status,
        format!(
            "Error: {}/static/missing.mp3 returned 404 Not Found",
            stub.base_url()
        )
    );
    assert_eq!(screen.question.as_deref(), Some("What time is it?"));
    assert_eq!(screen.answer.as_deref(), Some("Noon."));
    assert!(driver.controller().is_settled());
    assert_eq!(driver.controller().last_outcome(), Some(&Outcome::Answered));
}
