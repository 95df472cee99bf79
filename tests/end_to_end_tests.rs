// End-to-end tests: relay server on a local port, client decoding and playing the reply

mod common;

use anyhow::Result;
use common::{wav_bytes, RecordingOutput, ScriptedChat, ScriptedSpeech};
use std::sync::Arc;
use voice_relay::{
    create_router, AppState, GenerateRequest, PlaybackConfig, PlaybackScheduler, RelayError,
    SpeechSynthesisOrchestrator, VoiceClient,
};

async fn spawn_server(chat: Arc<ScriptedChat>, speech: Arc<ScriptedSpeech>) -> Result<String> {
    let orchestrator = Arc::new(SpeechSynthesisOrchestrator::new(speech, "default-voice"));
    let state = AppState::new(chat, orchestrator).with_response_chunk_bytes(32);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.ok();
    });

    Ok(format!("http://{}", addr))
}

#[tokio::test]
async fn test_client_plays_reply_and_returns_timings() -> Result<()> {
    let audio = wav_bytes(&[0, 8000, -8000, 16000, 0, 0], 1, 22_050);
    let url = spawn_server(
        ScriptedChat::new(&["Hello there friend"]),
        ScriptedSpeech::new(audio),
    )
    .await?;

    let output = Arc::new(RecordingOutput::default());
    let playback = Arc::new(PlaybackScheduler::new(
        output.clone(),
        PlaybackConfig { output_channels: 2 },
    ));
    let client = VoiceClient::new(format!("{}/", url), playback);

    let mut request = GenerateRequest::new("hi");
    request.session_id = Some("e2e".to_string());
    let reply = client.generate(&request).await?;

    assert_eq!(reply.text_response, "Hello there friend");
    assert_eq!(reply.timings.words, vec!["Hello", "there", "friend"]);
    reply
        .timings
        .validate()
        .map_err(|e| anyhow::anyhow!(e))?;

    // generate returns after playback of the reply has finished
    let played = output.played();
    assert_eq!(played.len(), 1, "One envelope means one audio chunk");
    assert_eq!(played[0].channels, 2, "Mono reply should be upmixed");
    assert_eq!(played[0].sample_rate, 22_050);
    assert_eq!(played[0].frames(), 6);

    Ok(())
}

#[tokio::test]
async fn test_server_error_surfaces_as_transport_error() -> Result<()> {
    let url = spawn_server(ScriptedChat::new(&["reply"]), ScriptedSpeech::failing()).await?;

    let output = Arc::new(RecordingOutput::default());
    let playback = Arc::new(PlaybackScheduler::new(output.clone(), PlaybackConfig::default()));
    let client = VoiceClient::new(url, playback);

    let result = client.generate(&GenerateRequest::new("hi")).await;

    assert!(
        matches!(result, Err(RelayError::Transport(_))),
        "Expected a transport error for a 500 response, got {:?}",
        result.map(|r| r.text_response)
    );
    assert!(output.played().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_undecodable_audio_still_returns_reply() -> Result<()> {
    let url = spawn_server(
        ScriptedChat::new(&["hi you"]),
        ScriptedSpeech::new(b"not audio at all".to_vec()),
    )
    .await?;

    let output = Arc::new(RecordingOutput::default());
    let playback = Arc::new(PlaybackScheduler::new(output.clone(), PlaybackConfig::default()));
    let client = VoiceClient::new(url, playback);

    let reply = client.generate(&GenerateRequest::new("hello")).await?;

    assert_eq!(reply.text_response, "hi you");
    assert_eq!(reply.timings.words, vec!["hi", "you"]);
    assert!(output.played().is_empty(), "Bad audio must not reach the device");

    Ok(())
}
