use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use voice_relay::{
    create_router, AppState, AudioOutput, Config, ElevenLabsClient, GenerateRequest, OpenAiChat,
    PlaybackConfig, PlaybackScheduler, ReplyTimings, SpeechSynthesisOrchestrator, VoiceClient,
    WavFileOutput,
};

#[derive(Parser)]
#[command(name = "voice-relay")]
#[command(about = "Talking-dog voice agent: chat reply, synthesized speech and word timings")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, global = true, default_value = "config/voice-relay")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP relay server
    Serve,

    /// Send one message and play the spoken reply
    Ask {
        text: String,

        #[command(flatten)]
        voice: VoiceArgs,
    },

    /// Interactive conversation that keeps history across turns
    Chat {
        #[command(flatten)]
        voice: VoiceArgs,
    },
}

#[derive(Args, Clone)]
struct VoiceArgs {
    /// 0: none, 1: mild, 2: moderate, 3: high
    #[arg(long, default_value = "3")]
    profanity_level: i32,

    #[arg(long, default_value = "542jzeOaLKbcpZhWfJDa")]
    voice_id: String,

    #[arg(long, default_value = "1.0")]
    stability: f32,

    #[arg(long, default_value = "0.5")]
    similarity_boost: f32,

    #[arg(long, default_value = "0.7")]
    style: f32,

    #[arg(long)]
    no_speaker_boost: bool,

    /// Write the reply audio to this WAV file instead of the speakers
    #[arg(long)]
    wav_out: Option<PathBuf>,
}

impl VoiceArgs {
    fn request(&self, text: &str, session_id: Option<String>) -> GenerateRequest {
        GenerateRequest {
            text: text.to_string(),
            profanity_level: self.profanity_level,
            session_id,
            voice_id: Some(self.voice_id.clone()),
            stability: self.stability,
            similarity_boost: self.similarity_boost,
            style: self.style,
            use_speaker_boost: !self.no_speaker_boost,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    match cli.command {
        Command::Serve => serve(cfg).await,
        Command::Ask { text, voice } => ask(cfg, &text, &voice).await,
        Command::Chat { voice } => chat(cfg, &voice).await,
    }
}

async fn serve(cfg: Config) -> Result<()> {
    anyhow::ensure!(!cfg.llm.api_key.is_empty(), "llm.api_key is not set (OPENAI_API_KEY)");
    anyhow::ensure!(!cfg.tts.api_key.is_empty(), "tts.api_key is not set (ELEVENLABS_API_KEY)");

    let chat = Arc::new(OpenAiChat::new(&cfg.llm).context("Failed to create chat client")?);
    let tts = Arc::new(ElevenLabsClient::new(&cfg.tts).context("Failed to create speech client")?);
    let speech = Arc::new(SpeechSynthesisOrchestrator::new(tts, cfg.tts.default_voice_id.clone()));

    let state = AppState::new(chat, speech)
        .with_response_chunk_bytes(cfg.service.http.response_chunk_bytes);

    if cfg.session.idle_timeout_secs > 0 {
        let sessions = Arc::clone(&state.sessions);
        let max_idle = Duration::from_secs(cfg.session.idle_timeout_secs);
        let every = Duration::from_secs(cfg.session.sweep_interval_secs.max(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let removed = sessions.purge_idle(max_idle).await;
                if removed > 0 {
                    info!("Expired {} idle sessions", removed);
                }
            }
        });
    }

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("{} listening on {}", cfg.service.name, addr);

    axum::serve(listener, create_router(state))
        .await
        .context("HTTP server failed")?;

    Ok(())
}

fn build_client(cfg: &Config, voice: &VoiceArgs) -> Result<VoiceClient> {
    let output = build_output(voice.wav_out.clone())?;
    let playback = Arc::new(PlaybackScheduler::new(
        output,
        PlaybackConfig {
            output_channels: cfg.client.output_channels,
        },
    ));
    Ok(VoiceClient::new(cfg.client.server_url.clone(), playback))
}

fn build_output(wav_out: Option<PathBuf>) -> Result<Arc<dyn AudioOutput>> {
    if let Some(path) = wav_out {
        return Ok(Arc::new(WavFileOutput::new(path)));
    }

    #[cfg(feature = "speaker")]
    {
        let speaker = voice_relay::audio::SpeakerOutput::new().context("Failed to open speakers")?;
        Ok(Arc::new(speaker))
    }

    #[cfg(not(feature = "speaker"))]
    {
        anyhow::bail!("No audio output available: pass --wav-out <file> or build with --features speaker")
    }
}

/// Run one exchange; Ctrl-C stops playback and abandons the exchange
async fn exchange(client: &VoiceClient, request: &GenerateRequest) -> Result<Option<ReplyTimings>> {
    tokio::select! {
        reply = client.generate(request) => Ok(Some(reply?)),
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted, stopping playback");
            client.stop_playback();
            if let Err(e) = client.playback().join().await {
                error!("Playback task failed: {}", e);
            }
            Ok(None)
        }
    }
}

fn print_reply(reply: &ReplyTimings) {
    println!("Text Response: {}", reply.text_response);
    println!("\nWord Timings:");
    for word in reply.timings.iter() {
        println!(
            "Word: {}, Start: {:.2}s, End: {:.2}s",
            word.word, word.start_seconds, word.end_seconds
        );
    }
}

async fn ask(cfg: Config, text: &str, voice: &VoiceArgs) -> Result<()> {
    let client = build_client(&cfg, voice)?;

    if let Some(reply) = exchange(&client, &voice.request(text, None)).await? {
        print_reply(&reply);
    }

    Ok(())
}

async fn chat(cfg: Config, voice: &VoiceArgs) -> Result<()> {
    let client = build_client(&cfg, voice)?;
    let session_id = format!("session-{}", uuid::Uuid::new_v4());

    info!("Chatting as {} (type 'exit' to quit)", session_id);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text.eq_ignore_ascii_case("exit") || text.eq_ignore_ascii_case("quit") {
            break;
        }

        match exchange(&client, &voice.request(text, Some(session_id.clone()))).await {
            Ok(Some(reply)) => print_reply(&reply),
            Ok(None) => break,
            Err(e) => error!("Error during request: {:#}", e),
        }
    }

    Ok(())
}
