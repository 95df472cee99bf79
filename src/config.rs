use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub llm: LlmConfig,
    pub tts: TtsConfig,
    pub session: SessionConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
    /// Size of the pieces the response envelope is streamed in
    pub response_chunk_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    pub api_base: String,
    pub api_key: String,
    pub default_voice_id: String,
    pub model_id: String,
    pub output_format: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Conversations idle longer than this are dropped (0 disables expiry)
    pub idle_timeout_secs: u64,
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub server_url: String,
    /// Channel count the playback device expects; mono audio is upmixed to it
    pub output_channels: u16,
}

impl Config {
    /// Load defaults, then the optional file at `path`, then the environment.
    ///
    /// `VOICE_RELAY__LLM__API_KEY`-style variables override any key; the
    /// plain `OPENAI_API_KEY`, `ELEVENLABS_API_KEY` and `DEFAULT_VOICE_ID`
    /// variables are honoured too.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "voice-relay")?
            .set_default("service.http.bind", "0.0.0.0")?
            .set_default("service.http.port", 8000)?
            .set_default("service.http.response_chunk_bytes", 8192)?
            .set_default("llm.api_base", "https://api.openai.com/v1")?
            .set_default("llm.api_key", "")?
            .set_default("llm.model", "gpt-4o")?
            .set_default("llm.timeout_secs", 60)?
            .set_default("tts.api_base", "https://api.elevenlabs.io")?
            .set_default("tts.api_key", "")?
            .set_default("tts.default_voice_id", "542jzeOaLKbcpZhWfJDa")?
            .set_default("tts.model_id", "eleven_multilingual_v2")?
            .set_default("tts.output_format", "mp3_44100_128")?
            .set_default("tts.timeout_secs", 120)?
            .set_default("session.idle_timeout_secs", 600)?
            .set_default("session.sweep_interval_secs", 60)?
            .set_default("client.server_url", "http://localhost:8000")?
            .set_default("client.output_channels", 2)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("VOICE_RELAY").separator("__"))
            .set_override_option("llm.api_key", std::env::var("OPENAI_API_KEY").ok())?
            .set_override_option("tts.api_key", std::env::var("ELEVENLABS_API_KEY").ok())?
            .set_override_option(
                "tts.default_voice_id",
                std::env::var("DEFAULT_VOICE_ID").ok(),
            )?
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
