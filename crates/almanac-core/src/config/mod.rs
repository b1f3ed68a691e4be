use anyhow::Result;
use config::Config;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub extraction: ExtractionConfig,
    pub storage: StorageConfig,
    pub ocr: Option<OcrConfig>,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// ## Summary
    /// Returns the bind address in the format "host:port".
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Completion-service settings used by the batched extraction client.
#[derive(Clone, Deserialize)]
pub struct ExtractionConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub batch_size: usize,
    pub inter_batch_delay_ms: u64,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub request_timeout_secs: u64,
}

// Keeps the API key out of the startup log line.
impl std::fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("batch_size", &self.batch_size)
            .field("inter_batch_delay_ms", &self.inter_batch_delay_ms)
            .field("max_attempts", &self.max_attempts)
            .field("initial_backoff_ms", &self.initial_backoff_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub root: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of characters of extracted text kept on the document row.
    pub excerpt_chars: usize,
    /// Age after which a `processing` claim is considered abandoned.
    pub stale_run_secs: u64,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from `.env` file and environment variables into a `Settings`.
    /// Environment variables take precedence over `.env` file values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8698)?
            .set_default("database.max_connections", 4)?
            .set_default("logging.level", "debug")?
            .set_default("extraction.base_url", "https://api.openai.com/v1")?
            .set_default("extraction.model", "gpt-4o-mini")?
            .set_default("extraction.batch_size", 10)?
            .set_default("extraction.inter_batch_delay_ms", 400)?
            .set_default("extraction.max_attempts", 3)?
            .set_default("extraction.initial_backoff_ms", 500)?
            .set_default("extraction.request_timeout_secs", 60)?
            .set_default("storage.root", "./uploads")?
            .set_default("pipeline.excerpt_chars", 5000)?
            .set_default("pipeline.stale_run_secs", 900)?
            // Env file
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
