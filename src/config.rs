use crate::prompts::TargetScript;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Default oracle endpoint root
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default oracle model
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";

#[derive(Parser, Debug)]
#[command(name = "textlens-server")]
#[command(about = "Detect, transliterate and translate text in images with a multimodal AI model")]
#[command(version)]
pub struct ServerArgs {
    /// Host address to bind to
    #[arg(long, env = "TEXTLENS_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "TEXTLENS_PORT", default_value = "9292")]
    pub port: u16,

    /// Maximum image size in bytes (default: 10MB)
    #[arg(long, env = "TEXTLENS_MAX_FILE_SIZE", default_value = "10485760")]
    pub max_file_size: usize,

    /// Maximum request body size in bytes, must exceed the image limit
    #[arg(long, env = "TEXTLENS_MAX_BODY_SIZE", default_value = "26214400")]
    pub max_body_size: usize,

    /// Status class used when an image exceeds the size limit
    #[arg(long, env = "TEXTLENS_OVERSIZE_STATUS", value_enum, default_value = "server-error")]
    pub oversize_status: OversizeStatus,

    /// Script family the deployment looks for ("any" or "devanagari")
    #[arg(long, env = "TEXTLENS_TARGET_SCRIPT", value_enum, default_value = "any")]
    pub target_script: TargetScript,

    /// Gemini API key; requests fail with a server error when unset
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model identifier
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    pub gemini_model: String,

    /// Gemini API base URL
    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    pub gemini_base_url: String,

    /// Timeout for a single oracle call in seconds (no timeout when unset)
    #[arg(long, env = "TEXTLENS_ORACLE_TIMEOUT_SECS")]
    pub oracle_timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

/// How an oversized upload is reported to the caller.
///
/// The original deployment answered with a 500; `client-error` answers 413.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OversizeStatus {
    #[default]
    ServerError,
    ClientError,
}

/// Oracle connection settings
#[derive(Debug, Clone)]
pub struct OracleSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Option<Duration>,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_file_size: usize,
    pub max_body_size: usize,
    pub oversize_status: OversizeStatus,
    pub target_script: TargetScript,
    pub oracle: OracleSettings,
}

impl Config {
    /// Address string handed to the TCP listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9292,
            max_file_size: 10 * 1024 * 1024,
            max_body_size: 25 * 1024 * 1024,
            oversize_status: OversizeStatus::default(),
            target_script: TargetScript::default(),
            oracle: OracleSettings {
                api_key: None,
                model: DEFAULT_GEMINI_MODEL.to_string(),
                base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
                timeout: None,
            },
        }
    }
}

impl From<ServerArgs> for Config {
    fn from(args: ServerArgs) -> Self {
        // Blank keys from an empty env var count as missing
        let api_key = args.gemini_api_key.filter(|key| !key.trim().is_empty());

        Self {
            host: args.host,
            port: args.port,
            max_file_size: args.max_file_size,
            max_body_size: args.max_body_size.max(args.max_file_size),
            oversize_status: args.oversize_status,
            target_script: args.target_script,
            oracle: OracleSettings {
                api_key,
                model: args.gemini_model,
                base_url: args.gemini_base_url.trim_end_matches('/').to_string(),
                timeout: args.oracle_timeout_secs.map(Duration::from_secs),
            },
        }
    }
}

/// Arguments of the `textlens` upload client
#[derive(Parser, Debug)]
#[command(name = "textlens")]
#[command(about = "Upload an image to a textlens server and show what it says")]
#[command(version)]
pub struct ClientArgs {
    /// Image to analyze (JPG, PNG, GIF or WEBP, up to 10MB)
    pub file: PathBuf,

    /// Base URL of the textlens server
    #[arg(long, env = "TEXTLENS_SERVER", default_value = "http://127.0.0.1:9292")]
    pub server: String,

    /// Skip the progress animation delays
    #[arg(long)]
    pub no_pacing: bool,

    /// Print the result as JSON instead of the formatted view
    #[arg(long)]
    pub json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,
}
