use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub donations: DonationConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub overlay: OverlayConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: "change-me-in-production".to_string(),
            access_token_expires_in: 7200,
        }
    }
}

/// Single operator account allowed to publish donations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub email: String,
    pub username: String,
    /// bcrypt hash; an empty hash rejects every login
    pub password_hash: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            email: "admin@gamecorn.live".to_string(),
            username: "GameCorn".to_string(),
            password_hash: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DonationConfig {
    pub enabled: bool,
    pub message_max_chars: usize,
    pub preset_amounts: Vec<u32>,
    pub default_voice: String,
}

impl Default for DonationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            message_max_chars: 500,
            preset_amounts: vec![100, 500, 1000, 5000],
            default_voice: crate::models::DEFAULT_VOICE_ID.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueueBackendKind {
    Memory,
    File,
}

impl std::str::FromStr for QueueBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(QueueBackendKind::Memory),
            "file" => Ok(QueueBackendKind::File),
            other => Err(format!("unknown queue backend: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    pub backend: QueueBackendKind,
    pub data_dir: String,
    pub key: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            backend: QueueBackendKind::File,
            data_dir: "data".to_string(),
            key: "donations".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub poll_interval_ms: u64,
    pub progress_tick_ms: u64,
    pub linger_after_end_ms: u64,
    pub linger_after_error_ms: u64,
    pub fade_ms: u64,
    pub chars_per_second: f64,
    /// 0 disables orphan reaping
    pub claim_ttl_secs: u64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            progress_tick_ms: 100,
            linger_after_end_ms: 2000,
            linger_after_error_ms: 3000,
            fade_ms: 500,
            chars_per_second: 10.0,
            claim_ttl_secs: 300,
        }
    }
}

impl OverlayConfig {
    pub fn claim_ttl(&self) -> Option<Duration> {
        (self.claim_ttl_secs > 0).then(|| Duration::from_secs(self.claim_ttl_secs))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SpeechEngine {
    Simulated,
    Command,
}

impl std::str::FromStr for SpeechEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "simulated" => Ok(SpeechEngine::Simulated),
            "command" => Ok(SpeechEngine::Command),
            other => Err(format!("unknown speech engine: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub engine: SpeechEngine,
    pub program: String,
    /// Argument templates, see `external::speech::render_args`
    pub args: Vec<String>,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            engine: SpeechEngine::Simulated,
            program: "espeak-ng".to_string(),
            args: [
                "-v", "{voice}", "-s", "{wpm}", "-p", "{pitch_percent}", "-a", "{amplitude}",
                "{text}",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 配置文件缺失时使用默认值，再由环境变量覆盖
        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::parse(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No config file at {config_path}, using defaults");
                Config::default()
            }
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn parse(config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        toml::from_str(config_str).map_err(|e| format!("Failed to parse config file: {e}").into())
    }

    fn apply_env_overrides(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("ADMIN_EMAIL") {
            self.auth.email = v;
        }
        if let Ok(v) = env::var("ADMIN_USERNAME") {
            self.auth.username = v;
        }
        if let Ok(v) = env::var("ADMIN_PASSWORD_HASH") {
            self.auth.password_hash = v;
        }
        if let Ok(v) = env::var("DONATIONS_ENABLED")
            && let Ok(b) = v.parse()
        {
            self.donations.enabled = b;
        }
        if let Ok(v) = env::var("QUEUE_BACKEND") {
            self.queue.backend = v.parse()?;
        }
        if let Ok(v) = env::var("QUEUE_DATA_DIR") {
            self.queue.data_dir = v;
        }
        if let Ok(v) = env::var("QUEUE_KEY") {
            self.queue.key = v;
        }
        if let Ok(v) = env::var("SPEECH_ENGINE") {
            self.speech.engine = v.parse()?;
        }
        if let Ok(v) = env::var("SPEECH_PROGRAM") {
            self.speech.program = v;
        }
        if let Ok(v) = env::var("OVERLAY_CLAIM_TTL_SECS")
            && let Ok(n) = v.parse()
        {
            self.overlay.claim_ttl_secs = n;
        }

        Ok(())
    }
}
