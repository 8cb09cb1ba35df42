use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for crewdesk
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CrewdeskConfig {
    /// Remote or local backend settings
    pub backend: BackendConfig,
    /// On-site workflow behaviour
    pub workflow: WorkflowConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hosted backend over HTTPS
    #[default]
    Rest,
    /// JSON files under `data_dir`
    Local,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// Project base URL, e.g. `https://xyz.supabase.co`
    pub url: String,
    /// Public API key sent with every request
    pub anon_key: Option<String>,
    /// Signed-in staff session token (can be set via env var)
    pub access_token: Option<String>,
    pub photo_bucket: String,
    pub avatar_bucket: String,
    /// Root directory for the local backend
    pub data_dir: String,
    pub request_timeout_seconds: u64,
    /// Identity reported by the local backend
    pub local_staff_email: Option<String>,
    pub local_staff_id: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Rest,
            url: String::new(),
            anon_key: None,
            access_token: None,
            photo_bucket: "work-photos".to_string(),
            avatar_bucket: "avatars".to_string(),
            data_dir: ".crewdesk".to_string(),
            request_timeout_seconds: 30,
            local_staff_email: None,
            local_staff_id: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// JPEG quality for job photos, within (0, 1]
    pub capture_quality: f32,
    /// Wall-clock length of one timer second
    pub tick_interval_ms: u64,
    pub show_call_button: bool,
    /// Show a busy indicator while a photo uploads
    pub show_upload_overlay: bool,
    /// Ask before starting the timer
    pub confirm_start: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            capture_quality: 0.6,
            tick_interval_ms: 1000,
            show_call_button: true,
            show_upload_overlay: true,
            confirm_start: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
    /// JSON lines instead of human-readable output
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: true,
        }
    }
}

impl CrewdeskConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (crewdesk.toml, .crewdesk-rc)
    /// 3. Environment variables (prefixed with CREWDESK__)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same as [`CrewdeskConfig::load`] with config files looked up in `dir`
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder();

        let toml_path = dir.join("crewdesk.toml");
        if toml_path.exists() {
            builder = builder.add_source(File::from(toml_path));
        }

        let rc_path = dir.join(".crewdesk-rc");
        if rc_path.exists() {
            builder = builder.add_source(File::from(rc_path).format(config::FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("CREWDESK")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let mut crewdesk_config: CrewdeskConfig = config.try_deserialize()?;

        // Session token may come from the environment under either name
        if crewdesk_config.backend.access_token.is_none() {
            if let Ok(token) = std::env::var("CREWDESK_ACCESS_TOKEN") {
                crewdesk_config.backend.access_token = Some(token);
            } else if let Ok(token) = std::env::var("SUPABASE_ACCESS_TOKEN") {
                crewdesk_config.backend.access_token = Some(token);
            }
        }

        Ok(crewdesk_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<CrewdeskConfig, anyhow::Error>> = std::sync::LazyLock::new(|| {
    let _ = CrewdeskConfig::load_env_file();
    CrewdeskConfig::load()
});

/// Get the global configuration
pub fn config() -> Result<&'static CrewdeskConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}
