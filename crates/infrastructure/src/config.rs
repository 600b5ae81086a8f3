//! Application configuration
//!
//! Loaded from an optional `config` file with `MIMICDB_*` environment
//! overrides. Everything has a sensible default; the standalone binary is
//! usable with no configuration at all.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to bind to. Zero means "pick a free ephemeral port".
    #[serde(default = "default_port")]
    pub port: u16,

    /// Graceful shutdown timeout in seconds
    #[serde(default)]
    pub shutdown_timeout_secs: Option<u64>,
}

const fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            shutdown_timeout_secs: Some(30),
        }
    }
}

/// Optional native storage accelerator settings. When present, startup runs
/// the native-library bootstrap instead of the bundled no-op strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceleratorConfig {
    /// Library stem, expanded to the platform file name
    /// (`lib<stem>.so`, `lib<stem>.dylib`, `<stem>.dll`)
    pub library_stem: String,

    /// Directory the search starts from. Defaults to the directory of the
    /// running executable.
    #[serde(default)]
    pub search_root: Option<PathBuf>,
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Native accelerator configuration (optional)
    #[serde(default)]
    pub accelerator: Option<AcceleratorConfig>,
}

impl AppConfig {
    /// Load configuration from environment and optional file
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // Start with defaults
            .set_default("server.port", i64::from(default_port()))?
            // Load from file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (e.g., MIMICDB_SERVER_PORT)
            .add_source(
                config::Environment::with_prefix("MIMICDB")
                    .separator("_")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }
}
