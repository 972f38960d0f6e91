use anyhow::{anyhow, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

/// Main configuration structure for Tollgate
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Transition history kept on each context
    pub history: HistoryConfig,
    /// Logging settings
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HistoryConfig {
    /// Record a `TransitionRecord` for every committed transition
    pub enabled: bool,
    /// Maximum records kept per context, 0 for unbounded
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 1000,
        }
    }
}

impl HistoryConfig {
    pub fn capacity_limit(&self) -> Option<usize> {
        (self.capacity > 0).then_some(self.capacity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// Default filter directive when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

impl EngineConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (tollgate.toml)
    /// 3. Environment variables (TOLLGATE_HISTORY__CAPACITY, ...)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if Path::new("tollgate.toml").exists() {
            builder = builder.add_source(File::with_name("tollgate"));
        }

        builder = builder.add_source(Self::environment());

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Load defaults overridden by a specific file, then the environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(File::from(path.as_ref()))
            .add_source(Self::environment())
            .build()?;

        Ok(config.try_deserialize()?)
    }

    fn environment() -> Environment {
        Environment::with_prefix("TOLLGATE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Pull `TOLLGATE_*` overrides from a `.env` file. Returns whether one was found.
    pub fn load_env_file() -> Result<bool> {
        match dotenvy::dotenv() {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "Loaded environment from .env");
                Ok(true)
            }
            Err(e) if e.not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Read once per process: `.env`, then `tollgate.toml`, then the environment
static CONFIG: LazyLock<Result<EngineConfig, String>> = LazyLock::new(|| {
    if let Err(e) = EngineConfig::load_env_file() {
        tracing::warn!(error = %e, "Ignoring unreadable .env file");
    }
    EngineConfig::load().map_err(|e| e.to_string())
});

/// Process-wide configuration; `TransitionExecutor::new` takes its history settings from here
pub fn config() -> Result<&'static EngineConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow!("invalid tollgate configuration: {e}"))
}

/// Force the global configuration to load, surfacing errors at startup
/// instead of on the first executor
pub fn init_config() -> Result<&'static EngineConfig> {
    let config = config()?;
    tracing::info!(
        history_enabled = config.history.enabled,
        history_capacity = config.history.capacity,
        log_level = %config.telemetry.log_level,
        "Tollgate configuration loaded"
    );
    Ok(config)
}
