//! Configuration infrastructure
//!
//! Settings for the registry client, the retry loop and logging. Every field
//! has a default from [`defaults`], so an empty or partial file is valid.
//! Values are layered: built-in defaults, then an optional file (TOML or JSON,
//! chosen by extension), then `IMPI_SEARCH__SECTION__FIELD` environment variables.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub registry: RegistryConfig,
    pub retry: RetrySettings,
    pub logging: LoggingConfig,
}

/// Registry endpoints, pagination bounds and HTTP behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Landing page that embeds the continuation token
    pub landing_url: String,

    /// Partial-update endpoint of the phonetic search form
    pub search_url: String,

    /// Partial-update endpoint of the denomination quick check
    pub denomination_url: String,

    /// Rows per result page; fixed by the registry
    pub page_size: u32,

    /// Hard ceiling on pages fetched per query
    pub max_pages: u32,

    pub bootstrap_timeout_seconds: u64,
    pub page_timeout_seconds: u64,

    /// Outgoing request budget shared by bootstrap and page requests
    pub requests_per_second: u32,
    pub burst_size: u32,

    pub user_agent: String,
}

/// Query-level retry loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts per query, the first one included
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds
    pub retry_delay_ms: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    pub console_output: bool,
    pub file_output: bool,

    /// Directory for log files; defaults to the platform data dir
    pub log_dir: Option<PathBuf>,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Rotate and clean up old log files on startup
    pub auto_cleanup_logs: bool,

    /// Module-specific log level filters (e.g., "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            landing_url: marcanet::LANDING_URL.to_string(),
            search_url: marcanet::PHONETIC_SEARCH_URL.to_string(),
            denomination_url: marcanet::DENOMINATION_SEARCH_URL.to_string(),
            page_size: defaults::PAGE_SIZE,
            max_pages: defaults::MAX_PAGES,
            bootstrap_timeout_seconds: defaults::BOOTSTRAP_TIMEOUT_SECONDS,
            page_timeout_seconds: defaults::PAGE_TIMEOUT_SECONDS,
            requests_per_second: defaults::REQUESTS_PER_SECOND,
            burst_size: defaults::BURST_SIZE,
            user_agent: defaults::USER_AGENT.to_string(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: defaults::MAX_ATTEMPTS,
            retry_delay_ms: defaults::RETRY_DELAY_MS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: false,
            console_output: true,
            file_output: false,
            log_dir: None,
            max_files: defaults::MAX_LOG_FILES,
            auto_cleanup_logs: true,
            module_filters: HashMap::new(),
        }
    }
}

impl RegistryConfig {
    pub const fn bootstrap_timeout(&self) -> Duration {
        Duration::from_secs(self.bootstrap_timeout_seconds)
    }

    pub const fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_seconds)
    }
}

impl RetrySettings {
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl AppConfig {
    /// Load from an explicit file, then apply environment overrides.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        info!("📄 Loading configuration from {}", path.display());
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .add_source(environment_source())
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the default location if present, otherwise defaults plus environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = default_config_path().filter(|path| path.exists()) {
            debug!("Using config file {}", path.display());
            builder = builder.add_source(config::File::from(path.as_path()).required(false));
        }

        let settings = builder.add_source(environment_source()).build()?;
        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let registry = &self.registry;
        let checks = [
            (registry.page_size == 0, "registry.page_size must be greater than zero"),
            (registry.max_pages == 0, "registry.max_pages must be greater than zero"),
            (
                registry.bootstrap_timeout_seconds == 0,
                "registry.bootstrap_timeout_seconds must be greater than zero",
            ),
            (
                registry.page_timeout_seconds == 0,
                "registry.page_timeout_seconds must be greater than zero",
            ),
            (
                registry.requests_per_second == 0,
                "registry.requests_per_second must be greater than zero",
            ),
            (self.retry.max_attempts == 0, "retry.max_attempts must be greater than zero"),
        ];

        if let Some((_, message)) = checks.iter().find(|(failed, _)| *failed) {
            return Err(ConfigError::Validation {
                message: (*message).to_string(),
            });
        }

        for (name, url) in [
            ("landing_url", &registry.landing_url),
            ("search_url", &registry.search_url),
            ("denomination_url", &registry.denomination_url),
        ] {
            url::Url::parse(url).map_err(|e| ConfigError::Validation {
                message: format!("registry.{name} is not a valid URL: {e}"),
            })?;
        }

        Ok(())
    }
}

fn environment_source() -> config::Environment {
    config::Environment::with_prefix(defaults::ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

/// `<config dir>/impi-search/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(defaults::APP_DIR_NAME).join("config.toml"))
}

/// `<data dir>/impi-search/logs`
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(defaults::APP_DIR_NAME)
        .join("logs")
}

/// Registry endpoints and JSF form vocabulary
pub mod marcanet {
    pub const LANDING_URL: &str = "https://acervomarcas.impi.gob.mx:8181/marcanet/";

    pub const PHONETIC_SEARCH_URL: &str =
        "https://acervomarcas.impi.gob.mx:8181/marcanet/vistas/common/datos/bsqFoneticaCompleta.pgi";

    pub const DENOMINATION_SEARCH_URL: &str =
        "https://acervomarcas.impi.gob.mx:8181/marcanet/vistas/common/home.pgi";

    /// JSF partial-request parameters
    pub mod faces {
        pub const VIEW_STATE: &str = "javax.faces.ViewState";
        pub const PARTIAL_AJAX: &str = "javax.faces.partial.ajax";
        pub const SOURCE: &str = "javax.faces.source";
        pub const PARTIAL_EXECUTE: &str = "javax.faces.partial.execute";
        pub const PARTIAL_RENDER: &str = "javax.faces.partial.render";
    }

    /// Phonetic search form (`frmBsqFonetica`)
    pub mod phonetic {
        pub const FORM: &str = "frmBsqFonetica";
        pub const TERM_FIELD: &str = "frmBsqFonetica:denominacion";
        pub const CLASS_FIELD: &str = "frmBsqFonetica:clases";
        pub const SUBMIT_BUTTON: &str = "frmBsqFonetica:busquedaId2";
        pub const RESULT_TABLE: &str = "frmBsqFonetica:resultadoExpediente";
        pub const RESULT_TABLE_BODY: &str = "frmBsqFonetica:resultadoExpediente_data";
        pub const PAGINATION_FLAG: &str = "frmBsqFonetica:resultadoExpediente_pagination";
        pub const FIRST_ROW: &str = "frmBsqFonetica:resultadoExpediente_first";
        pub const ROW_COUNT: &str = "frmBsqFonetica:resultadoExpediente_rows";
    }

    /// Denomination search form (`frmBsqDen`)
    pub mod denomination {
        pub const FORM: &str = "frmBsqDen";
        pub const TERM_FIELD: &str = "frmBsqDen:denominacionId";
        pub const EXACT_SWITCH: &str = "frmBsqDen:swtExacto";
        pub const SUBMIT_BUTTON: &str = "frmBsqDen:busquedaIdButton";
        pub const RESULT_TABLE_BODY: &str = "frmBsqDen:resultadoExpediente_data";
    }

    /// Markup markers shared by both forms
    pub mod markers {
        pub const RESULT_TABLE_HINT: &str = "resultadoExpediente";
        pub const DATA_TABLE_BODY_CLASS: &str = "ui-datatable-data";
        pub const EMPTY_TABLE_MESSAGE: &str = "ui-datatable-empty-message";
    }
}

/// Default configuration values
pub mod defaults {
    /// Rows per registry page
    pub const PAGE_SIZE: u32 = 15;

    /// 20 pages x 15 rows = 300 records at most
    pub const MAX_PAGES: u32 = 20;

    pub const MAX_ATTEMPTS: u32 = 3;
    pub const RETRY_DELAY_MS: u64 = 2000;

    pub const BOOTSTRAP_TIMEOUT_SECONDS: u64 = 30;
    pub const PAGE_TIMEOUT_SECONDS: u64 = 30;

    pub const REQUESTS_PER_SECOND: u32 = 1;
    pub const BURST_SIZE: u32 = 2;

    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    pub const ACCEPT_LANGUAGE: &str = "es-MX,es;q=0.9,en;q=0.8";

    pub const LOG_LEVEL: &str = "info";
    pub const MAX_LOG_FILES: u32 = 5;

    pub const ENV_PREFIX: &str = "IMPI_SEARCH";
    pub const APP_DIR_NAME: &str = "impi-search";
}
