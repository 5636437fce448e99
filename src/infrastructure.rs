//! Infrastructure layer for registry transport, parsing and configuration
//!
//! HTTP transport with rate limiting, continuation-token handling, response
//! parsing, retry bookkeeping and the logging/config ambient stack.

pub mod config; // Configuration loading and registry constants
pub mod http_client;
pub mod logging;
pub mod parsing; // Envelope, table and analysis-response parsing
pub mod parsing_error;
pub mod registry_error;
pub mod request_forms;
pub mod retry_manager;
pub mod session;

// Re-export commonly used items
pub use config::{AppConfig, ConfigError, LoggingConfig, RegistryConfig, RetrySettings, marcanet};
pub use http_client::{RegistryHttpClient, RegistryTransport, TransportFailure, TransportResponse};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use parsing::{PageContext, PageParser, ParsedPage, ParsingConfig, repair_analysis};
pub use parsing_error::{ParsingError, ParsingResult};
pub use registry_error::{RegistryError, TransportFailureKind};
pub use request_forms::{PageAction, PageRequestForm, denomination_form};
pub use retry_manager::{RetryDecision, RetryManager, RetryPolicy};
pub use session::{ContinuationToken, SessionManager, TokenExtractor};
