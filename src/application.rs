//! Application layer
//!
//! Query orchestration over the infrastructure: the paginated phonetic
//! search, the denomination quick check and class-suggestion recovery.

pub mod availability;
pub mod class_suggestion;
pub mod search_driver;

pub use availability::{AvailabilityStatus, DenominationChecker, DenominationRules};
pub use class_suggestion::{BusinessKind, ClassSuggestion, SuggestionSource, parse_class_suggestion};
pub use search_driver::{RegistrySearchClient, StopReason};
