//! Domain module - registry search and analysis types
//!
//! Each module is its own file in the domain/ directory; the commonly used
//! types are re-exported here.

pub mod analysis;
pub mod nice_class;
pub mod record;
pub mod search;

pub use analysis::{RepairPath, RepairedAnalysis, ViabilityCategory};
pub use nice_class::{NiceClass, NiceClassError};
pub use record::RegistryRecord;
pub use search::{InvalidSearchInput, PageSummary, ResultPage, SearchRequest, SearchResult};
