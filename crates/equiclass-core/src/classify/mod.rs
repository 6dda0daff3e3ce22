//! Golf ball classification pipeline
//!
//! Images are uploaded, read by a vision model in three independent passes,
//! reconciled by a fourth, turned into a search query plus filter, and
//! matched against the equipment index. A pass with no qualifying hits is
//! rerun once.

mod consolidate;
mod extractor;
mod history;
mod manufacturers;
mod pipeline;
mod prompts;
mod query_builder;
mod record;
mod session;

pub use consolidate::{Consolidator, FIRST_PASS_COUNT};
pub use extractor::{parse_extraction, ImageExtractor};
pub use history::{ChatHistory, ChatSender, HistoryStore};
pub use manufacturers::{ManufacturerCache, ManufacturerSource};
pub use pipeline::{Classifier, Collaborators, ImageUpload, MAX_PASSES};
pub use query_builder::{build_filter, escape_filter_value, QueryBuilder};
pub use record::{ClassificationResponse, ExtractionRecord, SearchQuery, UNKNOWN_MANUFACTURER};
pub use session::{generate_session_id, resolve_session_id};
