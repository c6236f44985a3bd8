pub mod cleaner;
pub mod loader;
pub mod processor;

pub use cleaner::{clean_data, clean_data_with_report, parse_packed, CleaningReport};
pub use loader::{join_on_id, load_data, read_categories, read_messages};
pub use processor::{DatasetProcessor, ProcessingSummary};
