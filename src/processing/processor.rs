use crate::error::Result;
use crate::processing::{clean_data_with_report, load_data, CleaningReport};
use crate::state::DatasetStore;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Outcome of one load → clean → persist run
#[derive(Debug, Clone, Serialize)]
pub struct ProcessingSummary {
    pub table_name: String,
    pub rows: usize,
    pub categories: Vec<String>,
    pub report: CleaningReport,
}

/// Runs the processing job against a dataset store
pub struct DatasetProcessor {
    store: Box<dyn DatasetStore>,
    table_name: String,
}

impl DatasetProcessor {
    pub fn new(store: Box<dyn DatasetStore>, table_name: impl Into<String>) -> Self {
        Self {
            store,
            table_name: table_name.into(),
        }
    }

    /// Load both inputs, clean them and replace the target table
    pub fn process(
        &mut self,
        messages_path: impl AsRef<Path>,
        categories_path: impl AsRef<Path>,
    ) -> Result<ProcessingSummary> {
        info!("Loading data");
        let joined = load_data(messages_path, categories_path)?;

        info!(rows = joined.len(), "Cleaning data");
        let (table, report) = clean_data_with_report(joined)?;

        info!(table = %self.table_name, "Saving data");
        self.store.save_table(&self.table_name, &table)?;

        Ok(ProcessingSummary {
            table_name: self.table_name.clone(),
            rows: table.len(),
            categories: table.category_names().to_vec(),
            report,
        })
    }

    pub fn store(&self) -> &dyn DatasetStore {
        self.store.as_ref()
    }
}
