use crate::error::{AppError, Result};
use crate::models::CleanedTable;
use crate::state::DatasetStore;
use std::collections::HashMap;

/// In-memory dataset store (for tests and throwaway runs)
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: HashMap<String, CleanedTable>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DatasetStore for InMemoryStore {
    fn save_table(&mut self, name: &str, table: &CleanedTable) -> Result<()> {
        table.validate()?;
        self.tables.insert(name.to_string(), table.clone());
        tracing::debug!(table = name, rows = table.len(), "Table saved");
        Ok(())
    }

    fn load_table(&self, name: &str) -> Result<CleanedTable> {
        self.tables
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("table '{}' does not exist", name)))
    }

    fn table_exists(&self, name: &str) -> Result<bool> {
        Ok(self.tables.contains_key(name))
    }
}
