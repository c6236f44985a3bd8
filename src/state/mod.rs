pub mod sqlite_store;
pub mod store;

pub use sqlite_store::SqliteStore;
pub use store::InMemoryStore;

use crate::error::Result;
use crate::models::CleanedTable;

/// Storage for cleaned dataset tables
pub trait DatasetStore: Send {
    /// Write `table` under `name`, replacing any table of that name
    fn save_table(&mut self, name: &str, table: &CleanedTable) -> Result<()>;

    /// Read the table stored under `name`
    fn load_table(&self, name: &str) -> Result<CleanedTable>;

    /// Whether a table named `name` exists
    fn table_exists(&self, name: &str) -> Result<bool>;
}
