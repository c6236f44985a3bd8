use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Column names that precede the category columns in a cleaned table
pub const MESSAGE_COLUMNS: [&str; 4] = ["id", "message", "original", "genre"];

/// Names SQLite resolves to the implicit row key unless a column shadows them
const ROWID_ALIASES: [&str; 3] = ["rowid", "oid", "_rowid_"];

/// One cleaned row: message fields plus one 0/1 indicator per category
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CleanedRecord {
    pub id: i64,
    pub message: String,
    pub original: Option<String>,
    pub genre: String,

    /// Indicators in the owning table's category order
    pub labels: Vec<u8>,
}

impl CleanedRecord {
    /// Whether the message carries the category at `index`
    pub fn has_label(&self, index: usize) -> bool {
        self.labels.get(index).copied() == Some(1)
    }
}

/// The cleaned dataset: ordered category columns and their rows
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CleanedTable {
    category_names: Vec<String>,
    rows: Vec<CleanedRecord>,
}

impl CleanedTable {
    /// Build a table, checking the shape and binary invariants
    pub fn new(category_names: Vec<String>, rows: Vec<CleanedRecord>) -> Result<Self> {
        let table = Self {
            category_names,
            rows,
        };
        table.validate()?;
        Ok(table)
    }

    /// Check that every row matches the category columns, every indicator
    /// is 0 or 1 and identifiers are unique.
    ///
    /// Column names compare ASCII case-insensitively, as SQLite does.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for name in &self.category_names {
            let folded = name.to_ascii_lowercase();
            if MESSAGE_COLUMNS.contains(&folded.as_str()) {
                return Err(AppError::Data(format!(
                    "category name '{}' collides with a message column",
                    name
                )));
            }
            if ROWID_ALIASES.contains(&folded.as_str()) {
                return Err(AppError::Data(format!(
                    "category name '{}' is reserved for the row key",
                    name
                )));
            }
            if !names.insert(folded) {
                return Err(AppError::Data(format!("duplicate category column '{}'", name)));
            }
        }

        let mut ids = HashSet::with_capacity(self.rows.len());
        for row in &self.rows {
            if row.labels.len() != self.category_names.len() {
                return Err(AppError::Data(format!(
                    "row {} has {} category values, expected {}",
                    row.id,
                    row.labels.len(),
                    self.category_names.len()
                )));
            }
            if let Some(pos) = row.labels.iter().position(|&v| v > 1) {
                return Err(AppError::Data(format!(
                    "row {} has non-binary value {} in category '{}'",
                    row.id, row.labels[pos], self.category_names[pos]
                )));
            }
            if !ids.insert(row.id) {
                return Err(AppError::Data(format!("duplicate identifier {}", row.id)));
            }
        }

        Ok(())
    }

    pub fn category_names(&self) -> &[String] {
        &self.category_names
    }

    pub fn rows(&self) -> &[CleanedRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn category_count(&self) -> usize {
        self.category_names.len()
    }

    /// Position of a category column
    pub fn category_index(&self, name: &str) -> Option<usize> {
        self.category_names.iter().position(|n| n == name)
    }

    /// Number of rows flagged positive, per category column
    pub fn positive_counts(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.category_names.len()];
        for row in &self.rows {
            for (count, &value) in counts.iter_mut().zip(row.labels.iter()) {
                *count += value as usize;
            }
        }
        counts
    }

    /// Full column name list: message columns followed by categories
    pub fn column_names(&self) -> Vec<String> {
        MESSAGE_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.category_names.iter().cloned())
            .collect()
    }
}
