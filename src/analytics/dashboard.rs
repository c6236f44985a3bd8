//! Dataset overview served to the dashboard

use crate::models::CleanedTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Counts describing the cleaned training table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetOverview {
    /// Number of rows in the table
    pub rows: usize,

    /// Message count per genre
    pub genre_counts: BTreeMap<String, usize>,

    /// Positive count per category, highest first
    pub category_counts: Vec<(String, usize)>,
}

impl DatasetOverview {
    pub fn from_table(table: &CleanedTable) -> Self {
        let mut genre_counts = BTreeMap::new();
        for row in table.rows() {
            *genre_counts.entry(row.genre.clone()).or_insert(0) += 1;
        }

        let mut category_counts: Vec<(String, usize)> = table
            .category_names()
            .iter()
            .cloned()
            .zip(table.positive_counts())
            .collect();
        // Ties keep table order
        category_counts.sort_by(|a, b| b.1.cmp(&a.1));

        Self {
            rows: table.len(),
            genre_counts,
            category_counts,
        }
    }

    /// The `n` most frequent categories
    pub fn top_categories(&self, n: usize) -> &[(String, usize)] {
        &self.category_counts[..n.min(self.category_counts.len())]
    }
}
