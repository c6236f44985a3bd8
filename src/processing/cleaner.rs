use crate::error::{AppError, Result};
use crate::metrics::{CATEGORIES_DROPPED_TOTAL, ROWS_DROPPED_TOTAL};
use crate::models::{CleanedRecord, CleanedTable, JoinedRecord};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Separator between tokens of a packed category string
pub const TOKEN_SEPARATOR: char = ';';

/// Counts describing what cleaning removed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub exact_duplicates_removed: usize,
    pub duplicate_ids_removed: usize,
    pub output_rows: usize,
    pub input_categories: usize,
    pub dropped_categories: Vec<String>,
}

impl CleaningReport {
    pub fn output_categories(&self) -> usize {
        self.input_categories - self.dropped_categories.len()
    }
}

/// Clean joined records into a binary-labelled table
pub fn clean_data(records: Vec<JoinedRecord>) -> Result<CleanedTable> {
    clean_data_with_report(records).map(|(table, _)| table)
}

/// Clean joined records and report what was removed.
///
/// Expands the packed category strings into one 0/1 column per category,
/// removes duplicate rows and identifiers (first occurrence wins), then
/// drops every category column without a single positive row.
pub fn clean_data_with_report(
    records: Vec<JoinedRecord>,
) -> Result<(CleanedTable, CleaningReport)> {
    let mut report = CleaningReport {
        input_rows: records.len(),
        ..Default::default()
    };

    let first = records
        .first()
        .ok_or_else(|| AppError::Data("no rows to clean".to_string()))?;
    let category_names: Vec<String> = parse_packed(packed_of(first)?)?
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    ensure_unique_names(&category_names)?;
    report.input_categories = category_names.len();

    let positions: HashMap<&str, usize> = category_names
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.as_str(), idx))
        .collect();

    let mut expanded = Vec::with_capacity(records.len());
    for record in &records {
        let labels = expand_labels(record, &positions)?;
        expanded.push(CleanedRecord {
            id: record.id,
            message: record.message.clone(),
            original: record.original.clone(),
            genre: record.genre.clone(),
            labels,
        });
    }
    drop(records);

    let (deduplicated, exact, by_id) = deduplicate(expanded);
    report.exact_duplicates_removed = exact;
    report.duplicate_ids_removed = by_id;
    if exact > 0 {
        ROWS_DROPPED_TOTAL
            .with_label_values(&["exact_duplicate"])
            .inc_by(exact as f64);
    }
    if by_id > 0 {
        ROWS_DROPPED_TOTAL
            .with_label_values(&["duplicate_id"])
            .inc_by(by_id as f64);
    }
    debug!(exact, by_id, "Removed duplicate rows");

    let (category_names, rows, dropped) = drop_unsupported(category_names, deduplicated);
    for name in &dropped {
        warn!(category = %name, "Dropping category with no positive examples");
    }
    CATEGORIES_DROPPED_TOTAL.inc_by(dropped.len() as f64);
    report.dropped_categories = dropped;

    if category_names.is_empty() {
        return Err(AppError::Data(
            "no category has a positive example".to_string(),
        ));
    }

    report.output_rows = rows.len();
    let table = CleanedTable::new(category_names, rows)?;

    info!(
        input_rows = report.input_rows,
        output_rows = report.output_rows,
        categories = table.category_count(),
        "Cleaned dataset"
    );

    Ok((table, report))
}

/// Split a packed string into `(name, indicator)` pairs.
///
/// Tokens look like `name-value` (or `name:value`); the value must be a
/// non-negative integer and anything above zero counts as positive.
pub fn parse_packed(packed: &str) -> Result<Vec<(String, u8)>> {
    let mut pairs = Vec::new();
    for token in packed.split(TOKEN_SEPARATOR) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        pairs.push(parse_token(token)?);
    }

    if pairs.is_empty() {
        return Err(AppError::Data(format!(
            "packed category string '{}' has no tokens",
            packed
        )));
    }

    Ok(pairs)
}

fn parse_token(token: &str) -> Result<(String, u8)> {
    let split_at = token
        .find(|c: char| c == '-' || c == ':')
        .ok_or_else(|| AppError::Data(format!("malformed category token '{}'", token)))?;
    let (name, value) = (token[..split_at].trim(), token[split_at + 1..].trim());

    if name.is_empty() {
        return Err(AppError::Data(format!(
            "category token '{}' has no name",
            token
        )));
    }

    let value: i64 = value.parse().map_err(|_| {
        AppError::Data(format!(
            "category token '{}' has a non-integer value",
            token
        ))
    })?;

    let indicator = match value {
        0 => 0,
        v if v > 0 => 1,
        _ => {
            return Err(AppError::Data(format!(
                "category token '{}' has a negative value",
                token
            )))
        }
    };

    Ok((name.to_string(), indicator))
}

fn packed_of(record: &JoinedRecord) -> Result<&str> {
    record.categories.as_deref().ok_or_else(|| {
        AppError::Data(format!("message {} has no category assignment", record.id))
    })
}

fn ensure_unique_names(names: &[String]) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(AppError::Data(format!(
                "category '{}' appears twice in one packed string",
                name
            )));
        }
    }
    Ok(())
}

fn expand_labels(record: &JoinedRecord, positions: &HashMap<&str, usize>) -> Result<Vec<u8>> {
    let pairs = parse_packed(packed_of(record)?)?;
    if pairs.len() != positions.len() {
        return Err(AppError::Data(format!(
            "message {} has {} categories, expected {}",
            record.id,
            pairs.len(),
            positions.len()
        )));
    }

    let mut labels = vec![0u8; positions.len()];
    let mut filled = vec![false; positions.len()];
    for (name, value) in pairs {
        let idx = *positions.get(name.as_str()).ok_or_else(|| {
            AppError::Data(format!(
                "message {} has unknown category '{}'",
                record.id, name
            ))
        })?;
        if filled[idx] {
            return Err(AppError::Data(format!(
                "message {} repeats category '{}'",
                record.id, name
            )));
        }
        filled[idx] = true;
        labels[idx] = value;
    }

    Ok(labels)
}

/// Remove exact duplicates, then later rows that reuse an identifier
fn deduplicate(rows: Vec<CleanedRecord>) -> (Vec<CleanedRecord>, usize, usize) {
    let mut seen_rows: HashSet<CleanedRecord> = HashSet::with_capacity(rows.len());
    let mut seen_ids: HashSet<i64> = HashSet::with_capacity(rows.len());
    let mut exact = 0;
    let mut by_id = 0;
    let mut kept = Vec::with_capacity(rows.len());

    for row in rows {
        if seen_rows.contains(&row) {
            exact += 1;
            continue;
        }
        seen_rows.insert(row.clone());

        if !seen_ids.insert(row.id) {
            by_id += 1;
            continue;
        }
        kept.push(row);
    }

    (kept, exact, by_id)
}

/// Drop category columns whose positive count is zero
fn drop_unsupported(
    category_names: Vec<String>,
    rows: Vec<CleanedRecord>,
) -> (Vec<String>, Vec<CleanedRecord>, Vec<String>) {
    let mut support = vec![0usize; category_names.len()];
    for row in &rows {
        for (count, &value) in support.iter_mut().zip(row.labels.iter()) {
            *count += value as usize;
        }
    }

    let keep: Vec<bool> = support.iter().map(|&count| count > 0).collect();
    if keep.iter().all(|&k| k) {
        return (category_names, rows, Vec::new());
    }

    let mut kept_names = Vec::new();
    let mut dropped = Vec::new();
    for (name, &k) in category_names.into_iter().zip(keep.iter()) {
        if k {
            kept_names.push(name);
        } else {
            dropped.push(name);
        }
    }

    let rows = rows
        .into_iter()
        .map(|mut row| {
            row.labels = row
                .labels
                .iter()
                .zip(keep.iter())
                .filter(|(_, k)| **k)
                .map(|(&value, _)| value)
                .collect();
            row
        })
        .collect();

    (kept_names, rows, dropped)
}
