use crate::error::{AppError, Result};
use crate::metrics::ROWS_LOADED_TOTAL;
use crate::models::{CategoryAssignment, JoinedRecord, MessageRecord};
use csv::StringRecord;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Load the messages and categories files and join them on `id`
pub fn load_data(
    messages_path: impl AsRef<Path>,
    categories_path: impl AsRef<Path>,
) -> Result<Vec<JoinedRecord>> {
    let messages_path = messages_path.as_ref();
    let categories_path = categories_path.as_ref();

    let messages = read_messages(open_csv(messages_path)?)?;
    info!(path = %messages_path.display(), rows = messages.len(), "Loaded messages");

    let categories = read_categories(open_csv(categories_path)?)?;
    info!(path = %categories_path.display(), rows = categories.len(), "Loaded categories");

    Ok(join_on_id(messages, categories))
}

fn open_csv(path: &Path) -> Result<std::fs::File> {
    std::fs::File::open(path).map_err(|e| {
        AppError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })
}

/// Read message rows (`id`, `message`, `genre`, optional `original`)
pub fn read_messages<R: Read>(reader: R) -> Result<Vec<MessageRecord>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = reader.headers()?.clone();

    let id_idx = require_column(&headers, "id", "messages")?;
    let message_idx = require_column(&headers, "message", "messages")?;
    let genre_idx = require_column(&headers, "genre", "messages")?;
    let original_idx = column_index(&headers, "original");

    let mut messages = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let id = parse_id(&record, id_idx, "messages", line)?;
        let original = original_idx
            .and_then(|idx| record.get(idx))
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        messages.push(MessageRecord {
            id,
            message: field(&record, message_idx).to_string(),
            original,
            genre: field(&record, genre_idx).to_string(),
        });
    }

    ROWS_LOADED_TOTAL
        .with_label_values(&["messages"])
        .inc_by(messages.len() as f64);

    Ok(messages)
}

/// Read category rows (`id`, `categories`)
pub fn read_categories<R: Read>(reader: R) -> Result<Vec<CategoryAssignment>> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = reader.headers()?.clone();

    let id_idx = require_column(&headers, "id", "categories")?;
    let categories_idx = require_column(&headers, "categories", "categories")?;

    let mut assignments = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        assignments.push(CategoryAssignment {
            id: parse_id(&record, id_idx, "categories", line)?,
            categories: field(&record, categories_idx).to_string(),
        });
    }

    ROWS_LOADED_TOTAL
        .with_label_values(&["categories"])
        .inc_by(assignments.len() as f64);

    Ok(assignments)
}

/// Left join of messages with category assignments.
///
/// A message matching several assignments is emitted once per match, in
/// the order the assignments were read; a message matching none is emitted
/// once without categories. Output order follows the messages.
pub fn join_on_id(
    messages: Vec<MessageRecord>,
    categories: Vec<CategoryAssignment>,
) -> Vec<JoinedRecord> {
    let mut by_id: HashMap<i64, Vec<String>> = HashMap::new();
    for assignment in categories {
        by_id
            .entry(assignment.id)
            .or_default()
            .push(assignment.categories);
    }

    let mut joined = Vec::with_capacity(messages.len());
    for message in messages {
        match by_id.get(&message.id) {
            Some(packed) => {
                for categories in packed {
                    joined.push(JoinedRecord::new(message.clone(), Some(categories.clone())));
                }
            }
            None => joined.push(JoinedRecord::new(message, None)),
        }
    }

    joined
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn require_column(headers: &StringRecord, name: &str, source: &str) -> Result<usize> {
    column_index(headers, name)
        .ok_or_else(|| AppError::Data(format!("{} input is missing the '{}' column", source, name)))
}

fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or_default()
}

fn parse_id(record: &StringRecord, idx: usize, source: &str, line: usize) -> Result<i64> {
    let raw = field(record, idx).trim();
    raw.parse::<i64>().map_err(|_| {
        AppError::Data(format!(
            "{} row {}: identifier '{}' is not an integer",
            source,
            line + 1,
            raw
        ))
    })
}
