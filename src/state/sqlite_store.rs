use crate::error::{AppError, Result};
use crate::metrics::ROWS_PERSISTED_TOTAL;
use crate::models::{CleanedRecord, CleanedTable, MESSAGE_COLUMNS};
use crate::state::DatasetStore;
use rusqlite::{params, types::ToSql, Connection, OpenFlags, OptionalExtension};
use std::path::Path;
use tracing::{debug, info};

/// SQLite-backed dataset store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "Opened SQLite database");

        Ok(Self { conn })
    }

    /// Open an existing database without creating it. Writes fail.
    pub fn open_read_only(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(AppError::NotFound(format!(
                "database {} does not exist",
                path.display()
            )));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        debug!(path = %path.display(), "Opened SQLite database read-only");

        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    fn create_table_sql(name: &str, table: &CleanedTable) -> String {
        let mut columns = vec![
            format!("{} INTEGER NOT NULL", quote_identifier("id")),
            format!("{} TEXT NOT NULL", quote_identifier("message")),
            format!("{} TEXT", quote_identifier("original")),
            format!("{} TEXT NOT NULL", quote_identifier("genre")),
        ];
        columns.extend(
            table
                .category_names()
                .iter()
                .map(|c| format!("{} INTEGER NOT NULL", quote_identifier(c))),
        );

        format!(
            "CREATE TABLE {} ({})",
            quote_identifier(name),
            columns.join(", ")
        )
    }

    fn insert_sql(name: &str, table: &CleanedTable) -> String {
        let columns: Vec<String> = table
            .column_names()
            .iter()
            .map(|c| quote_identifier(c))
            .collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_identifier(name),
            columns.join(", "),
            placeholders.join(", ")
        )
    }
}

impl DatasetStore for SqliteStore {
    fn save_table(&mut self, name: &str, table: &CleanedTable) -> Result<()> {
        validate_table_name(name)?;

        // One transaction: a failed write leaves the previous table in place.
        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_identifier(name)))?;
        tx.execute_batch(&Self::create_table_sql(name, table))?;
        {
            let mut stmt = tx.prepare(&Self::insert_sql(name, table))?;
            for row in table.rows() {
                let mut values: Vec<&dyn ToSql> = vec![
                    &row.id as &dyn ToSql,
                    &row.message as &dyn ToSql,
                    &row.original as &dyn ToSql,
                    &row.genre as &dyn ToSql,
                ];
                values.extend(row.labels.iter().map(|l| l as &dyn ToSql));
                stmt.execute(values.as_slice())?;
            }
        }
        tx.commit()?;

        ROWS_PERSISTED_TOTAL.inc_by(table.len() as f64);
        info!(
            table = name,
            rows = table.len(),
            categories = table.category_count(),
            "Saved dataset table"
        );

        Ok(())
    }

    fn load_table(&self, name: &str) -> Result<CleanedTable> {
        validate_table_name(name)?;
        if !self.table_exists(name)? {
            return Err(AppError::NotFound(format!("table '{}' does not exist", name)));
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT * FROM {} ORDER BY rowid",
            quote_identifier(name)
        ))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        if columns.len() < MESSAGE_COLUMNS.len()
            || columns[..MESSAGE_COLUMNS.len()]
                .iter()
                .zip(MESSAGE_COLUMNS.iter())
                .any(|(actual, expected)| actual != expected)
        {
            return Err(AppError::Data(format!(
                "table '{}' does not start with the columns {:?}",
                name, MESSAGE_COLUMNS
            )));
        }
        let category_names = columns[MESSAGE_COLUMNS.len()..].to_vec();

        let mut records = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            let mut labels = Vec::with_capacity(category_names.len());
            for (offset, category) in category_names.iter().enumerate() {
                let value: i64 = row.get(MESSAGE_COLUMNS.len() + offset)?;
                let value = u8::try_from(value)
                    .ok()
                    .filter(|v| *v <= 1)
                    .ok_or_else(|| {
                        AppError::Data(format!(
                            "row {} has non-binary value {} in category '{}'",
                            id, value, category
                        ))
                    })?;
                labels.push(value);
            }

            records.push(CleanedRecord {
                id,
                message: row.get(1)?,
                original: row.get(2)?,
                genre: row.get(3)?,
                labels,
            });
        }

        debug!(table = name, rows = records.len(), "Loaded dataset table");
        CleanedTable::new(category_names, records)
    }

    fn table_exists(&self, name: &str) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

fn validate_table_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Argument("table name must not be empty".to_string()));
    }
    Ok(())
}

/// Quote an SQL identifier, doubling embedded quotes
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> CleanedTable {
        CleanedTable::new(
            vec!["related".to_string(), "water".to_string(), "fire".to_string()],
            vec![
                CleanedRecord {
                    id: 2,
                    message: "Weather update - a cold front from Cuba".to_string(),
                    original: Some("Un front froid se retrouve sur Cuba".to_string()),
                    genre: "direct".to_string(),
                    labels: vec![1, 0, 0],
                },
                CleanedRecord {
                    id: 12,
                    message: "says: west side of Haiti, rest of the country today".to_string(),
                    original: None,
                    genre: "direct".to_string(),
                    labels: vec![1, 1, 1],
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("DisasterResponse.db");

        let table = sample_table();
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.save_table("messages", &table).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert!(store.table_exists("messages").unwrap());
        assert_eq!(store.load_table("messages").unwrap(), table);
    }

    #[test]
    fn test_read_only_open_of_missing_file_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typo").join("DisasterResponse.db");

        let err = SqliteStore::open_read_only(&path).err().unwrap();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(!path.exists());
        assert!(!path.parent().unwrap().exists());
    }

    #[test]
    fn test_read_only_open_loads_but_refuses_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("DisasterResponse.db");
        SqliteStore::open(&path)
            .unwrap()
            .save_table("messages", &sample_table())
            .unwrap();

        let mut store = SqliteStore::open_read_only(&path).unwrap();
        assert_eq!(store.load_table("messages").unwrap(), sample_table());
        let err = store.save_table("messages", &sample_table()).unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }

    #[test]
    fn test_save_replaces_existing_table() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.save_table("messages", &sample_table()).unwrap();

        let smaller = CleanedTable::new(
            vec!["storm".to_string()],
            vec![CleanedRecord {
                id: 99,
                message: "storm".to_string(),
                original: None,
                genre: "news".to_string(),
                labels: vec![1],
            }],
        )
        .unwrap();
        store.save_table("messages", &smaller).unwrap();

        assert_eq!(store.load_table("messages").unwrap(), smaller);
    }

    #[test]
    fn test_load_missing_table_is_not_found() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store.load_table("absent").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_load_rejects_non_binary_values() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.save_table("messages", &sample_table()).unwrap();
        store
            .conn
            .execute("UPDATE \"messages\" SET \"water\" = 2 WHERE \"id\" = 2", [])
            .unwrap();

        let err = store.load_table("messages").unwrap_err();
        assert!(matches!(err, AppError::Data(_)));
    }

    #[test]
    fn test_round_trip_keeps_insertion_order() {
        let labels = [1u8, 0, 1];
        let rows: Vec<CleanedRecord> = [3i64, 1, 2]
            .iter()
            .zip(labels.iter())
            .map(|(&id, &label)| CleanedRecord {
                id,
                message: format!("message {}", id),
                original: None,
                genre: "direct".to_string(),
                labels: vec![label],
            })
            .collect();
        let table = CleanedTable::new(vec!["offer".to_string()], rows).unwrap();

        let mut store = SqliteStore::open_in_memory().unwrap();
        store.save_table("messages", &table).unwrap();
        let ids: Vec<i64> = store
            .load_table("messages")
            .unwrap()
            .rows()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![3, 1, 2]);

        assert!(CleanedTable::new(vec!["rowid".to_string()], Vec::new()).is_err());
    }

    #[test]
    fn test_quoted_table_names() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.save_table("odd \"name\"", &sample_table()).unwrap();
        assert_eq!(store.load_table("odd \"name\"").unwrap().len(), 2);
        assert!(store.save_table("  ", &sample_table()).is_err());
    }
}
