use disaster_response::{
    models::{CleanedRecord, CleanedTable},
    state::{DatasetStore, InMemoryStore, SqliteStore},
    AppError,
};
use tempfile::TempDir;

/// Helper to create a test row
fn create_test_record(id: i64, message: &str, labels: Vec<u8>) -> CleanedRecord {
    CleanedRecord {
        id,
        message: message.to_string(),
        original: if id % 2 == 0 {
            Some(format!("original {}", id))
        } else {
            None
        },
        genre: "direct".to_string(),
        labels,
    }
}

fn create_test_table() -> CleanedTable {
    CleanedTable::new(
        vec![
            "related".to_string(),
            "aid_related".to_string(),
            "weather_related".to_string(),
        ],
        vec![
            create_test_record(10, "Is the Hurricane over or is it not over", vec![1, 0, 1]),
            create_test_record(7, "Looking for someone but no name", vec![1, 1, 0]),
            create_test_record(3, "UN reports Leogane 80-90 destroyed", vec![1, 1, 0]),
            create_test_record(14, "Information about the National Palace-", vec![0, 0, 0]),
        ],
    )
    .unwrap()
}

/// Test suite that runs against any DatasetStore implementation
fn test_store_operations<S: DatasetStore>(mut store: S) {
    // Test 1: Missing table
    assert!(!store.table_exists("messages").unwrap());
    assert!(matches!(
        store.load_table("messages").unwrap_err(),
        AppError::NotFound(_)
    ));

    // Test 2: Save and load keeps rows and order
    let table = create_test_table();
    store.save_table("messages", &table).unwrap();
    assert!(store.table_exists("messages").unwrap());

    let loaded = store.load_table("messages").unwrap();
    assert_eq!(loaded, table);
    let ids: Vec<i64> = loaded.rows().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![10, 7, 3, 14]);

    // Test 3: Saving again replaces the table
    let replacement = CleanedTable::new(
        vec!["related".to_string()],
        vec![create_test_record(1, "help", vec![1])],
    )
    .unwrap();
    store.save_table("messages", &replacement).unwrap();
    assert_eq!(store.load_table("messages").unwrap(), replacement);

    // Test 4: Tables are independent
    store.save_table("other", &table).unwrap();
    assert_eq!(store.load_table("messages").unwrap().len(), 1);
    assert_eq!(store.load_table("other").unwrap().len(), 4);
}

#[test]
fn test_in_memory_store() {
    test_store_operations(InMemoryStore::new());
}

#[test]
fn test_sqlite_store() {
    let temp_dir = TempDir::new().unwrap();
    let store = SqliteStore::open(temp_dir.path().join("test.db")).unwrap();
    test_store_operations(store);
}

#[test]
fn test_sqlite_persistence_across_connections() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("persist.db");
    let table = create_test_table();

    {
        let mut store = SqliteStore::open(&db_path).unwrap();
        store.save_table("disaster_messages", &table).unwrap();
    }

    let store = SqliteStore::open_read_only(&db_path).unwrap();
    assert_eq!(store.load_table("disaster_messages").unwrap(), table);
}

#[test]
fn test_sqlite_schema_is_readable_by_plain_sql() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("schema.db");
    {
        let mut store = SqliteStore::open(&db_path).unwrap();
        store.save_table("disaster_messages", &create_test_table()).unwrap();
    }

    let conn = rusqlite::Connection::open(&db_path).unwrap();
    let mut stmt = conn
        .prepare("SELECT * FROM disaster_messages ORDER BY rowid")
        .unwrap();
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    assert_eq!(
        columns,
        vec!["id", "message", "original", "genre", "related", "aid_related", "weather_related"]
    );

    let positives: i64 = conn
        .query_row("SELECT SUM(related) FROM disaster_messages", [], |row| row.get(0))
        .unwrap();
    assert_eq!(positives, 3);
}
