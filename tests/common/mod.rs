//! Shared fixtures for the integration tests
//!
//! Builds message and category CSV files shaped like the disaster response
//! dataset: 36 packed categories, one of which (`child_alone`) never fires.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const CATEGORY_NAMES: [&str; 36] = [
    "related",
    "request",
    "offer",
    "aid_related",
    "medical_help",
    "medical_products",
    "search_and_rescue",
    "security",
    "military",
    "child_alone",
    "water",
    "food",
    "shelter",
    "clothing",
    "money",
    "missing_people",
    "refugees",
    "death",
    "other_aid",
    "infrastructure_related",
    "transport",
    "buildings",
    "electricity",
    "tools",
    "hospitals",
    "shops",
    "aid_centers",
    "other_infrastructure",
    "weather_related",
    "floods",
    "storm",
    "fire",
    "earthquake",
    "cold",
    "other_weather",
    "direct_report",
];

pub const ZERO_SUPPORT_CATEGORY: &str = "child_alone";

/// Number of distinct message ids written by [`write_fixture`]
pub const FIXTURE_IDS: usize = 70;

const GENRES: [&str; 3] = ["direct", "news", "social"];

/// Categories that receive positives (everything but `related` and the
/// zero-support column)
fn topical_categories() -> Vec<&'static str> {
    CATEGORY_NAMES
        .iter()
        .copied()
        .filter(|c| *c != "related" && *c != ZERO_SUPPORT_CATEGORY)
        .collect()
}

/// Label vector for fixture row `r`, in `CATEGORY_NAMES` order
fn labels_for(r: usize) -> Vec<u8> {
    let topical = topical_categories();
    let mut labels = vec![0u8; CATEGORY_NAMES.len()];
    if r % 10 == 9 {
        return labels;
    }

    labels[0] = 1;
    let topic = topical[r % topical.len()];
    let idx = CATEGORY_NAMES
        .iter()
        .position(|c| *c == topic)
        .unwrap();
    labels[idx] = 1;
    labels
}

fn message_for(r: usize) -> String {
    if r % 10 == 9 {
        return format!("Nothing to report, weather is calm, check {}", r % 3);
    }
    let topical = topical_categories();
    let topic = topical[r % topical.len()].replace('_', " ");
    format!("Urgent: we need {} help, please send {} now, area {}", topic, topic, r % 4)
}

fn packed_for(r: usize) -> String {
    labels_for(r)
        .iter()
        .zip(CATEGORY_NAMES.iter())
        .map(|(value, name)| {
            // Reference data encodes some related rows as 2
            let value = if *name == "related" && *value == 1 && r == 1 {
                2
            } else {
                *value
            };
            format!("{}-{}", name, value)
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Write `messages.csv` and `categories.csv` into `dir`.
///
/// Both files repeat one record so the cleaner has duplicates to remove.
pub fn write_fixture(dir: &Path) -> (PathBuf, PathBuf) {
    let messages_path = dir.join("messages.csv");
    let categories_path = dir.join("categories.csv");

    let mut messages = csv::Writer::from_path(&messages_path).unwrap();
    messages
        .write_record(["id", "message", "original", "genre"])
        .unwrap();
    let mut categories = csv::Writer::from_path(&categories_path).unwrap();
    categories.write_record(["id", "categories"]).unwrap();

    for r in 0..FIXTURE_IDS {
        let id = (r + 2).to_string();
        let original = if r % 3 == 0 {
            format!("Nou bezwen ed {}", r)
        } else {
            String::new()
        };
        messages
            .write_record([
                id.as_str(),
                message_for(r).as_str(),
                original.as_str(),
                GENRES[r % GENRES.len()],
            ])
            .unwrap();
        categories
            .write_record([id.as_str(), packed_for(r).as_str()])
            .unwrap();
    }

    // Exact duplicates
    messages
        .write_record(["2", message_for(0).as_str(), "Nou bezwen ed 0", "direct"])
        .unwrap();
    categories
        .write_record(["3", packed_for(1).as_str()])
        .unwrap();

    messages.flush().unwrap();
    categories.flush().unwrap();
    (messages_path, categories_path)
}

/// Data rows written to the messages file
pub fn fixture_message_rows() -> usize {
    FIXTURE_IDS + 1
}
