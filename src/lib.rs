//! Disaster message pipeline.
//!
//! Raw messages and their packed category labels are loaded from CSV, cleaned
//! into one binary column per category and persisted to SQLite. A TF-IDF +
//! logistic regression pipeline is trained from that table and served over
//! HTTP.

pub mod analytics;
pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod ml;
pub mod models;
pub mod processing;
pub mod state;
pub mod telemetry;

pub use error::{AppError, Result};
