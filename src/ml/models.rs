use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Text vectorization configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Maximum vocabulary size for text features
    #[serde(default = "default_max_vocab_size")]
    pub max_vocab_size: usize,

    /// Minimum document frequency for terms
    #[serde(default = "default_min_doc_freq")]
    pub min_doc_freq: usize,

    /// Use TF-IDF weighting (raw term counts otherwise)
    #[serde(default = "default_true")]
    pub use_tfidf: bool,

    /// N-gram range (min, max)
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            max_vocab_size: default_max_vocab_size(),
            min_doc_freq: default_min_doc_freq(),
            use_tfidf: true,
            ngram_range: default_ngram_range(),
        }
    }
}

fn default_max_vocab_size() -> usize {
    2000
}

fn default_min_doc_freq() -> usize {
    2
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_true() -> bool {
    true
}

/// Model type of the per-category estimators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelType {
    LogisticRegression,
}

/// Descriptive data stored alongside a fitted pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub name: String,
    pub version: String,
    pub format_version: u32,
    pub model_type: ModelType,
    pub trained_at: DateTime<Utc>,
    pub n_training_samples: usize,
    pub n_features: usize,
    pub category_names: Vec<String>,
    pub hyperparameters: BTreeMap<String, String>,

    /// Held-out metrics, when the pipeline was evaluated
    pub validation_metrics: Option<ModelMetrics>,
}

/// Binary metrics for one category (positive class)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub accuracy: f64,

    /// Number of positive rows in the evaluated partition
    pub support: usize,
}

/// Per-category and macro-averaged evaluation results
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub n_samples: usize,
    pub per_category: Vec<(String, ClassMetrics)>,
    pub macro_precision: f64,
    pub macro_recall: f64,
    pub macro_f1: f64,
    pub mean_accuracy: f64,
}

impl ModelMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metrics for one category, by name
    pub fn category(&self, name: &str) -> Option<&ClassMetrics> {
        self.per_category
            .iter()
            .find(|(category, _)| category == name)
            .map(|(_, metrics)| metrics)
    }

    /// Plain-text table with one line per category
    pub fn report(&self) -> String {
        let width = self
            .per_category
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max("macro avg".len());

        let mut out = format!(
            "{:>width$}  {:>9}  {:>9}  {:>9}  {:>9}  {:>9}\n\n",
            "",
            "precision",
            "recall",
            "f1-score",
            "accuracy",
            "support",
            width = width
        );
        for (name, m) in &self.per_category {
            out.push_str(&format!(
                "{:>width$}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9}\n",
                name,
                m.precision,
                m.recall,
                m.f1_score,
                m.accuracy,
                m.support,
                width = width
            ));
        }
        out.push('\n');
        out.push_str(&format!(
            "{:>width$}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9.2}  {:>9}\n",
            "macro avg",
            self.macro_precision,
            self.macro_recall,
            self.macro_f1,
            self.mean_accuracy,
            self.n_samples,
            width = width
        ));
        out
    }
}

/// One category decision for a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelPrediction {
    pub category: String,
    pub value: u8,
}

/// All category decisions for a message, in training column order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPrediction {
    pub message: String,
    pub labels: Vec<LabelPrediction>,

    /// Names of the categories predicted positive
    pub positive: Vec<String>,
}

impl CategoryPrediction {
    pub fn new(message: String, category_names: &[String], values: &[u8]) -> Self {
        let labels: Vec<LabelPrediction> = category_names
            .iter()
            .zip(values.iter())
            .map(|(category, &value)| LabelPrediction {
                category: category.clone(),
                value,
            })
            .collect();
        let positive = labels
            .iter()
            .filter(|l| l.value == 1)
            .map(|l| l.category.clone())
            .collect();

        Self {
            message,
            labels,
            positive,
        }
    }
}
