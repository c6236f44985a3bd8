use crate::error::{AppError, Result};
use crate::ml::models::FeatureConfig;
use lazy_static::lazy_static;
use ndarray::Array2;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Token substituted for every URL in a message
pub const URL_PLACEHOLDER: &str = "urlplaceholder";

const STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
    "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will",
    "just", "don", "should", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren",
    "couldn", "didn", "doesn", "hadn", "hasn", "haven", "isn", "ma", "mightn", "mustn",
    "needn", "shan", "shouldn", "wasn", "weren", "won", "wouldn",
];

lazy_static! {
    static ref URL_PATTERN: Regex =
        Regex::new(r"(?i)\b(?:https?://|www\.)\S+").expect("URL pattern is valid");
    static ref STOPWORD_SET: HashSet<&'static str> = STOPWORDS.iter().copied().collect();
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Text normalization and tokenization
pub struct TextPreprocessor;

impl TextPreprocessor {
    /// Lower-case the text and replace URLs with a placeholder token
    pub fn normalize(text: &str) -> String {
        let lowered = text.to_lowercase();
        URL_PATTERN
            .replace_all(&lowered, format!(" {} ", URL_PLACEHOLDER).as_str())
            .trim()
            .to_string()
    }

    /// Normalize, strip punctuation, drop stopwords and stem
    pub fn tokenize(text: &str) -> Vec<String> {
        Self::normalize(text)
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 1 && !Self::is_stopword(w))
            .map(|w| STEMMER.stem(w).into_owned())
            .collect()
    }

    pub fn is_stopword(word: &str) -> bool {
        STOPWORD_SET.contains(word)
    }
}

/// Bag-of-n-grams vectorizer with optional TF-IDF weighting.
///
/// Rows of the produced matrix are L2-normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// Configuration
    config: FeatureConfig,

    /// Vocabulary mapping (term -> column)
    vocabulary: HashMap<String, usize>,

    /// Inverse document frequency, by column
    idf: Vec<f64>,

    /// Is fitted (vocabulary built)
    is_fitted: bool,
}

impl TfidfVectorizer {
    /// Create a new vectorizer
    pub fn new(config: FeatureConfig) -> Self {
        Self {
            config,
            vocabulary: HashMap::new(),
            idf: Vec::new(),
            is_fitted: false,
        }
    }

    /// Build the vocabulary and IDF weights from training documents
    pub fn fit(&mut self, documents: &[&str]) -> Result<()> {
        let (min_n, max_n) = self.config.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(AppError::Argument(format!(
                "invalid n-gram range ({}, {})",
                min_n, max_n
            )));
        }

        let mut doc_freq: HashMap<String, usize> = HashMap::new();
        for doc in documents {
            let unique: HashSet<String> = self.extract_terms(doc).into_iter().collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        // Filter vocabulary by document frequency
        let min_df = self.config.min_doc_freq.max(1);
        let mut vocab_list: Vec<(String, usize)> = doc_freq
            .into_iter()
            .filter(|(_, freq)| *freq >= min_df)
            .collect();

        // Most frequent first, ties alphabetical
        vocab_list.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        vocab_list.truncate(self.config.max_vocab_size);

        if vocab_list.is_empty() {
            return Err(AppError::Model(
                "empty vocabulary; documents contain no usable terms".to_string(),
            ));
        }

        let n_docs = documents.len() as f64;
        self.idf = vocab_list
            .iter()
            .map(|(_, df)| ((1.0 + n_docs) / (1.0 + *df as f64)).ln() + 1.0)
            .collect();
        self.vocabulary = vocab_list
            .into_iter()
            .enumerate()
            .map(|(idx, (term, _))| (term, idx))
            .collect();
        self.is_fitted = true;

        tracing::debug!(
            documents = documents.len(),
            vocabulary = self.vocabulary.len(),
            "Fitted vectorizer"
        );

        Ok(())
    }

    /// Transform documents into a (documents × vocabulary) matrix
    pub fn transform(&self, documents: &[&str]) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(AppError::Model(
                "TfidfVectorizer must be fitted before transform".to_string(),
            ));
        }

        let mut features = Array2::zeros((documents.len(), self.vocabulary.len()));
        for (row, doc) in documents.iter().enumerate() {
            let terms = self.extract_terms(doc);
            for (term, count) in count_terms(&terms) {
                if let Some(&col) = self.vocabulary.get(term) {
                    let tf = count as f64;
                    features[[row, col]] = if self.config.use_tfidf {
                        tf * self.idf[col]
                    } else {
                        tf
                    };
                }
            }

            let mut row_view = features.row_mut(row);
            let norm = row_view.dot(&row_view).sqrt();
            if norm > 0.0 {
                row_view.mapv_inplace(|v| v / norm);
            }
        }

        Ok(features)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, documents: &[&str]) -> Result<Array2<f64>> {
        self.fit(documents)?;
        self.transform(documents)
    }

    /// Tokenize a document and expand it into n-grams
    fn extract_terms(&self, document: &str) -> Vec<String> {
        let words = TextPreprocessor::tokenize(document);
        let (min_n, max_n) = self.config.ngram_range;

        let mut terms = Vec::new();
        for n in min_n..=max_n {
            for window in words.windows(n) {
                terms.push(window.join("_"));
            }
        }
        terms
    }

    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    pub fn vocab_size(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.vocabulary.contains_key(term)
    }

    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }
}

fn count_terms(terms: &[String]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for term in terms {
        *counts.entry(term.as_str()).or_insert(0) += 1;
    }
    counts
}
