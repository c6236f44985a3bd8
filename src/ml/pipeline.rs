use crate::error::{AppError, Result};
use crate::ml::classifier::MultiOutputClassifier;
use crate::ml::features::TfidfVectorizer;
use crate::ml::models::{CategoryPrediction, FeatureConfig, ModelMetadata, ModelMetrics, ModelType};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Bumped whenever the serialized layout changes
pub const FORMAT_VERSION: u32 = 1;

/// Text vectorizer plus one classifier per category
#[derive(Serialize, Deserialize)]
pub struct Pipeline {
    metadata: ModelMetadata,
    vectorizer: TfidfVectorizer,
    classifier: MultiOutputClassifier,
}

impl Pipeline {
    pub fn new(features: FeatureConfig, alpha: f64) -> Self {
        let mut hyperparameters = BTreeMap::new();
        hyperparameters.insert("alpha".to_string(), alpha.to_string());
        hyperparameters.insert("max_vocab_size".to_string(), features.max_vocab_size.to_string());
        hyperparameters.insert("min_doc_freq".to_string(), features.min_doc_freq.to_string());
        hyperparameters.insert(
            "ngram_range".to_string(),
            format!("{},{}", features.ngram_range.0, features.ngram_range.1),
        );
        hyperparameters.insert("use_tfidf".to_string(), features.use_tfidf.to_string());

        Self {
            metadata: ModelMetadata {
                name: "disaster-response-classifier".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                format_version: FORMAT_VERSION,
                model_type: ModelType::LogisticRegression,
                trained_at: chrono::Utc::now(),
                n_training_samples: 0,
                n_features: 0,
                category_names: Vec::new(),
                hyperparameters,
                validation_metrics: None,
            },
            vectorizer: TfidfVectorizer::new(features),
            classifier: MultiOutputClassifier::new(alpha),
        }
    }

    /// Fit the vectorizer and every category classifier.
    ///
    /// `targets` holds one column per entry of `category_names`.
    pub fn fit(
        &mut self,
        documents: &[&str],
        targets: &Array2<u8>,
        category_names: &[String],
    ) -> Result<()> {
        if documents.len() != targets.nrows() {
            return Err(AppError::Model(format!(
                "{} documents for {} target rows",
                documents.len(),
                targets.nrows()
            )));
        }
        if category_names.len() != targets.ncols() {
            return Err(AppError::Model(format!(
                "{} category names for {} target columns",
                category_names.len(),
                targets.ncols()
            )));
        }

        let features = self.vectorizer.fit_transform(documents)?;
        self.classifier.fit(features, targets)?;

        self.metadata.trained_at = chrono::Utc::now();
        self.metadata.n_training_samples = documents.len();
        self.metadata.n_features = self.vectorizer.n_features();
        self.metadata.category_names = category_names.to_vec();

        info!(
            samples = documents.len(),
            features = self.metadata.n_features,
            categories = category_names.len(),
            constant_outputs = self.classifier.constant_outputs(),
            "Fitted pipeline"
        );

        Ok(())
    }

    /// Predict every category for each text, in training column order
    pub fn predict(&self, texts: &[&str]) -> Result<Vec<Vec<u8>>> {
        Ok(self
            .predict_matrix(texts)?
            .rows()
            .into_iter()
            .map(|row| row.to_vec())
            .collect())
    }

    pub fn predict_matrix(&self, texts: &[&str]) -> Result<Array2<u8>> {
        if !self.is_fitted() {
            return Err(AppError::Model("Pipeline is not fitted".to_string()));
        }

        let features = self.vectorizer.transform(texts)?;
        self.classifier.predict(features)
    }

    /// Classify one message and pair each decision with its category name
    pub fn classify(&self, text: &str) -> Result<CategoryPrediction> {
        let values = self
            .predict(&[text])?
            .into_iter()
            .next()
            .unwrap_or_default();

        Ok(CategoryPrediction::new(
            text.to_string(),
            &self.metadata.category_names,
            &values,
        ))
    }

    pub fn set_validation_metrics(&mut self, metrics: ModelMetrics) {
        self.metadata.validation_metrics = Some(metrics);
    }

    /// Write the pipeline with bincode, creating parent directories
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;

        info!(path = %path.display(), "Saved model");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            AppError::Io(std::io::Error::new(
                e.kind(),
                format!("cannot open model {}: {}", path.display(), e),
            ))
        })?;

        let pipeline: Pipeline = bincode::deserialize_from(BufReader::new(file))?;
        if pipeline.metadata.format_version != FORMAT_VERSION {
            return Err(AppError::Serialization(format!(
                "model {} has format version {}, expected {}",
                path.display(),
                pipeline.metadata.format_version,
                FORMAT_VERSION
            )));
        }

        info!(
            path = %path.display(),
            categories = pipeline.metadata.category_names.len(),
            "Loaded model"
        );
        Ok(pipeline)
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn category_names(&self) -> &[String] {
        &self.metadata.category_names
    }

    pub fn is_fitted(&self) -> bool {
        self.vectorizer.is_fitted() && self.classifier.is_trained()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn fitted() -> Pipeline {
        let documents = [
            "we need water please",
            "clean water needed urgently",
            "no drinking water here",
            "the building collapsed",
            "building damaged by the earthquake",
            "earthquake destroyed the building",
        ];
        let targets = array![[1, 1, 0], [1, 1, 0], [1, 1, 0], [1, 0, 0], [1, 0, 0], [1, 0, 0]];
        let names = vec!["related".to_string(), "water".to_string(), "fire".to_string()];

        let mut features = FeatureConfig::default();
        features.min_doc_freq = 1;
        let mut pipeline = Pipeline::new(features, 1.0);
        pipeline.fit(&documents, &targets, &names).unwrap();
        pipeline
    }

    #[test]
    fn test_unfitted_pipeline_cannot_predict() {
        let pipeline = Pipeline::new(FeatureConfig::default(), 1.0);
        assert!(!pipeline.is_fitted());
        assert!(matches!(
            pipeline.predict(&["water"]).unwrap_err(),
            AppError::Model(_)
        ));
    }

    #[test]
    fn test_predict_has_one_value_per_category() {
        let pipeline = fitted();
        let predictions = pipeline.predict(&["water", "building"]).unwrap();

        assert_eq!(predictions.len(), 2);
        assert!(predictions.iter().all(|row| row.len() == 3));
        assert!(predictions.iter().flatten().all(|&v| v <= 1));
    }

    #[test]
    fn test_classify_pairs_names_in_order() {
        let pipeline = fitted();
        let prediction = pipeline.classify("we need clean water").unwrap();

        let names: Vec<&str> = prediction.labels.iter().map(|l| l.category.as_str()).collect();
        assert_eq!(names, vec!["related", "water", "fire"]);
        assert!(prediction.positive.contains(&"related".to_string()));
        assert!(!prediction.positive.contains(&"fire".to_string()));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("classifier.bin");

        let pipeline = fitted();
        pipeline.save(&path).unwrap();
        let loaded = Pipeline::load(&path).unwrap();

        let texts = ["water please", "earthquake building", "nothing relevant"];
        assert_eq!(pipeline.predict(&texts).unwrap(), loaded.predict(&texts).unwrap());
        assert_eq!(loaded.category_names(), pipeline.category_names());
        assert_eq!(loaded.metadata().format_version, FORMAT_VERSION);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Pipeline::load(dir.path().join("absent.bin")).err().unwrap();
        assert!(matches!(err, AppError::Io(_)));
    }
}
