//! Message classification.
//!
//! Messages are tokenized and stemmed, weighted with TF-IDF and fed to one
//! logistic regression per category. A fitted [`Pipeline`] is saved with
//! bincode and loaded read-only by the server.

pub mod classifier;
pub mod evaluation;
pub mod features;
pub mod models;
pub mod pipeline;
pub mod split;
pub mod trainer;

pub use classifier::{BinaryModel, Classifier, LogisticRegressionClassifier, MultiOutputClassifier};
pub use evaluation::evaluate;
pub use features::{TextPreprocessor, TfidfVectorizer};
pub use models::{
    CategoryPrediction, ClassMetrics, FeatureConfig, LabelPrediction, ModelMetadata, ModelMetrics,
    ModelType,
};
pub use pipeline::{Pipeline, FORMAT_VERSION};
pub use split::{train_test_split, TrainTestSplit};
pub use trainer::{fit_and_evaluate, train_model, TrainingOutcome};
