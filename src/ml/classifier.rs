use crate::error::{AppError, Result};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::arrays::Array as _;
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::logistic_regression::{LogisticRegression, LogisticRegressionParameters};
use tracing::debug;

/// Trait for binary classifiers (one output column)
pub trait Classifier: Send + Sync {
    /// Train on features and a 0/1 target column
    fn fit(&mut self, features: &DenseMatrix<f64>, targets: &[u8]) -> Result<()>;

    /// Predict 0/1 for every row
    fn predict(&self, features: &DenseMatrix<f64>) -> Result<Vec<u8>>;

    /// Check if model is trained
    fn is_trained(&self) -> bool;
}

/// A fitted model for one category
#[derive(Serialize, Deserialize)]
pub enum BinaryModel {
    /// The training column held a single class
    Constant(u8),
    Logistic(LogisticRegression<f64, i32, DenseMatrix<f64>, Vec<i32>>),
}

/// Logistic Regression Classifier
#[derive(Serialize, Deserialize)]
pub struct LogisticRegressionClassifier {
    /// L2 regularization strength
    alpha: f64,

    /// Trained model
    model: Option<BinaryModel>,
}

impl LogisticRegressionClassifier {
    pub fn new(alpha: f64) -> Self {
        Self { alpha, model: None }
    }

    /// Whether training fell back to a constant prediction
    pub fn is_constant(&self) -> bool {
        matches!(self.model, Some(BinaryModel::Constant(_)))
    }
}

impl Classifier for LogisticRegressionClassifier {
    fn fit(&mut self, features: &DenseMatrix<f64>, targets: &[u8]) -> Result<()> {
        let first = targets
            .first()
            .copied()
            .ok_or_else(|| AppError::Model("cannot train on zero rows".to_string()))?;

        if targets.iter().all(|&t| t == first) {
            self.model = Some(BinaryModel::Constant(first));
            return Ok(());
        }

        let y: Vec<i32> = targets.iter().map(|&t| t as i32).collect();
        let params = LogisticRegressionParameters::default().with_alpha(self.alpha);
        let model = LogisticRegression::fit(features, &y, params).map_err(|e| {
            AppError::Model(format!("Failed to train logistic regression: {}", e))
        })?;

        self.model = Some(BinaryModel::Logistic(model));
        Ok(())
    }

    fn predict(&self, features: &DenseMatrix<f64>) -> Result<Vec<u8>> {
        match &self.model {
            None => Err(AppError::Model("Model not trained".to_string())),
            Some(BinaryModel::Constant(value)) => {
                let (rows, _) = features.shape();
                Ok(vec![*value; rows])
            }
            Some(BinaryModel::Logistic(model)) => {
                let predictions = model
                    .predict(features)
                    .map_err(|e| AppError::Model(format!("Prediction failed: {}", e)))?;
                Ok(predictions.iter().map(|&p| u8::from(p > 0)).collect())
            }
        }
    }

    fn is_trained(&self) -> bool {
        self.model.is_some()
    }
}

/// One independent binary classifier per output column
#[derive(Serialize, Deserialize)]
pub struct MultiOutputClassifier {
    estimators: Vec<LogisticRegressionClassifier>,
    alpha: f64,
    trained: bool,
}

impl MultiOutputClassifier {
    pub fn new(alpha: f64) -> Self {
        Self {
            estimators: Vec::new(),
            alpha,
            trained: false,
        }
    }

    /// Fit one estimator per column of `targets`, consuming the feature matrix
    pub fn fit(&mut self, features: Array2<f64>, targets: &Array2<u8>) -> Result<()> {
        if features.nrows() != targets.nrows() {
            return Err(AppError::Model(format!(
                "feature rows ({}) and target rows ({}) differ",
                features.nrows(),
                targets.nrows()
            )));
        }
        if targets.ncols() == 0 {
            return Err(AppError::Model("no target columns to train".to_string()));
        }

        // Shared by every estimator
        let x = into_densematrix(features);

        let mut estimators = Vec::with_capacity(targets.ncols());
        for (column, target) in targets.columns().into_iter().enumerate() {
            let y = column_to_vec(target);
            let mut estimator = LogisticRegressionClassifier::new(self.alpha);
            estimator.fit(&x, &y)?;
            if estimator.is_constant() {
                debug!(column, "Single-class target column; using constant prediction");
            }
            estimators.push(estimator);
        }

        self.estimators = estimators;
        self.trained = true;
        Ok(())
    }

    /// Predict a (rows × outputs) 0/1 matrix
    pub fn predict(&self, features: Array2<f64>) -> Result<Array2<u8>> {
        if !self.trained {
            return Err(AppError::Model("Model not trained".to_string()));
        }

        let rows = features.nrows();
        let x = into_densematrix(features);
        let mut predictions = Array2::zeros((rows, self.estimators.len()));
        for (column, estimator) in self.estimators.iter().enumerate() {
            for (row, value) in estimator.predict(&x)?.into_iter().enumerate() {
                predictions[[row, column]] = value;
            }
        }

        Ok(predictions)
    }

    pub fn n_outputs(&self) -> usize {
        self.estimators.len()
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    /// Number of outputs that fell back to a constant prediction
    pub fn constant_outputs(&self) -> usize {
        self.estimators.iter().filter(|e| e.is_constant()).count()
    }
}

/// Hand the row-major buffer to smartcore without copying it
fn into_densematrix(arr: Array2<f64>) -> DenseMatrix<f64> {
    let arr = if arr.is_standard_layout() {
        arr
    } else {
        arr.as_standard_layout().into_owned()
    };
    let (rows, cols) = arr.dim();
    DenseMatrix::new(rows, cols, arr.into_raw_vec(), false)
}

fn column_to_vec(column: ArrayView1<'_, u8>) -> Vec<u8> {
    column.iter().copied().collect()
}
