use crate::config::TrainingConfig;
use crate::error::{AppError, Result};
use crate::metrics::{TRAINING_DURATION_SECONDS, TRAINING_RUNS_TOTAL};
use crate::ml::evaluation::evaluate;
use crate::ml::models::ModelMetrics;
use crate::ml::pipeline::Pipeline;
use crate::ml::split::train_test_split;
use crate::models::CleanedTable;
use crate::state::DatasetStore;
use ndarray::Array2;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Summary of a training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingOutcome {
    pub rows: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub categories: Vec<String>,
    pub metrics: ModelMetrics,
    pub model_path: Option<PathBuf>,
}

/// Read the table, fit on the training partition, score the test partition
/// and write the pipeline to `model_path`
pub fn train_model(
    store: &dyn DatasetStore,
    table_name: &str,
    model_path: impl AsRef<Path>,
    config: &TrainingConfig,
) -> Result<TrainingOutcome> {
    let timer = TRAINING_DURATION_SECONDS.start_timer();
    let result = run(store, table_name, model_path.as_ref(), config);
    timer.observe_duration();

    let status = if result.is_ok() { "success" } else { "failure" };
    TRAINING_RUNS_TOTAL.with_label_values(&[status]).inc();
    result
}

fn run(
    store: &dyn DatasetStore,
    table_name: &str,
    model_path: &Path,
    config: &TrainingConfig,
) -> Result<TrainingOutcome> {
    info!(table = table_name, "Loading data");
    let table = store.load_table(table_name)?;

    info!("Building model");
    let (pipeline, mut outcome) = fit_and_evaluate(&table, config)?;

    info!(path = %model_path.display(), "Saving model");
    pipeline.save(model_path)?;
    outcome.model_path = Some(model_path.to_path_buf());

    Ok(outcome)
}

/// Split, fit and evaluate without touching the filesystem
pub fn fit_and_evaluate(
    table: &CleanedTable,
    config: &TrainingConfig,
) -> Result<(Pipeline, TrainingOutcome)> {
    if table.is_empty() {
        return Err(AppError::Data("cannot train on an empty table".to_string()));
    }

    let ids: Vec<i64> = table.rows().iter().map(|r| r.id).collect();
    let split = train_test_split(&ids, config.test_size, config.seed)?;
    info!(
        train = split.train_len(),
        test = split.test_len(),
        seed = config.seed,
        "Split dataset"
    );

    let (train_docs, train_targets) = partition(table, &split.train);
    let (test_docs, test_targets) = partition(table, &split.test);

    info!("Training model");
    let mut pipeline = Pipeline::new(config.features.clone(), config.alpha);
    pipeline.fit(&train_docs, &train_targets, table.category_names())?;

    info!("Evaluating model");
    let predictions = pipeline.predict_matrix(&test_docs)?;
    let metrics = evaluate(table.category_names(), &test_targets, &predictions)?;

    let degenerate: Vec<&str> = metrics
        .per_category
        .iter()
        .filter(|(_, m)| m.support == 0)
        .map(|(name, _)| name.as_str())
        .collect();
    if !degenerate.is_empty() {
        warn!(
            categories = ?degenerate,
            "Categories without positives in the test partition score 0.0"
        );
    }
    info!(
        macro_f1 = metrics.macro_f1,
        mean_accuracy = metrics.mean_accuracy,
        "Evaluated model"
    );

    pipeline.set_validation_metrics(metrics.clone());

    let outcome = TrainingOutcome {
        rows: table.len(),
        train_rows: split.train_len(),
        test_rows: split.test_len(),
        categories: table.category_names().to_vec(),
        metrics,
        model_path: None,
    };

    Ok((pipeline, outcome))
}

fn partition<'a>(table: &'a CleanedTable, positions: &[usize]) -> (Vec<&'a str>, Array2<u8>) {
    let rows = table.rows();
    let mut targets = Array2::zeros((positions.len(), table.category_count()));
    let mut documents = Vec::with_capacity(positions.len());

    for (out, &pos) in positions.iter().enumerate() {
        let row = &rows[pos];
        documents.push(row.message.as_str());
        for (col, &label) in row.labels.iter().enumerate() {
            targets[[out, col]] = label;
        }
    }

    (documents, targets)
}
