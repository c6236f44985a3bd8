use crate::error::{AppError, Result};
use crate::ml::models::{ClassMetrics, ModelMetrics};
use ndarray::{Array2, ArrayView1};

/// Score predictions against ground truth, column by column.
///
/// Metrics are for the positive class. A ratio with a zero denominator is
/// 0.0, so categories with no positives in either matrix never fail.
pub fn evaluate(
    category_names: &[String],
    y_true: &Array2<u8>,
    y_pred: &Array2<u8>,
) -> Result<ModelMetrics> {
    if y_true.dim() != y_pred.dim() {
        return Err(AppError::Model(format!(
            "shape mismatch between truth {:?} and predictions {:?}",
            y_true.dim(),
            y_pred.dim()
        )));
    }
    if category_names.len() != y_true.ncols() {
        return Err(AppError::Model(format!(
            "{} category names for {} columns",
            category_names.len(),
            y_true.ncols()
        )));
    }

    let per_category: Vec<(String, ClassMetrics)> = category_names
        .iter()
        .zip(y_true.columns().into_iter().zip(y_pred.columns()))
        .map(|(name, (truth, pred))| (name.clone(), binary_metrics(truth, pred)))
        .collect();

    let n_categories = per_category.len().max(1) as f64;
    let mean = |f: fn(&ClassMetrics) -> f64| {
        per_category.iter().map(|(_, m)| f(m)).sum::<f64>() / n_categories
    };

    let macro_precision = mean(|m| m.precision);
    let macro_recall = mean(|m| m.recall);
    let macro_f1 = mean(|m| m.f1_score);
    let mean_accuracy = mean(|m| m.accuracy);

    Ok(ModelMetrics {
        n_samples: y_true.nrows(),
        per_category,
        macro_precision,
        macro_recall,
        macro_f1,
        mean_accuracy,
    })
}

fn binary_metrics(truth: ArrayView1<'_, u8>, pred: ArrayView1<'_, u8>) -> ClassMetrics {
    let (mut tp, mut fp, mut fn_count, mut tn) = (0usize, 0usize, 0usize, 0usize);
    for (&t, &p) in truth.iter().zip(pred.iter()) {
        match (t == 1, p == 1) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_count += 1,
            (false, false) => tn += 1,
        }
    }

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_count);
    let f1_score = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    ClassMetrics {
        precision,
        recall,
        f1_score,
        accuracy: ratio(tp + tn, truth.len()),
        support: tp + fn_count,
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
