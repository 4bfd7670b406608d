use ndarray::{Array2, ArrayView2, Axis};

use crate::{MlErr, Result};

/// Applies a numerically stable softmax to every row of `logits`.
pub fn softmax(logits: ArrayView2<f32>) -> Array2<f32> {
    let mut probs = logits.to_owned();

    for mut row in probs.axis_iter_mut(Axis(0)) {
        let max = row.fold(f32::NEG_INFINITY, |acc, &z| acc.max(z));
        row.mapv_inplace(|z| (z - max).exp());

        let sum = row.sum();
        row.mapv_inplace(|p| p / sum);
    }

    probs
}

/// Mean softmax cross-entropy loss function.
#[derive(Default, Clone, Copy)]
pub struct CrossEntropy;

impl CrossEntropy {
    /// Returns a new `CrossEntropy`.
    pub fn new() -> Self {
        Self
    }

    /// Computes the mean loss over the batch and its derivative with respect to the logits.
    ///
    /// # Arguments
    /// * `logits` - The raw network output, one row per sample.
    /// * `labels` - The expected class of every sample.
    ///
    /// # Returns
    /// The loss and the delta for the output layer, or an error if a label has no output unit.
    pub fn loss_and_delta(
        &self,
        logits: ArrayView2<f32>,
        labels: &[usize],
    ) -> Result<(f32, Array2<f32>)> {
        let (n, classes) = logits.dim();

        if n == 0 {
            return Err(MlErr::EmptyBatch);
        }

        if labels.len() != n {
            return Err(MlErr::SizeMismatch {
                what: "labels",
                got: labels.len(),
                expected: n,
            });
        }

        if let Some(&label) = labels.iter().find(|&&label| label >= classes) {
            return Err(MlErr::LabelOutOfRange { label, classes });
        }

        let mut delta = softmax(logits);
        let mut loss = 0.;

        for (mut row, &label) in delta.axis_iter_mut(Axis(0)).zip(labels) {
            loss -= row[label].max(f32::MIN_POSITIVE).ln();
            row[label] -= 1.;
        }

        delta.mapv_inplace(|d| d / n as f32);
        Ok((loss / n as f32, delta))
    }
}
