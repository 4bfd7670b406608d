mod generators;

use comms::specs::DataPoint;
pub use generators::Distribution;

use crate::{MlErr, Result};

/// The least amount of classes any network is built with.
pub const MIN_CLASSES: usize = 2;

/// The most classes a dataset may have.
pub const MAX_CLASSES: usize = 16;

/// Computes the output width a network needs to be trained on `points`.
///
/// # Returns
/// `max(2, max label + 1)`, or `2` for an empty dataset.
pub fn required_classes(points: &[DataPoint]) -> usize {
    points
        .iter()
        .map(|p| p.label.saturating_add(1))
        .max()
        .unwrap_or(0)
        .max(MIN_CLASSES)
}

/// Checks that every label of `points` fits in `MAX_CLASSES` classes.
pub fn check_labels(points: &[DataPoint]) -> Result<()> {
    match points.iter().find(|p| p.label >= MAX_CLASSES) {
        Some(p) => Err(MlErr::TooManyClasses {
            label: p.label,
            max: MAX_CLASSES,
        }),
        None => Ok(()),
    }
}
