use comms::specs::DataPoint;
use ndarray::{Array2, ArrayView2};
use rand::{Rng, seq::IndexedRandom};

use crate::arch::INPUT_DIM;

/// A set of samples ready to be fed to a network.
#[derive(Debug, Clone)]
pub struct Batch {
    x: Array2<f32>,
    labels: Vec<usize>,
}

impl Batch {
    /// Creates a new `Batch` with every one of the given points.
    pub fn from_points<'a, I>(points: I) -> Self
    where
        I: IntoIterator<Item = &'a DataPoint>,
    {
        let points: Vec<_> = points.into_iter().collect();
        let x = Array2::from_shape_fn((points.len(), INPUT_DIM), |(i, j)| match j {
            0 => points[i].x,
            _ => points[i].y,
        });

        let labels = points.iter().map(|p| p.label).collect();
        Self { x, labels }
    }

    /// Samples a batch out of a dataset.
    ///
    /// # Arguments
    /// * `points` - The whole dataset.
    /// * `batch_size` - The amount of points to draw without replacement, `0` meaning all of them.
    /// * `rng` - The random source to draw with.
    ///
    /// # Returns
    /// A random subset of `batch_size` points if it's smaller than the dataset, or else the full
    /// dataset in order.
    pub fn sample<R: Rng>(points: &[DataPoint], batch_size: usize, rng: &mut R) -> Self {
        if batch_size == 0 || batch_size >= points.len() {
            return Self::from_points(points);
        }

        Self::from_points(points.choose_multiple(rng, batch_size))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn x(&self) -> ArrayView2<'_, f32> {
        self.x.view()
    }

    pub fn labels(&self) -> &[usize] {
        &self.labels
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;

    fn points(n: usize) -> Vec<DataPoint> {
        (0..n)
            .map(|i| DataPoint::new(i as f32, -(i as f32), i % 2))
            .collect()
    }

    #[test]
    fn full_dataset() {
        let mut rng = StdRng::seed_from_u64(0);
        let data = points(5);

        for batch_size in [0, 5, 9] {
            let batch = Batch::sample(&data, batch_size, &mut rng);
            assert_eq!(batch.len(), 5);
            assert_eq!(batch.labels(), [0, 1, 0, 1, 0]);
            assert_eq!(batch.x().row(3).to_vec(), [3., -3.]);
        }
    }

    #[test]
    fn random_subset() {
        let mut rng = StdRng::seed_from_u64(0);
        let data = points(20);
        let batch = Batch::sample(&data, 4, &mut rng);

        assert_eq!(batch.len(), 4);
        for (row, label) in batch.x().rows().into_iter().zip(batch.labels()) {
            assert_eq!(row[0], -row[1]);
            assert_eq!(row[0] as usize % 2, *label);
        }
    }

    #[test]
    fn empty() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(Batch::sample(&[], 3, &mut rng).is_empty());
    }
}
