use comms::specs::ModelState;
use log::debug;
use ndarray::{Array1, Array2};

use crate::arch::Network;

impl Network {
    /// Exports the parameters in their wire form, one weight row per output unit.
    pub fn to_state(&self) -> ModelState {
        let (weights, biases) = (0..self.num_layers())
            .filter_map(|l| self.layer(l))
            .map(|(w, b)| {
                let rows: Vec<Vec<f32>> = w.rows().into_iter().map(|row| row.to_vec()).collect();
                (rows, b.to_vec())
            })
            .unzip();

        ModelState { weights, biases }
    }

    /// Loads every layer of `state` whose shape matches the one of the same index in this
    /// network, leaving the rest of the layers untouched.
    ///
    /// # Returns
    /// The amount of layers loaded.
    pub fn load_state(&mut self, state: &ModelState) -> usize {
        let mut loaded = 0;

        for (l, (rows, biases)) in state.weights.iter().zip(&state.biases).enumerate() {
            if self.layer_shape(l).is_none() {
                debug!(layer = l; "ignoring extra incoming layer");
                break;
            }

            let Some(weights) = to_matrix(rows) else {
                debug!(layer = l; "ignoring ragged incoming layer");
                continue;
            };

            let biases = Array1::from_vec(biases.clone());
            match self.load_layer(l, weights.view(), biases.view()) {
                Ok(()) => loaded += 1,
                Err(e) => debug!(layer = l; "skipping incoming layer: {e}"),
            }
        }

        loaded
    }

    /// Returns the output width of the network a wire model was exported from, if any.
    pub fn output_dim_of(state: &ModelState) -> Option<usize> {
        state.weights.last().map(Vec::len).filter(|&n| n > 0)
    }
}

fn to_matrix(rows: &[Vec<f32>]) -> Option<Array2<f32>> {
    let cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|row| row.len() != cols) {
        return None;
    }

    let flat = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), cols), flat).ok()
}
