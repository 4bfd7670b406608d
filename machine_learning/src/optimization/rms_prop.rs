use super::{Optimizer, optimizer::check_sizes};
use crate::Result;

#[derive(Debug)]
pub struct RmsProp {
    learning_rate: f32,
    alpha: f32,
    epsilon: f32,
    weight_decay: f32,
    square_avg: Box<[f32]>,
}

impl RmsProp {
    /// Creates a new `RmsProp` optimizer.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters this instance should hold.
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `alpha` - The smoothing constant of the squared gradient average.
    /// * `epsilon` - Added to the denominator for numerical stability.
    pub fn new(len: usize, learning_rate: f32, alpha: f32, epsilon: f32) -> Self {
        Self {
            learning_rate,
            alpha,
            epsilon,
            weight_decay: 0.,
            square_avg: vec![0.; len].into_boxed_slice(),
        }
    }

    /// Adds an L2 penalty of `weight_decay` to every update.
    pub fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }
}

impl Optimizer for RmsProp {
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()> {
        check_sizes(grad, params, self.square_avg.len())?;

        let Self {
            learning_rate: lr,
            alpha,
            epsilon: eps,
            weight_decay: wd,
            ..
        } = *self;

        params
            .iter_mut()
            .zip(grad)
            .zip(self.square_avg.iter_mut())
            .for_each(|((p, g), s)| {
                let g = g + wd * *p;
                *s = alpha * *s + (1. - alpha) * g.powi(2);
                *p -= lr * g / (s.sqrt() + eps);
            });

        Ok(())
    }
}
