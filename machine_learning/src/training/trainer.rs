use log::trace;
use rand::Rng;

use super::Batch;
use crate::{MlErr, Result, arch::Network, optimization::Optimizer};

/// Runs optimization steps over a network, reusing its gradient buffer between them.
#[derive(Debug, Default)]
pub struct Trainer {
    grad: Vec<f32>,
}

impl Trainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes a single optimization step.
    ///
    /// # Arguments
    /// * `network` - The network to train.
    /// * `optimizer` - The optimizer bound to `network`'s parameters.
    /// * `batch` - The samples to compute the gradient on.
    /// * `rng` - The random source for dropout.
    ///
    /// # Returns
    /// The loss of the batch before the update, or an error if the step couldn't be made, in
    /// which case `network` is left untouched.
    pub fn step<O, R>(
        &mut self,
        network: &mut Network,
        optimizer: &mut O,
        batch: &Batch,
        rng: &mut R,
    ) -> Result<f32>
    where
        O: Optimizer + ?Sized,
        R: Rng,
    {
        if batch.is_empty() {
            return Err(MlErr::EmptyBatch);
        }

        self.grad.resize(network.size(), 0.);

        let loss = network.backprop(batch.x(), batch.labels(), &mut self.grad, rng)?;
        optimizer.update_params(&self.grad, network.params_mut())?;

        trace!(loss = loss, samples = batch.len(); "optimization step");
        Ok(loss)
    }
}

#[cfg(test)]
mod tests {
    use comms::specs::DataPoint;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::{
        arch::{Architecture, activations::ActFn},
        optimization::GradientDescent,
    };

    #[test]
    fn loss_decreases() {
        let mut rng = StdRng::seed_from_u64(3);
        let arch = Architecture::new(vec![8], ActFn::Tanh, 0.).unwrap();
        let mut network = Network::random(arch, 2, &mut rng).unwrap();
        let mut optimizer = GradientDescent::new(0.5);
        let mut trainer = Trainer::new();

        let data = [
            DataPoint::new(-0.5, -0.5, 0),
            DataPoint::new(0.5, 0.5, 1),
            DataPoint::new(-0.6, -0.4, 0),
            DataPoint::new(0.4, 0.6, 1),
        ];
        let batch = Batch::from_points(&data);

        let first = trainer
            .step(&mut network, &mut optimizer, &batch, &mut rng)
            .unwrap();

        let mut last = first;
        for _ in 0..50 {
            last = trainer
                .step(&mut network, &mut optimizer, &batch, &mut rng)
                .unwrap();
        }

        assert!(last < first);
    }

    #[test]
    fn bad_label_leaves_network_untouched() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut network = Network::random(Architecture::default(), 2, &mut rng).unwrap();
        let before = network.params().to_vec();
        let mut optimizer = GradientDescent::new(0.5);

        let batch = Batch::from_points(&[DataPoint::new(0., 0., 2)]);
        let result = Trainer::new().step(&mut network, &mut optimizer, &batch, &mut rng);

        assert!(matches!(result, Err(MlErr::LabelOutOfRange { .. })));
        assert_eq!(network.params(), before);
    }
}
