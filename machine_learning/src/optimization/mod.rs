mod adam;
mod gradient_descent;
mod optimizer;
mod rms_prop;

pub use adam::Adam;
use comms::specs::OptimizerSpec;
pub use gradient_descent::GradientDescent;
pub use optimizer::Optimizer;
pub use rms_prop::RmsProp;

/// Builds a fresh optimizer with empty moment estimates.
///
/// # Arguments
/// * `spec` - The optimization algorithm to use.
/// * `len` - The amount of parameters it will update.
/// * `learning_rate` - The step size.
/// * `weight_decay` - The L2 penalty coefficient added to every gradient.
///
/// # Returns
/// The optimizer, boxed so it can be swapped at runtime.
pub fn build(
    spec: OptimizerSpec,
    len: usize,
    learning_rate: f32,
    weight_decay: f32,
) -> Box<dyn Optimizer + Send> {
    match spec {
        OptimizerSpec::GradientDescent => {
            Box::new(GradientDescent::new(learning_rate).with_weight_decay(weight_decay))
        }
        OptimizerSpec::Adam => Box::new(
            Adam::new(len, learning_rate, 0.9, 0.999, 1e-8).with_weight_decay(weight_decay),
        ),
        OptimizerSpec::RmsProp => {
            Box::new(RmsProp::new(len, learning_rate, 0.99, 1e-8).with_weight_decay(weight_decay))
        }
    }
}
