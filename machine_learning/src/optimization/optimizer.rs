use crate::Result;

/// Defines the strategy for updating a network's parameters based on its gradient.
pub trait Optimizer {
    /// Updates the provided slice of parameters using the gradient.
    ///
    /// # Arguments
    /// * `grad` - The gradient of the loss.
    /// * `params` - The parameters to update.
    ///
    /// # Returns
    /// An error if there's a mismatch in the sizes of `grad` and `params`.
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()>;
}

/// Checks that a gradient can be applied to the given parameters.
pub(super) fn check_sizes(grad: &[f32], params: &[f32], state: usize) -> Result<()> {
    if grad.len() != params.len() {
        return Err(crate::MlErr::SizeMismatch {
            what: "gradient",
            got: grad.len(),
            expected: params.len(),
        });
    }

    if state != params.len() {
        return Err(crate::MlErr::SizeMismatch {
            what: "optimizer state",
            got: state,
            expected: params.len(),
        });
    }

    Ok(())
}
