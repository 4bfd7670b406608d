use std::f32::consts::FRAC_2_PI;

const COEF: f32 = 0.044715;

/// Gaussian error linear unit, using the tanh approximation.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Gelu;

impl Gelu {
    pub fn f(&self, z: f32) -> f32 {
        0.5 * z * (1. + Self::inner(z).tanh())
    }

    pub fn df(&self, z: f32) -> f32 {
        let t = Self::inner(z).tanh();
        let d_inner = FRAC_2_PI.sqrt() * (1. + 3. * COEF * z.powi(2));

        0.5 * (1. + t) + 0.5 * z * (1. - t.powi(2)) * d_inner
    }

    fn inner(z: f32) -> f32 {
        FRAC_2_PI.sqrt() * (z + COEF * z.powi(3))
    }
}
