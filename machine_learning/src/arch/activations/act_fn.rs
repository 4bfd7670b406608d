use comms::specs::ActivationSpec;

use super::Gelu;

/// The activation function applied after every hidden layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActFn {
    Tanh,
    Relu,
    LeakyRelu { slope: f32 },
    Gelu(Gelu),
}
impl ActFn {
    pub fn f(&self, z: f32) -> f32 {
        match self {
            Self::Tanh => z.tanh(),
            Self::Relu => z.max(0.),
            Self::LeakyRelu { slope } => {
                if z > 0. {
                    z
                } else {
                    slope * z
                }
            }
            Self::Gelu(a) => a.f(z),
        }
    }

    pub fn df(&self, z: f32) -> f32 {
        match self {
            Self::Tanh => 1. - z.tanh().powi(2),
            Self::Relu => (z > 0.) as u8 as f32,
            Self::LeakyRelu { slope } => {
                if z > 0. {
                    1.
                } else {
                    *slope
                }
            }
            Self::Gelu(a) => a.df(z),
        }
    }
}

impl From<ActivationSpec> for ActFn {
    fn from(spec: ActivationSpec) -> Self {
        match spec {
            ActivationSpec::Tanh => Self::Tanh,
            ActivationSpec::Relu => Self::Relu,
            ActivationSpec::LeakyRelu => Self::LeakyRelu { slope: 0.01 },
            ActivationSpec::Gelu => Self::Gelu(Gelu),
        }
    }
}

impl From<ActFn> for ActivationSpec {
    fn from(act_fn: ActFn) -> Self {
        match act_fn {
            ActFn::Tanh => ActivationSpec::Tanh,
            ActFn::Relu => ActivationSpec::Relu,
            ActFn::LeakyRelu { .. } => ActivationSpec::LeakyRelu,
            ActFn::Gelu(_) => ActivationSpec::Gelu,
        }
    }
}
