use std::{
    error::Error,
    fmt::{self, Display},
};

use ndarray::ShapeError;
use rand_distr::{NormalError, uniform::Error as UniformError};

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug)]
pub enum MlErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    LabelOutOfRange {
        label: usize,
        classes: usize,
    },
    TooManyClasses {
        label: usize,
        max: usize,
    },
    EmptyBatch,
    InvalidArchitecture(String),
    UnknownDistribution(String),
    InvalidDistribution(String),
    LayerShapeMismatch {
        layer: usize,
        got: (usize, usize),
        expected: (usize, usize),
    },
    Shape(ShapeError),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch for {what}, got {got} and expected {expected}"
            ),
            MlErr::LabelOutOfRange { label, classes } => write!(
                f,
                "label {label} is outside of the output layer's {classes} classes"
            ),
            MlErr::TooManyClasses { label, max } => {
                write!(f, "label {label} exceeds the limit of {max} classes")
            }
            MlErr::EmptyBatch => write!(f, "cannot train on an empty batch"),
            MlErr::InvalidArchitecture(msg) => write!(f, "invalid architecture: {msg}"),
            MlErr::UnknownDistribution(name) => write!(f, "Unknown distribution: {name}"),
            MlErr::InvalidDistribution(msg) => write!(f, "invalid distribution: {msg}"),
            MlErr::LayerShapeMismatch {
                layer,
                got,
                expected,
            } => write!(
                f,
                "layer {layer} has shape {}x{}, expected {}x{}",
                got.0, got.1, expected.0, expected.1
            ),
            MlErr::Shape(e) => write!(f, "shape error: {e}"),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Shape(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ShapeError> for MlErr {
    fn from(value: ShapeError) -> Self {
        Self::Shape(value)
    }
}

impl From<NormalError> for MlErr {
    fn from(value: NormalError) -> Self {
        Self::InvalidDistribution(value.to_string())
    }
}

impl From<UniformError> for MlErr {
    fn from(value: UniformError) -> Self {
        Self::InvalidDistribution(value.to_string())
    }
}
