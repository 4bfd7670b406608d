use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use machine_learning::MlErr;

/// The result type used across the playground service.
pub type Result<T> = std::result::Result<T, PlaygroundErr>;

/// All errors that can occur while serving a training session.
#[derive(Debug)]
pub enum PlaygroundErr {
    /// A configuration value couldn't be parsed.
    InvalidConfig { key: &'static str, value: String },
    /// The numeric backend rejected an operation.
    Ml(MlErr),
    /// An underlying I/O error, including malformed map frames.
    Io(io::Error),
    /// An outbound message couldn't be serialized.
    Json(serde_json::Error),
}

impl Display for PlaygroundErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig { key, value } => write!(f, "invalid value for {key}: {value:?}"),
            Self::Ml(e) => write!(f, "training error: {e}"),
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Json(e) => write!(f, "json error: {e}"),
        }
    }
}

impl Error for PlaygroundErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Ml(e) => Some(e),
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::InvalidConfig { .. } => None,
        }
    }
}

impl From<MlErr> for PlaygroundErr {
    fn from(e: MlErr) -> Self {
        Self::Ml(e)
    }
}

impl From<io::Error> for PlaygroundErr {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for PlaygroundErr {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}
