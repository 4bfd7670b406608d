use serde::{Deserialize, Serialize};

/// A single labelled point of the two dimensional input domain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f32,
    pub y: f32,
    pub label: usize,
}

impl DataPoint {
    /// Creates a new `DataPoint`.
    pub fn new(x: f32, y: f32, label: usize) -> Self {
        Self { x, y, label }
    }
}
