//! Classification map rendering.

use comms::MapFrame;
use machine_learning::arch::{INPUT_DIM, Network};
use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;

use crate::Result;

/// The colors of the first classes: blue, orange, red, purple, green, yellow, brown and navy.
pub const PALETTE: [[u8; 3]; 8] = [
    [52, 152, 219],
    [230, 126, 34],
    [231, 76, 60],
    [155, 89, 182],
    [46, 204, 113],
    [241, 196, 15],
    [121, 85, 72],
    [52, 73, 94],
];

/// Returns the color of a class, stable across calls.
pub fn class_color(class: usize) -> [u8; 3] {
    if let Some(&color) = PALETTE.get(class) {
        return color;
    }

    let [_, r, g, b] = (class as u32).wrapping_mul(0x9E37_79B1).to_be_bytes();
    [r, g, b]
}

/// Renders the class probabilities of `network` over `[-1, 1]^2` as a grid of blended colors.
///
/// Columns go from `x = -1` to `x = 1` and rows from `y = 1` down to `y = -1`.
///
/// # Arguments
/// * `network` - The network to evaluate, without dropout.
/// * `width` - The amount of columns of the grid.
/// * `height` - The amount of rows of the grid.
///
/// # Returns
/// A map frame of `width * height` pixels.
pub fn render_map(network: &Network, width: u16, height: u16) -> Result<MapFrame> {
    let xs = linspace(-1., 1., width as usize);
    let ys = linspace(1., -1., height as usize);
    let palette: Vec<_> = (0..network.output_dim()).map(class_color).collect();

    let rows: Vec<[u8; 3]> = ys
        .par_iter()
        .flat_map_iter(|&y| {
            let grid = Array2::from_shape_fn((xs.len(), INPUT_DIM), |(i, j)| match j {
                0 => xs[i],
                _ => y,
            });

            let probs = network.predict_proba(grid.view());
            let pixels: Vec<_> = probs.rows().into_iter().map(|p| blend(p, &palette)).collect();
            pixels
        })
        .collect();

    let pixels = bytemuck::cast_slice::<[u8; 3], u8>(&rows).to_vec();
    Ok(MapFrame::new(width, height, pixels)?)
}

fn blend(probs: ArrayView1<f32>, palette: &[[u8; 3]]) -> [u8; 3] {
    let mut rgb = [0f32; 3];

    for (p, color) in probs.iter().zip(palette) {
        for (channel, &c) in rgb.iter_mut().zip(color) {
            *channel += p * c as f32;
        }
    }

    rgb.map(|c| c as u8)
}

fn linspace(start: f32, end: f32, n: usize) -> Vec<f32> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f32;
            (0..n).map(|i| start + step * i as f32).collect()
        }
    }
}
