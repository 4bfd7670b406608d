use log::debug;
use machine_learning::{
    MlErr, Result,
    arch::{Architecture, Network},
    initialization::{ParamGen, RandParamGen},
};
use ndarray::{Array1, Array2, s};
use rand::Rng;

/// Resizes the output layer of `network` to `new_width` classes.
///
/// The weight rows and biases of the classes both widths share are kept, any new class gets
/// freshly initialized parameters.
///
/// # Arguments
/// * `network` - The network to resize.
/// * `new_width` - The new amount of classes.
/// * `rng` - The random source for the new classes.
///
/// # Returns
/// Whether the network changed, or an error if `new_width` is zero.
pub fn resize_output<R: Rng>(network: &mut Network, new_width: usize, rng: &mut R) -> Result<bool> {
    let old_width = network.output_dim();
    if old_width == new_width {
        return Ok(false);
    }

    let last = network.num_layers() - 1;
    let (old_weights, old_biases) = network.layer(last).ok_or(MlErr::SizeMismatch {
        what: "layers",
        got: 0,
        expected: last + 1,
    })?;

    let fan_in = old_weights.ncols();
    let size = new_width * (fan_in + 1);
    let mut fresh = RandParamGen::linear(rng, size, fan_in)?
        .sample(size)
        .unwrap_or_default();

    if fresh.len() != size {
        return Err(MlErr::SizeMismatch {
            what: "output layer",
            got: fresh.len(),
            expected: size,
        });
    }

    let biases = fresh.split_off(new_width * fan_in);
    let mut weights = Array2::from_shape_vec((new_width, fan_in), fresh)?;
    let mut biases = Array1::from_vec(biases);

    let keep = old_width.min(new_width);
    weights
        .slice_mut(s![..keep, ..])
        .assign(&old_weights.slice(s![..keep, ..]));
    biases
        .slice_mut(s![..keep])
        .assign(&old_biases.slice(s![..keep]));

    network.replace_output_layer(weights, biases)?;

    debug!(from = old_width, to = new_width; "resized output layer");
    Ok(true)
}

/// Builds a network with a new hidden shape, carrying over every layer of `previous` whose
/// shape coincides with the new layer of the same index.
///
/// # Arguments
/// * `previous` - The network being replaced, if any.
/// * `arch` - The new hidden shape.
/// * `rng` - The random source for the new parameters.
///
/// # Returns
/// The new network, keeping the output width of `previous` (or the minimum one).
pub fn rebuild<R: Rng>(
    previous: Option<&Network>,
    arch: Architecture,
    rng: &mut R,
) -> Result<Network> {
    let output_dim = previous.map_or(machine_learning::dataset::MIN_CLASSES, Network::output_dim);
    let mut network = Network::random(arch, output_dim, rng)?;

    let Some(previous) = previous else {
        return Ok(network);
    };

    let mut kept = 0;
    for l in 0..network.num_layers().min(previous.num_layers()) {
        if network.layer_shape(l) != previous.layer_shape(l) {
            continue;
        }

        if let Some((weights, biases)) = previous.layer(l) {
            network.load_layer(l, weights, biases)?;
            kept += 1;
        }
    }

    debug!(kept = kept; "rebuilt network");
    Ok(network)
}
