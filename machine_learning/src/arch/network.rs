use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, Axis};
use rand::Rng;

use super::{Architecture, loss::CrossEntropy, loss::softmax};
use crate::{MlErr, Result, initialization::ParamGen, initialization::RandParamGen};

/// The width of every input sample, a point of the plane.
pub const INPUT_DIM: usize = 2;

/// A fully connected classifier.
///
/// All the parameters live in a single flat buffer, layer after layer, each one laid out as its
/// `out x in` weight matrix (row-major, one row per output unit) followed by its `out` biases.
#[derive(Debug, Clone)]
pub struct Network {
    arch: Architecture,
    dims: Vec<usize>,
    params: Vec<f32>,
}

impl Network {
    /// Creates a new `Network`.
    ///
    /// # Arguments
    /// * `arch` - The hidden shape of the network.
    /// * `output_dim` - The amount of classes.
    /// * `init` - Given a layer's fan in and its amount of parameters, samples them.
    ///
    /// # Returns
    /// An error if `output_dim` is zero or `init` can't provide enough parameters.
    pub fn new<F>(arch: Architecture, output_dim: usize, mut init: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> Result<Option<Vec<f32>>>,
    {
        if output_dim == 0 {
            return Err(MlErr::InvalidArchitecture(
                "the output layer must have at least one unit".into(),
            ));
        }

        let mut dims = Vec::with_capacity(arch.hidden_layers().len() + 2);
        dims.push(INPUT_DIM);
        dims.extend_from_slice(arch.hidden_layers());
        dims.push(output_dim);

        let mut params = Vec::new();

        for (fan_in, fan_out) in dims.iter().zip(&dims[1..]) {
            let size = (fan_in + 1) * fan_out;
            let sample = init(*fan_in, size)?.unwrap_or_default();

            if sample.len() != size {
                return Err(MlErr::SizeMismatch {
                    what: "initial parameters",
                    got: sample.len(),
                    expected: size,
                });
            }

            params.extend(sample);
        }

        Ok(Self { arch, dims, params })
    }

    /// Creates a new `Network` with every layer drawn from `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`.
    pub fn random<R: Rng>(arch: Architecture, output_dim: usize, rng: &mut R) -> Result<Self> {
        Self::new(arch, output_dim, |fan_in, size| {
            Ok(RandParamGen::linear(&mut *rng, size, fan_in)?.sample(size))
        })
    }

    pub fn architecture(&self) -> &Architecture {
        &self.arch
    }

    pub fn hidden_layers(&self) -> &[usize] {
        self.arch.hidden_layers()
    }

    /// Returns the amount of dense layers, the output one included.
    pub fn num_layers(&self) -> usize {
        self.dims.len() - 1
    }

    pub fn output_dim(&self) -> usize {
        self.dims[self.dims.len() - 1]
    }

    /// Returns the amount of parameters in the network.
    pub fn size(&self) -> usize {
        self.params.len()
    }

    pub fn params(&self) -> &[f32] {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut [f32] {
        &mut self.params
    }

    /// Returns the `(out, in)` shape of the weight matrix of layer `l`.
    pub fn layer_shape(&self, l: usize) -> Option<(usize, usize)> {
        (l < self.num_layers()).then(|| (self.dims[l + 1], self.dims[l]))
    }

    /// Gives a view of the parameters of layer `l` as its weights and biases.
    pub fn layer(&self, l: usize) -> Option<(ArrayView2<'_, f32>, ArrayView1<'_, f32>)> {
        let (offset, (out, inp)) = self.layer_offset(l)?;
        let (w_raw, b_raw) = self.params[offset..offset + (inp + 1) * out].split_at(out * inp);

        let weights = ArrayView2::from_shape((out, inp), w_raw).ok()?;
        let biases = ArrayView1::from_shape(out, b_raw).ok()?;
        Some((weights, biases))
    }

    /// Overwrites the parameters of layer `l`.
    ///
    /// # Returns
    /// An error if the layer doesn't exist or the given shapes don't match its own.
    pub fn load_layer(
        &mut self,
        l: usize,
        weights: ArrayView2<f32>,
        biases: ArrayView1<f32>,
    ) -> Result<()> {
        let (offset, (out, inp)) = self.layer_offset(l).ok_or(MlErr::SizeMismatch {
            what: "layers",
            got: l + 1,
            expected: self.num_layers(),
        })?;

        if weights.dim() != (out, inp) || biases.len() != out {
            return Err(MlErr::LayerShapeMismatch {
                layer: l,
                got: weights.dim(),
                expected: (out, inp),
            });
        }

        let (mut w, mut b) = Self::view_layer_mut(&mut self.params[offset..], out, inp)?;
        w.assign(&weights);
        b.assign(&biases);
        Ok(())
    }

    /// Replaces the output layer, possibly changing the amount of classes.
    ///
    /// # Returns
    /// An error if the new layer's input width doesn't match the last hidden width.
    pub fn replace_output_layer(&mut self, weights: Array2<f32>, biases: Array1<f32>) -> Result<()> {
        let last = self.num_layers() - 1;
        let offset = self.params.len() - (self.dims[last] + 1) * self.dims[last + 1];
        let inp = self.dims[last];
        let (out, got_inp) = weights.dim();

        if got_inp != inp || biases.len() != out || out == 0 {
            return Err(MlErr::LayerShapeMismatch {
                layer: last,
                got: (out, got_inp),
                expected: (biases.len(), inp),
            });
        }

        self.params.truncate(offset);
        self.params.extend(weights.iter());
        self.params.extend(biases.iter());

        let n = self.dims.len();
        self.dims[n - 1] = out;
        Ok(())
    }

    /// Computes the raw output of the network in evaluation mode, that is, without dropout.
    ///
    /// # Arguments
    /// * `x` - The input samples, one row each.
    ///
    /// # Returns
    /// The logits, one row per sample.
    pub fn forward(&self, x: ArrayView2<f32>) -> Array2<f32> {
        let act_fn = self.arch.act_fn();
        let last = self.num_layers() - 1;
        let mut a = x.to_owned();

        for l in 0..self.num_layers() {
            let Some((w, b)) = self.layer(l) else {
                break;
            };

            let mut z = a.dot(&w.t());
            z += &b;

            if l < last {
                z.mapv_inplace(|z| act_fn.f(z));
            }

            a = z;
        }

        a
    }

    /// Computes the class probabilities of every sample in evaluation mode.
    pub fn predict_proba(&self, x: ArrayView2<f32>) -> Array2<f32> {
        softmax(self.forward(x).view())
    }

    /// Computes the gradient of the mean cross-entropy loss with respect to the parameters,
    /// making a forward pass in training mode (dropout enabled).
    ///
    /// # Arguments
    /// * `x` - The input samples, one row each.
    /// * `labels` - The expected class of every sample.
    /// * `grad` - A buffer of `size()` values to write the gradient into.
    /// * `rng` - The random source for the dropout masks.
    ///
    /// # Returns
    /// The batch loss, or an error if the batch is empty, mismatched or has unknown labels.
    pub fn backprop<R: Rng>(
        &self,
        x: ArrayView2<f32>,
        labels: &[usize],
        grad: &mut [f32],
        rng: &mut R,
    ) -> Result<f32> {
        if grad.len() != self.size() {
            return Err(MlErr::SizeMismatch {
                what: "gradient",
                got: grad.len(),
                expected: self.size(),
            });
        }

        if x.ncols() != INPUT_DIM {
            return Err(MlErr::SizeMismatch {
                what: "input width",
                got: x.ncols(),
                expected: INPUT_DIM,
            });
        }

        let act_fn = self.arch.act_fn();
        let p = self.arch.dropout();
        let nlayers = self.num_layers();

        // Inputs of every layer plus, for the hidden ones, their pre-activations and dropout masks.
        let mut inputs = vec![x.to_owned()];
        let mut zs = Vec::with_capacity(nlayers - 1);
        let mut masks = Vec::with_capacity(nlayers - 1);
        let mut logits = Array2::zeros((0, 0));

        for l in 0..nlayers {
            let (w, b) = self.view_layer(l)?;
            let mut z = inputs[l].dot(&w.t());
            z += &b;

            if l == nlayers - 1 {
                logits = z;
                break;
            }

            let mut a = z.mapv(|z| act_fn.f(z));
            let mask = (p > 0.).then(|| {
                let keep = 1. / (1. - p);
                Array2::from_shape_simple_fn(a.raw_dim(), || {
                    if rng.random::<f32>() < p { 0. } else { keep }
                })
            });

            if let Some(mask) = &mask {
                a *= mask;
            }

            zs.push(z);
            masks.push(mask);
            inputs.push(a);
        }

        let (loss, mut delta) = CrossEntropy::new().loss_and_delta(logits.view(), labels)?;
        let mut offset = self.params.len();

        for l in (0..nlayers).rev() {
            let (out, inp) = (self.dims[l + 1], self.dims[l]);
            offset -= (inp + 1) * out;

            let (mut dw, mut db) = Self::view_layer_mut(&mut grad[offset..], out, inp)?;
            dw.assign(&delta.t().dot(&inputs[l]));
            db.assign(&delta.sum_axis(Axis(0)));

            if l == 0 {
                break;
            }

            let (w, _) = self.view_layer(l)?;
            let mut d = delta.dot(&w);

            if let Some(mask) = &masks[l - 1] {
                d *= mask;
            }

            d.zip_mut_with(&zs[l - 1], |d, &z| *d *= act_fn.df(z));
            delta = d;
        }

        Ok(loss)
    }

    fn layer_offset(&self, l: usize) -> Option<(usize, (usize, usize))> {
        let shape = self.layer_shape(l)?;
        let offset = self.dims[..=l]
            .iter()
            .zip(&self.dims[1..=l])
            .map(|(inp, out)| (inp + 1) * out)
            .sum();

        Some((offset, shape))
    }

    fn view_layer(&self, l: usize) -> Result<(ArrayView2<'_, f32>, ArrayView1<'_, f32>)> {
        self.layer(l).ok_or(MlErr::SizeMismatch {
            what: "layers",
            got: l + 1,
            expected: self.num_layers(),
        })
    }

    fn view_layer_mut(
        raw: &mut [f32],
        out: usize,
        inp: usize,
    ) -> Result<(ArrayViewMut2<'_, f32>, ArrayViewMut1<'_, f32>)> {
        let (w_raw, rest) = raw.split_at_mut(out * inp);
        let weights = ArrayViewMut2::from_shape((out, inp), w_raw)?;
        let biases = ArrayViewMut1::from_shape(out, &mut rest[..out])?;
        Ok((weights, biases))
    }
}
