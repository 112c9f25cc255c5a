//! Fully connected layer over row batches: Y = act(X Wᵀ + b)

use ndarray::{Array1, Array2, ArrayView2};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Relu,
    Sigmoid,
}

impl Activation {
    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Sigmoid => {
                // stable for large |x|
                if x >= 0.0 {
                    1.0 / (1.0 + (-x).exp())
                } else {
                    let e = x.exp();
                    e / (1.0 + e)
                }
            }
        }
    }

    /// Derivative expressed through the activation output `y`
    #[inline]
    pub fn derivative_from_output(self, y: f32) -> f32 {
        match self {
            Activation::Relu => {
                if y > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Sigmoid => y * (1.0 - y),
        }
    }
}

/// Dense layer.
///
/// `weight` has shape `[out_features, in_features]`, `bias` has `out_features` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dense {
    pub activation: Activation,
    pub weight: Array2<f32>,
    pub bias: Array1<f32>,
}

impl Dense {
    /// Glorot uniform weights, U(-a, a) with a = sqrt(6 / (fan_in + fan_out)), zero bias
    pub fn glorot<R: Rng>(in_features: usize, out_features: usize, activation: Activation, rng: &mut R) -> Self {
        let a = (6.0 / (in_features + out_features) as f32).sqrt();
        Self {
            activation,
            weight: Array2::from_shape_fn((out_features, in_features), |_| rng.gen_range(-a..a)),
            bias: Array1::zeros(out_features),
        }
    }

    #[inline]
    pub fn in_features(&self) -> usize {
        self.weight.ncols()
    }

    #[inline]
    pub fn out_features(&self) -> usize {
        self.weight.nrows()
    }

    /// Forward a `[batch, in_features]` batch, one output row per input row
    pub fn forward(&self, input: ArrayView2<f32>) -> Array2<f32> {
        let activation = self.activation;
        (input.dot(&self.weight.t()) + &self.bias).mapv_into(|z| activation.apply(z))
    }

    /// Shape and storage agree
    pub fn is_consistent(&self) -> bool {
        self.bias.len() == self.out_features()
    }
}

/// Gradient of one `Dense` layer, shaped like the layer
#[derive(Debug, Clone, PartialEq)]
pub struct DenseGrad {
    pub weight: Array2<f32>,
    pub bias: Array1<f32>,
}

impl DenseGrad {
    pub fn zeros_like(layer: &Dense) -> Self {
        Self {
            weight: Array2::zeros(layer.weight.raw_dim()),
            bias: Array1::zeros(layer.bias.raw_dim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, arr2};
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn activations() {
        assert_eq!(Activation::Relu.apply(-2.0), 0.0);
        assert_eq!(Activation::Relu.apply(1.5), 1.5);
        assert!((Activation::Sigmoid.apply(0.0) - 0.5).abs() < 1e-7);
        assert!(Activation::Sigmoid.apply(-100.0) >= 0.0);
        assert!(Activation::Sigmoid.apply(100.0) <= 1.0);
        assert_eq!(Activation::Sigmoid.derivative_from_output(0.5), 0.25);
    }

    #[test]
    fn glorot_init_is_bounded() {
        let mut rng = StdRng::seed_from_u64(0);
        let layer = Dense::glorot(200, 128, Activation::Relu, &mut rng);
        let a = (6.0f32 / 328.0).sqrt();
        assert_eq!(layer.weight.dim(), (128, 200));
        assert!(layer.is_consistent());
        assert!(layer.weight.iter().all(|w| w.abs() <= a));
        assert!(layer.bias.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn forward_computes_affine_then_activation() {
        let layer = Dense {
            activation: Activation::Relu,
            weight: arr2(&[[1.0, 2.0], [-1.0, -1.0]]),
            bias: arr1(&[0.5, 0.0]),
        };
        let out = layer.forward(arr2(&[[1.0, 1.0], [0.0, -2.0]]).view());
        assert_eq!(out, arr2(&[[3.5, 0.0], [0.0, 2.0]]));
    }

    #[test]
    fn gradient_buffers_match_layer_shape() {
        let layer = Dense::glorot(4, 3, Activation::Sigmoid, &mut StdRng::seed_from_u64(1));
        let grad = DenseGrad::zeros_like(&layer);
        assert_eq!(grad.weight.dim(), (3, 4));
        assert_eq!(grad.bias.len(), 3);
    }
}
