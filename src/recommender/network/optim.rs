//! Adam optimizer (Kingma & Ba, 2015).
//!
//! ```text
//! m_t = β₁ * m_{t-1} + (1 - β₁) * grad
//! v_t = β₂ * v_{t-1} + (1 - β₂) * grad²
//! m̂_t = m_t / (1 - β₁ᵗ)
//! v̂_t = v_t / (1 - β₂ᵗ)
//! param = param - lr * m̂_t / (√v̂_t + ε)
//! ```

use ndarray::{Array, Dimension, Zip};

use super::dense::{Dense, DenseGrad};

#[derive(Debug, Clone)]
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    eps: f32,
    /// First moment estimates, one per layer
    m: Vec<DenseGrad>,
    /// Second moment estimates
    v: Vec<DenseGrad>,
    t: i32,
}

/// Per-step coefficients shared by every parameter
#[derive(Clone, Copy)]
struct StepCoef {
    lr: f32,
    beta1: f32,
    beta2: f32,
    eps: f32,
    bias_c1: f32,
    bias_c2: f32,
}

impl Adam {
    /// β₁=0.9, β₂=0.999, ε=1e-7
    pub fn new(lr: f32) -> Self {
        Self {
            lr,
            beta1: 0.9,
            beta2: 0.999,
            eps: 1e-7,
            m: Vec::new(),
            v: Vec::new(),
            t: 0,
        }
    }

    /// Apply one update to every layer
    pub fn step(&mut self, layers: &mut [Dense], grads: &[DenseGrad]) {
        debug_assert_eq!(layers.len(), grads.len());
        if self.m.is_empty() {
            self.m = layers.iter().map(DenseGrad::zeros_like).collect();
            self.v = self.m.clone();
        }
        self.t += 1;
        let coef = StepCoef {
            lr: self.lr,
            beta1: self.beta1,
            beta2: self.beta2,
            eps: self.eps,
            bias_c1: 1.0 - self.beta1.powi(self.t),
            bias_c2: 1.0 - self.beta2.powi(self.t),
        };
        for (((layer, grad), m), v) in layers
            .iter_mut()
            .zip(grads)
            .zip(self.m.iter_mut())
            .zip(self.v.iter_mut())
        {
            update(coef, &mut layer.weight, &mut m.weight, &mut v.weight, &grad.weight);
            update(coef, &mut layer.bias, &mut m.bias, &mut v.bias, &grad.bias);
        }
    }
}

fn update<D: Dimension>(
    coef: StepCoef,
    params: &mut Array<f32, D>,
    m: &mut Array<f32, D>,
    v: &mut Array<f32, D>,
    grads: &Array<f32, D>,
) {
    Zip::from(params).and(m).and(v).and(grads).for_each(|p, m, v, &g| {
        *m = coef.beta1 * *m + (1.0 - coef.beta1) * g;
        *v = coef.beta2 * *v + (1.0 - coef.beta2) * g * g;
        let m_hat = *m / coef.bias_c1;
        let v_hat = *v / coef.bias_c2;
        *p -= coef.lr * m_hat / (v_hat.sqrt() + coef.eps);
    });
}

#[cfg(test)]
mod tests {
    use ndarray::{arr1, arr2};

    use super::*;
    use crate::recommender::network::dense::Activation;

    #[test]
    fn first_step_moves_against_the_gradient_by_lr() {
        let mut layers = vec![Dense {
            activation: Activation::Sigmoid,
            weight: arr2(&[[1.0, 1.0]]),
            bias: arr1(&[0.0]),
        }];
        let grads = vec![DenseGrad {
            weight: arr2(&[[0.5, -2.0]]),
            bias: arr1(&[0.0]),
        }];
        let mut adam = Adam::new(0.1);
        adam.step(&mut layers, &grads);
        // bias corrected first step is lr * sign(grad)
        assert!((layers[0].weight[[0, 0]] - 0.9).abs() < 1e-4);
        assert!((layers[0].weight[[0, 1]] - 1.1).abs() < 1e-4);
        assert_eq!(layers[0].bias[0], 0.0);
    }

    #[test]
    fn moments_carry_across_steps() {
        let mut layers = vec![Dense {
            activation: Activation::Sigmoid,
            weight: arr2(&[[0.0]]),
            bias: arr1(&[0.0]),
        }];
        let grads = vec![DenseGrad {
            weight: arr2(&[[1.0]]),
            bias: arr1(&[0.0]),
        }];
        let mut adam = Adam::new(0.01);
        for _ in 0..3 {
            adam.step(&mut layers, &grads);
        }
        // a constant gradient keeps moving the weight by about lr per step
        assert!((layers[0].weight[[0, 0]] + 0.03).abs() < 1e-3);
    }
}
