//! Fully connected network with Adam updates

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Probability floor for the cross-entropy log
const PROB_EPSILON: f64 = 1e-7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DenseLayer {
    /// inputs x outputs
    weights: Array2<f64>,
    bias: Array1<f64>,
}

impl DenseLayer {
    /// Glorot-uniform weights, zero bias
    fn new<R: Rng>(inputs: usize, outputs: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (inputs + outputs) as f64).sqrt();
        Self {
            weights: Array2::from_shape_fn((inputs, outputs), |_| rng.gen_range(-limit..limit)),
            bias: Array1::zeros(outputs),
        }
    }

    fn affine(&self, input: ArrayView2<'_, f64>) -> Array2<f64> {
        input.dot(&self.weights) + &self.bias
    }
}

/// Intermediate values kept for back-propagation
struct ForwardPass {
    /// Input to each layer (after dropout for hidden layers)
    inputs: Vec<Array2<f64>>,
    /// Hidden-layer pre-activations
    pre_activations: Vec<Array2<f64>>,
    /// Scaled keep masks of hidden layers
    masks: Vec<Option<Array2<f64>>>,
    probabilities: Array2<f64>,
}

struct Gradients {
    weights: Vec<Array2<f64>>,
    bias: Vec<Array1<f64>>,
}

/// Adam optimizer state
#[derive(Debug, Clone)]
pub(crate) struct Adam {
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    step: i32,
    m_weights: Vec<Array2<f64>>,
    v_weights: Vec<Array2<f64>>,
    m_bias: Vec<Array1<f64>>,
    v_bias: Vec<Array1<f64>>,
}

impl Adam {
    pub(crate) fn new(network: &Mlp, learning_rate: f64) -> Self {
        let zeros_w: Vec<Array2<f64>> = network.layers.iter().map(|l| Array2::zeros(l.weights.raw_dim())).collect();
        let zeros_b: Vec<Array1<f64>> = network.layers.iter().map(|l| Array1::zeros(l.bias.raw_dim())).collect();
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            step: 0,
            m_weights: zeros_w.clone(),
            v_weights: zeros_w,
            m_bias: zeros_b.clone(),
            v_bias: zeros_b,
        }
    }

    fn apply(&mut self, network: &mut Mlp, grads: &Gradients) {
        self.step += 1;
        let (b1, b2, eps) = (self.beta1, self.beta2, self.epsilon);
        let lr = self.learning_rate * (1.0 - b2.powi(self.step)).sqrt() / (1.0 - b1.powi(self.step));

        for (i, layer) in network.layers.iter_mut().enumerate() {
            let gw = &grads.weights[i];
            let m = &mut self.m_weights[i];
            let v = &mut self.v_weights[i];
            m.zip_mut_with(gw, |m, &g| *m = b1 * *m + (1.0 - b1) * g);
            v.zip_mut_with(gw, |v, &g| *v = b2 * *v + (1.0 - b2) * g * g);
            ndarray::Zip::from(&mut layer.weights)
                .and(&*m)
                .and(&*v)
                .for_each(|w, &m, &v| *w -= lr * m / (v.sqrt() + eps));

            let gb = &grads.bias[i];
            let m = &mut self.m_bias[i];
            let v = &mut self.v_bias[i];
            m.zip_mut_with(gb, |m, &g| *m = b1 * *m + (1.0 - b1) * g);
            v.zip_mut_with(gb, |v, &g| *v = b2 * *v + (1.0 - b2) * g * g);
            ndarray::Zip::from(&mut layer.bias)
                .and(&*m)
                .and(&*v)
                .for_each(|b, &m, &v| *b -= lr * m / (v.sqrt() + eps));
        }
    }
}

/// Multi-layer perceptron: ReLU hidden layers, softmax output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mlp {
    layers: Vec<DenseLayer>,
}

impl Mlp {
    /// Randomly initialised network
    pub fn new<R: Rng>(inputs: usize, hidden: &[usize], outputs: usize, rng: &mut R) -> Self {
        let mut sizes = Vec::with_capacity(hidden.len() + 2);
        sizes.push(inputs);
        sizes.extend_from_slice(hidden);
        sizes.push(outputs);
        let layers = sizes.windows(2).map(|w| DenseLayer::new(w[0], w[1], rng)).collect();
        Self { layers }
    }

    /// Input width
    pub fn input_len(&self) -> usize {
        self.layers.first().map_or(0, |l| l.weights.nrows())
    }

    /// Output width (classes)
    pub fn output_len(&self) -> usize {
        self.layers.last().map_or(0, |l| l.weights.ncols())
    }

    /// Whether the layers chain into each other with matching bias lengths
    pub fn is_well_formed(&self) -> bool {
        !self.layers.is_empty()
            && self.layers.iter().all(|l| l.bias.len() == l.weights.ncols())
            && self
                .layers
                .windows(2)
                .all(|pair| pair[0].weights.ncols() == pair[1].weights.nrows())
    }

    /// Class probabilities for a batch (rows = samples), no dropout
    pub fn predict(&self, input: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut activation = input.to_owned();
        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            let z = layer.affine(activation.view());
            activation = if i == last { softmax(z) } else { z.mapv(relu) };
        }
        activation
    }

    fn forward_train<R: Rng>(&self, input: ArrayView2<'_, f64>, dropout: f64, rng: &mut R) -> ForwardPass {
        let last = self.layers.len() - 1;
        let keep = 1.0 - dropout;
        let mut inputs = vec![input.to_owned()];
        let mut pre_activations = Vec::with_capacity(last);
        let mut masks = Vec::with_capacity(last);

        for layer in &self.layers[..last] {
            let z = layer.affine(inputs[inputs.len() - 1].view());
            let mut a = z.mapv(relu);
            let mask = if dropout > 0.0 {
                let mask = Array2::from_shape_fn(a.raw_dim(), |_| {
                    if rng.gen::<f64>() < keep {
                        1.0 / keep
                    } else {
                        0.0
                    }
                });
                a *= &mask;
                Some(mask)
            } else {
                None
            };
            pre_activations.push(z);
            masks.push(mask);
            inputs.push(a);
        }

        let probabilities = softmax(self.layers[last].affine(inputs[last].view()));
        ForwardPass {
            inputs,
            pre_activations,
            masks,
            probabilities,
        }
    }

    fn backward(&self, pass: &ForwardPass, targets: ArrayView2<'_, f64>) -> Gradients {
        let batch = targets.nrows() as f64;
        let mut delta = (&pass.probabilities - &targets) / batch;
        let mut weights = Vec::with_capacity(self.layers.len());
        let mut bias = Vec::with_capacity(self.layers.len());

        for l in (0..self.layers.len()).rev() {
            weights.push(pass.inputs[l].t().dot(&delta));
            bias.push(delta.sum_axis(Axis(0)));
            if l > 0 {
                let mut upstream = delta.dot(&self.layers[l].weights.t());
                if let Some(mask) = &pass.masks[l - 1] {
                    upstream *= mask;
                }
                upstream.zip_mut_with(&pass.pre_activations[l - 1], |d, &z| {
                    if z <= 0.0 {
                        *d = 0.0;
                    }
                });
                delta = upstream;
            }
        }

        weights.reverse();
        bias.reverse();
        Gradients { weights, bias }
    }

    /// One optimisation step on a mini-batch; returns (loss, correct predictions)
    pub(crate) fn train_batch<R: Rng>(
        &mut self,
        input: ArrayView2<'_, f64>,
        targets: ArrayView2<'_, f64>,
        dropout: f64,
        optimizer: &mut Adam,
        rng: &mut R,
    ) -> (f64, usize) {
        let pass = self.forward_train(input, dropout, rng);
        let loss = cross_entropy(pass.probabilities.view(), targets) * targets.nrows() as f64;
        let correct = count_correct(pass.probabilities.view(), targets);
        let grads = self.backward(&pass, targets);
        optimizer.apply(self, &grads);
        (loss, correct)
    }
}

fn relu(x: f64) -> f64 {
    x.max(0.0)
}

/// Row-wise softmax
fn softmax(mut z: Array2<f64>) -> Array2<f64> {
    for mut row in z.outer_iter_mut() {
        let max = row.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row /= sum;
    }
    z
}

/// Mean categorical cross-entropy
pub(crate) fn cross_entropy(probabilities: ArrayView2<'_, f64>, targets: ArrayView2<'_, f64>) -> f64 {
    let n = probabilities.nrows().max(1) as f64;
    let total: f64 = probabilities
        .iter()
        .zip(targets.iter())
        .map(|(&p, &t)| -t * p.clamp(PROB_EPSILON, 1.0 - PROB_EPSILON).ln())
        .sum();
    total / n
}

/// Index of the largest value in a row
pub(crate) fn argmax(row: ndarray::ArrayView1<'_, f64>) -> usize {
    row.iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map_or(0, |(i, _)| i)
}

/// Rows whose arg-max matches the one-hot target
pub(crate) fn count_correct(probabilities: ArrayView2<'_, f64>, targets: ArrayView2<'_, f64>) -> usize {
    probabilities
        .outer_iter()
        .zip(targets.outer_iter())
        .filter(|(p, t)| argmax(p.view()) == argmax(t.view()))
        .count()
}
