use anyhow::{anyhow, Result};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// On-disk weight export for the pretrained network. Matrices are flattened
/// row-major; the three GRU gates are stacked reset, update, new along the
/// first axis, matching the layout the training exporter emits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GruWeights {
    pub input_size: usize,
    pub hidden_size: usize,
    pub weight_ih: Vec<f64>,
    pub weight_hh: Vec<f64>,
    pub bias_ih: Vec<f64>,
    pub bias_hh: Vec<f64>,
    pub fc_weight: Vec<f64>,
    pub fc_bias: f64,
}

/// Single-layer GRU followed by a dense head producing one scalar RUL value.
#[derive(Debug, Clone)]
pub struct GruRulModel {
    input_size: usize,
    hidden_size: usize,
    weight_ih: Array2<f64>,
    weight_hh: Array2<f64>,
    bias_ih: Array1<f64>,
    bias_hh: Array1<f64>,
    fc_weight: Array1<f64>,
    fc_bias: f64,
}

impl GruRulModel {
    /// Load weights from a JSON export on disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow!("Failed to read weight file {}: {}", path.as_ref().display(), e))?;
        let weights: GruWeights = serde_json::from_str(&raw)?;
        let model = Self::from_weights(weights)?;
        info!(
            "GRU weights loaded: input_size={}, hidden_size={}",
            model.input_size, model.hidden_size
        );
        Ok(model)
    }

    /// Build the model, validating every tensor against the declared sizes.
    pub fn from_weights(w: GruWeights) -> Result<Self> {
        let (i, h) = (w.input_size, w.hidden_size);
        if i == 0 || h == 0 {
            return Err(anyhow!("input_size and hidden_size must be > 0"));
        }

        check_len("weight_ih", w.weight_ih.len(), 3 * h * i)?;
        check_len("weight_hh", w.weight_hh.len(), 3 * h * h)?;
        check_len("bias_ih", w.bias_ih.len(), 3 * h)?;
        check_len("bias_hh", w.bias_hh.len(), 3 * h)?;
        check_len("fc_weight", w.fc_weight.len(), h)?;

        Ok(Self {
            input_size: i,
            hidden_size: h,
            weight_ih: Array2::from_shape_vec((3 * h, i), w.weight_ih)?,
            weight_hh: Array2::from_shape_vec((3 * h, h), w.weight_hh)?,
            bias_ih: Array1::from_vec(w.bias_ih),
            bias_hh: Array1::from_vec(w.bias_hh),
            fc_weight: Array1::from_vec(w.fc_weight),
            fc_bias: w.fc_bias,
        })
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_size
    }

    /// One forward pass over a normalized `(seq_len x input_size)` window.
    /// The hidden state starts at zero and the dense head reads the final
    /// hidden state only.
    pub fn forward(&self, window: &Array2<f64>) -> Result<f64> {
        if window.ncols() != self.input_size {
            return Err(anyhow!(
                "Window has {} columns, model expects {}",
                window.ncols(),
                self.input_size
            ));
        }

        let mut h = Array1::<f64>::zeros(self.hidden_size);
        for t in 0..window.nrows() {
            h = self.step(window.row(t), &h);
        }

        Ok(self.fc_weight.dot(&h) + self.fc_bias)
    }

    fn step(&self, x: ArrayView1<'_, f64>, h: &Array1<f64>) -> Array1<f64> {
        let hs = self.hidden_size;

        // Gate pre-activations for the whole stack at once.
        let gi = self.weight_ih.dot(&x) + &self.bias_ih;
        let gh = self.weight_hh.dot(h) + &self.bias_hh;

        let mut next = Array1::<f64>::zeros(hs);
        for k in 0..hs {
            let r = sigmoid(gi[k] + gh[k]);
            let z = sigmoid(gi[hs + k] + gh[hs + k]);
            let n = (gi[2 * hs + k] + r * gh[2 * hs + k]).tanh();
            next[k] = (1.0 - z) * n + z * h[k];
        }
        next
    }
}

fn check_len(name: &str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(anyhow!("{} length mismatch: expected {}, got {}", name, expected, got));
    }
    Ok(())
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
