pub mod gru;
pub mod predictor;
pub mod stats;

pub use gru::{GruRulModel, GruWeights};
pub use predictor::{Prediction, RulPredictor};
pub use stats::NormStats;
