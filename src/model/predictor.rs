use anyhow::{anyhow, Result};
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

use crate::data::SensorFrame;
use crate::error::PredictError;
use crate::types::HealthStatus;

use super::{GruRulModel, NormStats};

/// Outcome of one forward pass, before HTTP metadata is attached.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub rul: f64,
    pub status: HealthStatus,
    pub cycles_analyzed: usize,
}

/// Pretrained GRU plus the normalization statistics it was trained with.
/// Loaded once at startup and shared read-only for the process lifetime.
pub struct RulPredictor {
    model: GruRulModel,
    stats: NormStats,
}

impl RulPredictor {
    pub fn load(weights_path: impl AsRef<Path>, stats_path: impl AsRef<Path>) -> Result<Self> {
        let stats = NormStats::load(stats_path)?;
        let model = GruRulModel::load(weights_path)?;
        let predictor = Self::new(model, stats)?;
        info!(
            "Predictor ready: {} features, window of {} cycles",
            predictor.feature_cols().len(),
            predictor.seq_len()
        );
        Ok(predictor)
    }

    pub fn new(model: GruRulModel, stats: NormStats) -> Result<Self> {
        if model.input_size() != stats.feature_cols().len() {
            return Err(anyhow!(
                "Model expects {} inputs but stats describe {} features",
                model.input_size(),
                stats.feature_cols().len()
            ));
        }
        Ok(Self { model, stats })
    }

    pub fn feature_cols(&self) -> &[String] {
        self.stats.feature_cols()
    }

    pub fn seq_len(&self) -> usize {
        self.stats.seq_len()
    }

    pub fn input_size(&self) -> usize {
        self.model.input_size()
    }

    pub fn hidden_size(&self) -> usize {
        self.model.hidden_size()
    }

    /// Run the full pipeline on an uploaded frame: validate columns, take the
    /// trailing window, normalize, forward, bucket.
    pub fn predict(&self, frame: &SensorFrame) -> Result<Prediction, PredictError> {
        let missing = frame.missing_columns(self.stats.feature_cols());
        if !missing.is_empty() {
            return Err(PredictError::MissingColumns(missing));
        }

        let seq_len = self.stats.seq_len();
        let mut window = frame.tail_matrix(self.stats.feature_cols(), seq_len)?;
        self.stats.normalize(&mut window);

        let raw = self.model.forward(&window).map_err(PredictError::from)?;
        let status = HealthStatus::from_rul(raw);
        debug!("Forward pass output {:.4} -> {}", raw, status);

        Ok(Prediction {
            rul: (raw * 100.0).round() / 100.0,
            status,
            cycles_analyzed: seq_len,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GruWeights;

    /// Zero GRU weights leave the hidden state at zero, so the predicted RUL
    /// is exactly the head bias regardless of input values.
    fn fixed_output_predictor(fc_bias: f64) -> RulPredictor {
        let weights = GruWeights {
            input_size: 2,
            hidden_size: 2,
            weight_ih: vec![0.0; 12],
            weight_hh: vec![0.0; 12],
            bias_ih: vec![0.0; 6],
            bias_hh: vec![0.0; 6],
            fc_weight: vec![0.0; 2],
            fc_bias,
        };
        let stats = NormStats::from_json(
            r#"{
                "feature_cols": ["s1", "s2"],
                "feature_means": {"s1": 0.0, "s2": 0.0},
                "feature_stds_safe": {"s1": 1.0, "s2": 1.0},
                "seq_len": 3
            }"#,
        )
        .unwrap();
        RulPredictor::new(GruRulModel::from_weights(weights).unwrap(), stats).unwrap()
    }

    fn frame(rows: usize) -> SensorFrame {
        let mut csv = String::from("cycle,s1,s2\n");
        for i in 1..=rows {
            csv.push_str(&format!("{i},0.{i},1.{i}\n"));
        }
        SensorFrame::from_csv_bytes(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_predict_healthy_band() {
        let prediction = fixed_output_predictor(120.0).predict(&frame(5)).unwrap();
        assert_eq!(prediction.rul, 120.0);
        assert_eq!(prediction.status, HealthStatus::Healthy);
        assert_eq!(prediction.cycles_analyzed, 3);
    }

    #[test]
    fn test_predict_boundary_100_is_monitor() {
        let prediction = fixed_output_predictor(100.0).predict(&frame(5)).unwrap();
        assert_eq!(prediction.status, HealthStatus::Monitor);
    }

    #[test]
    fn test_predict_boundary_50_is_critical() {
        let prediction = fixed_output_predictor(50.0).predict(&frame(5)).unwrap();
        assert_eq!(prediction.status, HealthStatus::Critical);
    }

    #[test]
    fn test_predict_rounds_to_two_decimals() {
        let prediction = fixed_output_predictor(77.7777).predict(&frame(5)).unwrap();
        assert_eq!(prediction.rul, 77.78);
    }

    #[test]
    fn test_predict_rejects_short_frame() {
        let err = fixed_output_predictor(80.0).predict(&frame(2)).unwrap_err();
        match err {
            PredictError::InsufficientRows { needed, got } => {
                assert_eq!(needed, 3);
                assert_eq!(got, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_predict_reports_all_missing_columns() {
        let predictor = fixed_output_predictor(80.0);
        let frame = SensorFrame::from_csv_bytes(b"cycle,other\n1,0.5\n2,0.6\n3,0.7\n").unwrap();
        let err = predictor.predict(&frame).unwrap_err();
        match err {
            PredictError::MissingColumns(cols) => {
                assert_eq!(cols, vec!["s1".to_string(), "s2".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_new_rejects_feature_count_mismatch() {
        let weights = GruWeights {
            input_size: 3,
            hidden_size: 1,
            weight_ih: vec![0.0; 9],
            weight_hh: vec![0.0; 3],
            bias_ih: vec![0.0; 3],
            bias_hh: vec![0.0; 3],
            fc_weight: vec![0.0],
            fc_bias: 0.0,
        };
        let stats = NormStats::from_json(
            r#"{
                "feature_cols": ["s1"],
                "feature_means": {"s1": 0.0},
                "feature_stds_safe": {"s1": 1.0},
                "seq_len": 2
            }"#,
        )
        .unwrap();
        assert!(RulPredictor::new(GruRulModel::from_weights(weights).unwrap(), stats).is_err());
    }
}
