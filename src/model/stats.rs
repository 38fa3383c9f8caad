use anyhow::{anyhow, Result};
use ndarray::{Array1, Array2};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Sidecar file written by the training pipeline next to the weights.
#[derive(Debug, Clone, Deserialize)]
struct RawStats {
    feature_cols: Vec<String>,
    feature_means: HashMap<String, f64>,
    feature_stds_safe: HashMap<String, f64>,
    seq_len: usize,
}

/// Per-feature normalization statistics, reordered to match `feature_cols`
/// so the hot path never does a map lookup.
#[derive(Debug, Clone)]
pub struct NormStats {
    feature_cols: Vec<String>,
    means: Array1<f64>,
    stds: Array1<f64>,
    seq_len: usize,
}

impl NormStats {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow!("Failed to read stats file {}: {}", path.as_ref().display(), e))?;
        let stats = Self::from_json(&raw)?;
        info!(
            "Normalization stats loaded: {} features, seq_len={}",
            stats.feature_cols.len(),
            stats.seq_len
        );
        Ok(stats)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let raw: RawStats = serde_json::from_str(raw)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawStats) -> Result<Self> {
        if raw.feature_cols.is_empty() {
            return Err(anyhow!("feature_cols must not be empty"));
        }
        if raw.seq_len == 0 {
            return Err(anyhow!("seq_len must be > 0"));
        }

        let mut means = Vec::with_capacity(raw.feature_cols.len());
        let mut stds = Vec::with_capacity(raw.feature_cols.len());
        for col in &raw.feature_cols {
            let mean = raw
                .feature_means
                .get(col)
                .copied()
                .ok_or_else(|| anyhow!("No mean recorded for feature '{}'", col))?;
            let std = raw
                .feature_stds_safe
                .get(col)
                .copied()
                .ok_or_else(|| anyhow!("No std recorded for feature '{}'", col))?;
            if std <= 0.0 || !std.is_finite() {
                return Err(anyhow!("Non-positive std for feature '{}': {}", col, std));
            }
            means.push(mean);
            stds.push(std);
        }

        Ok(Self {
            feature_cols: raw.feature_cols,
            means: Array1::from_vec(means),
            stds: Array1::from_vec(stds),
            seq_len: raw.seq_len,
        })
    }

    pub fn feature_cols(&self) -> &[String] {
        &self.feature_cols
    }

    pub fn seq_len(&self) -> usize {
        self.seq_len
    }

    /// Z-score each cell in place using the stored training statistics.
    /// Columns must be ordered as `feature_cols`.
    pub fn normalize(&self, window: &mut Array2<f64>) {
        for j in 0..self.feature_cols.len() {
            let (mean, std) = (self.means[j], self.stds[j]);
            for i in 0..window.nrows() {
                window[[i, j]] = (window[[i, j]] - mean) / std;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(cols: &[(&str, f64, f64)], seq_len: usize) -> RawStats {
        RawStats {
            feature_cols: cols.iter().map(|(c, _, _)| c.to_string()).collect(),
            feature_means: cols.iter().map(|(c, m, _)| (c.to_string(), *m)).collect(),
            feature_stds_safe: cols.iter().map(|(c, _, s)| (c.to_string(), *s)).collect(),
            seq_len,
        }
    }

    #[test]
    fn test_normalize_applies_training_stats() {
        let stats = NormStats::from_raw(raw(&[("s1", 10.0, 2.0), ("s2", 0.0, 0.5)], 3)).unwrap();
        let mut window = Array2::from_shape_vec((2, 2), vec![12.0, 1.0, 8.0, -1.0]).unwrap();
        stats.normalize(&mut window);
        assert_eq!(window[[0, 0]], 1.0);
        assert_eq!(window[[0, 1]], 2.0);
        assert_eq!(window[[1, 0]], -1.0);
        assert_eq!(window[[1, 1]], -2.0);
    }

    #[test]
    fn test_rejects_missing_mean() {
        let mut r = raw(&[("s1", 1.0, 1.0)], 3);
        r.feature_cols.push("s2".to_string());
        let err = NormStats::from_raw(r).unwrap_err();
        assert!(err.to_string().contains("s2"));
    }

    #[test]
    fn test_rejects_non_positive_std() {
        let err = NormStats::from_raw(raw(&[("s1", 1.0, 0.0)], 3)).unwrap_err();
        assert!(err.to_string().contains("std"));
    }

    #[test]
    fn test_rejects_zero_seq_len() {
        assert!(NormStats::from_raw(raw(&[("s1", 1.0, 1.0)], 0)).is_err());
    }
}
