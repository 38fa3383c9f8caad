use ndarray::Array2;
use std::collections::HashMap;

use crate::error::PredictError;

/// Column holding the running cycle counter. Optional in uploads; only used
/// for response metadata, never as a model feature.
const CYCLE_COLUMN: &str = "cycle";

/// In-memory view of an uploaded sensor CSV: one header row, then one record
/// per operational cycle.
#[derive(Debug, Clone)]
pub struct SensorFrame {
    headers: Vec<String>,
    index: HashMap<String, usize>,
    records: Vec<csv::StringRecord>,
}

impl SensorFrame {
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self, PredictError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let index = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.clone(), i))
            .collect();

        let mut records = Vec::new();
        for record in reader.records() {
            records.push(record?);
        }

        Ok(Self { headers, index, records })
    }

    pub fn n_rows(&self) -> usize {
        self.records.len()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Every required column absent from the header, in the order required.
    pub fn missing_columns(&self, required: &[String]) -> Vec<String> {
        required
            .iter()
            .filter(|c| !self.index.contains_key(c.as_str()))
            .cloned()
            .collect()
    }

    /// Extract the last `n` rows of the given columns as an `n x cols.len()`
    /// matrix. Row numbers in errors are 1-based data rows (header excluded).
    pub fn tail_matrix(&self, cols: &[String], n: usize) -> Result<Array2<f64>, PredictError> {
        if self.records.len() < n {
            return Err(PredictError::InsufficientRows {
                needed: n,
                got: self.records.len(),
            });
        }
        let start = self.records.len() - n;

        let mut out = Array2::zeros((n, cols.len()));
        for (j, col) in cols.iter().enumerate() {
            let ci = *self
                .index
                .get(col.as_str())
                .ok_or_else(|| PredictError::MissingColumns(vec![col.clone()]))?;

            for (i, record) in self.records[start..].iter().enumerate() {
                let raw = record.get(ci).unwrap_or("");
                out[[i, j]] = raw.parse::<f64>().map_err(|_| PredictError::InvalidValue {
                    column: col.clone(),
                    row: start + i + 1,
                })?;
            }
        }

        Ok(out)
    }

    /// Highest value of the optional `cycle` column, as an integer.
    pub fn last_cycle(&self) -> Option<i64> {
        let ci = *self.index.get(CYCLE_COLUMN)?;
        self.records
            .iter()
            .filter_map(|r| r.get(ci).and_then(|v| v.parse::<f64>().ok()))
            .fold(None, |acc: Option<f64>, v| {
                Some(acc.map_or(v, |a| a.max(v)))
            })
            .map(|v| v as i64)
    }
}
