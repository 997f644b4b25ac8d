//! Per-feature standardisation

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Centres each feature on its training mean and scales to unit variance.
///
/// Features with zero variance keep a scale of 1 so they pass through
/// centred but unscaled.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(rows: &[Vec<f64>]) -> AppResult<Self> {
        let width = rows
            .first()
            .map(Vec::len)
            .ok_or_else(|| AppError::Training("cannot fit a scaler on zero rows".into()))?;
        if rows.iter().any(|r| r.len() != width) {
            return Err(AppError::Training("scaler rows must have equal width".into()));
        }

        let n = rows.len() as f64;
        let mut mean = vec![0.0; width];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v / n;
            }
        }

        let mut variance = vec![0.0; width];
        for row in rows {
            for ((var, v), m) in variance.iter_mut().zip(row).zip(&mean) {
                *var += (v - m).powi(2) / n;
            }
        }

        let scale = variance
            .into_iter()
            .map(|var| {
                let sd = var.sqrt();
                if sd > f64::EPSILON {
                    sd
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn transform(&self, row: &[f64]) -> AppResult<Vec<f64>> {
        if row.len() != self.mean.len() {
            return Err(AppError::ModelInference(format!(
                "scaler expects {} features, got {}",
                self.mean.len(),
                row.len()
            )));
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(v, (m, s))| (v - m) / s)
            .collect())
    }

    pub fn transform_all(&self, rows: &[Vec<f64>]) -> AppResult<Vec<Vec<f64>>> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}
