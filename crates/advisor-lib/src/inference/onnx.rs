//! ONNX regression artifact loaded via tract

use super::{CapacityModel, NUM_FEATURES};
use crate::error::ModelError;
use crate::models::FeatureRow;
use std::path::Path;
use tract_onnx::prelude::*;
use tracing::debug;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Pre-fitted capacity-unit regressor, loaded once per run.
#[derive(Debug)]
pub struct OnnxCapacityModel {
    plan: TractModel,
}

impl OnnxCapacityModel {
    /// Load and optimize the artifact from disk.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|model| model.with_input_fact(0, f32::fact([1, NUM_FEATURES]).into()))
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|err| ModelError::Load {
                path: path.to_path_buf(),
                message: format!("{err:#}"),
            })?;
        debug!(path = %path.display(), "model artifact loaded");
        Ok(Self { plan })
    }

    fn run_row(&self, row: &FeatureRow, index: usize) -> Result<f64, ModelError> {
        let input = tract_ndarray::Array2::from_shape_vec(
            (1, NUM_FEATURES),
            row.features().to_vec(),
        )
        .map_err(|err| ModelError::Predict {
            row: index,
            message: err.to_string(),
        })?;

        let outputs = self
            .plan
            .run(tvec!(Tensor::from(input).into()))
            .map_err(|err| ModelError::Predict {
                row: index,
                message: format!("{err:#}"),
            })?;
        let output = outputs.first().ok_or_else(|| ModelError::Predict {
            row: index,
            message: "model produced no output".to_string(),
        })?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|err| ModelError::Predict {
                row: index,
                message: format!("{err:#}"),
            })?;
        let value = view.iter().next().copied().ok_or_else(|| ModelError::Predict {
            row: index,
            message: "model output was empty".to_string(),
        })?;
        Ok(f64::from(value))
    }
}

impl CapacityModel for OnnxCapacityModel {
    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>, ModelError> {
        rows.iter()
            .enumerate()
            .map(|(index, row)| self.run_row(row, index))
            .collect()
    }
}
