//! Capacity-unit inference
//!
//! The regression model is an opaque, pre-fitted artifact consumed
//! through [`CapacityModel`]. Load and prediction failures are fatal to
//! the run; inference is a precondition for any cost output.

mod onnx;

pub use onnx::OnnxCapacityModel;

use crate::error::ModelError;
use crate::models::FeatureRow;

/// Number of numeric features per row; see [`FeatureRow::features`].
pub const NUM_FEATURES: usize = 3;

/// A fitted regression model mapping feature rows to capacity units.
pub trait CapacityModel: Send + Sync {
    /// One predicted capacity-unit value per input row.
    fn predict(&self, rows: &[FeatureRow]) -> Result<Vec<f64>, ModelError>;
}
