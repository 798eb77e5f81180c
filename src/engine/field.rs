// Engine Interface
use ndarray::Array2;

use crate::engine::charges::Charge;
use crate::engine::grid::SampleGrid;
use crate::error::Result;

/// Output of one engine invocation, as consumed by renderers.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSolution {
    /// `(H, W)` log10 field magnitudes
    pub result: Array2<f64>,
    pub x: Array2<f64>,
    pub y: Array2<f64>,
}

/// Common surface of the sequential and parallel engines.
pub trait ElectricField {
    fn sample_grid(&self) -> &SampleGrid;

    fn charges(&self) -> &[Charge];

    /// Runs the full pipeline with construction-time state only.
    fn calculate(&self) -> Result<FieldSolution>;
}
