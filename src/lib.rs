//! Log-magnitude electric field of heterogeneous charge sets over a 2D
//! sample grid, computed by a sequential reference engine and by a
//! data-parallel engine with a configurable core budget.

pub mod config;
pub mod engine;
pub mod error;

pub use config::{Scenario, ViewportConfig};
pub use engine::charges::{
    Charge, ChargeField, ChargeKind, EncodedCharge, LineCharge, PointCharge, PointChargeFlatland,
};
pub use engine::evaluator::TimeEvaluator;
pub use engine::field::{ElectricField, FieldSolution};
pub use engine::grid::SampleGrid;
pub use engine::parallel::ParallelElectricField;
pub use engine::partition::LaunchConfig;
pub use engine::report::TimeReport;
pub use engine::sequential::SequentialElectricField;
pub use error::{Error, Result};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module definition
#[cfg(feature = "python")]
#[pymodule]
fn efield_core(_py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Expose both engines to Python
    m.add_class::<engine::controller::PySequentialElectricField>()?;
    m.add_class::<engine::controller::PyParallelElectricField>()?;
    Ok(())
}
