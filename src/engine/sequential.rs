// Sequential Engine
// Single-threaded reference pipeline over charge objects
use ndarray::s;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::engine::charges::{Charge, ChargeField};
use crate::engine::field::{ElectricField, FieldSolution};
use crate::engine::grid::SampleGrid;
use crate::engine::kernels::reduce_magnitude;
use crate::engine::memory::Workspace;
use crate::engine::timing::{PipelineStage, SequentialTiming};
use crate::error::{Error, Result};

/// Reference implementation: nested loops, one execution order.
///
/// Charges are evaluated through [`ChargeField`] directly; no encoding step.
/// Every other engine is checked against this one.
#[derive(Debug, Clone)]
pub struct SequentialElectricField {
    grid: SampleGrid,
    charges: Vec<Charge>,
}

impl SequentialElectricField {
    pub fn new(grid: SampleGrid, charges: Vec<Charge>) -> Result<Self> {
        if charges.is_empty() {
            return Err(Error::EmptyChargeSet);
        }
        info!(
            height = grid.height(),
            width = grid.width(),
            charges = charges.len(),
            "sequential engine ready"
        );
        Ok(Self { grid, charges })
    }

    /// Runs the pipeline once and reports how long each stage took.
    pub fn time_it(&self) -> SequentialTiming {
        let (_, allocation, vectors, magnitudes) = self.run();
        SequentialTiming::new(allocation, vectors, magnitudes)
    }

    fn run(&self) -> (Workspace, Duration, Duration, Duration) {
        let start = Instant::now();
        let mut ws = Workspace::allocate(&self.grid, self.charges.len());
        let allocation = start.elapsed();
        debug!(stage = %PipelineStage::WorkspaceAllocated, elapsed = ?allocation);

        let start = Instant::now();
        self.compute_field_vectors(&mut ws);
        let vectors = start.elapsed();
        debug!(stage = %PipelineStage::VectorsComputed, elapsed = ?vectors);

        let start = Instant::now();
        Self::compute_magnitudes(&mut ws);
        let magnitudes = start.elapsed();
        debug!(stage = %PipelineStage::MagnitudesReduced, elapsed = ?magnitudes);

        (ws, allocation, vectors, magnitudes)
    }

    fn compute_field_vectors(&self, ws: &mut Workspace) {
        let (height, width, _) = ws.shape();
        for i in 0..height {
            for j in 0..width {
                let position = [ws.x[[i, j]], ws.y[[i, j]]];
                for (k, charge) in self.charges.iter().enumerate() {
                    let e = charge.field_at(position);
                    ws.partial[[i, j, k, 0]] = e.re;
                    ws.partial[[i, j, k, 1]] = e.im;
                }
            }
        }
    }

    fn compute_magnitudes(ws: &mut Workspace) {
        let (height, width, _) = ws.shape();
        for i in 0..height {
            for j in 0..width {
                ws.result[[i, j]] = reduce_magnitude(ws.partial.slice(s![i, j, .., ..]));
            }
        }
    }
}

impl ElectricField for SequentialElectricField {
    fn sample_grid(&self) -> &SampleGrid {
        &self.grid
    }

    fn charges(&self) -> &[Charge] {
        &self.charges
    }

    fn calculate(&self) -> Result<FieldSolution> {
        let (ws, ..) = self.run();
        Ok(FieldSolution {
            result: ws.result,
            x: ws.x,
            y: ws.y,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::charges::{LineCharge, PointChargeFlatland};

    fn small_grid() -> SampleGrid {
        SampleGrid::new(vec![-2.5, -0.5, 0.5, 2.5], vec![-1.5, 0.5, 1.5]).unwrap()
    }

    #[test]
    fn rejects_empty_charge_set() {
        assert!(matches!(
            SequentialElectricField::new(small_grid(), vec![]),
            Err(Error::EmptyChargeSet)
        ));
    }

    #[test]
    fn result_matches_direct_superposition() {
        let charges: Vec<Charge> = vec![
            PointChargeFlatland::new(2.0, [0.0, 0.0]).into(),
            LineCharge::new(1.0, [-1.0, -2.0], [-1.0, 2.0]).into(),
        ];
        let engine = SequentialElectricField::new(small_grid(), charges.clone()).unwrap();
        let solution = engine.calculate().unwrap();
        assert_eq!(solution.result.shape(), &[3, 4]);

        let p = [solution.x[[1, 2]], solution.y[[1, 2]]];
        assert_eq!(p, [0.5, 0.5]);
        let total = charges[0].field_at(p) + charges[1].field_at(p);
        assert!((solution.result[[1, 2]] - total.norm().log10()).abs() < 1e-12);
    }

    #[test]
    fn timing_reports_three_stages() {
        let engine = SequentialElectricField::new(
            small_grid(),
            vec![PointChargeFlatland::new(1.0, [0.0, 0.0]).into()],
        )
        .unwrap();
        let timing = engine.time_it();
        let sum: f64 = timing.sequential_times.iter().sum();
        assert!((timing.total_time - sum).abs() < 1e-12);
        assert!(timing.sequential_times.iter().all(|t| *t >= 0.0));
    }
}
