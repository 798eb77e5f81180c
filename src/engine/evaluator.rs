// Benchmark Harness
// Repeated, non-overlapping runs of both engines over a core-budget sweep
use tracing::info;

use crate::engine::charges::Charge;
use crate::engine::grid::SampleGrid;
use crate::engine::parallel::ParallelElectricField;
use crate::engine::report::TimeReport;
use crate::engine::sequential::SequentialElectricField;
use crate::error::Result;

pub struct TimeEvaluator {
    sequential: SequentialElectricField,
    parallel: ParallelElectricField,
}

impl TimeEvaluator {
    /// Builds both engines over the same charges and warms the parallel one up.
    pub fn new(grid: SampleGrid, charges: Vec<Charge>) -> Result<Self> {
        let sequential = SequentialElectricField::new(grid.clone(), charges.clone())?;
        let parallel = ParallelElectricField::new(grid, charges)?;
        // Discarded run so pool start-up does not land in the first sample
        parallel.time_it(0.0)?;
        Ok(Self { sequential, parallel })
    }

    /// Averages `times` sequential runs, then `times` parallel runs for each
    /// core budget `1, 2, 4, ...` up to `max_number_of_cores`.
    pub fn process(&mut self, times: usize, max_number_of_cores: usize) -> Result<TimeReport> {
        let times = times.max(1);
        let mut report = TimeReport {
            sequential_time: 0.0,
            sequential_samples: Vec::with_capacity(times),
            number_of_cores: Vec::new(),
            parallel_time: Vec::new(),
            parallel_speedup: Vec::new(),
            parallel_efficiency: Vec::new(),
            parallel_samples: Vec::new(),
        };

        for _ in 0..times {
            let sample = self.sequential.time_it();
            report.sequential_time += sample.total_time / times as f64;
            report.sequential_samples.push(sample);
        }
        info!(mean = report.sequential_time, times, "sequential reference measured");

        let mut number_of_cores = 1;
        while number_of_cores <= max_number_of_cores {
            self.parallel.set_number_of_cores(number_of_cores)?;
            let (mut time, mut speedup, mut efficiency) = (0.0, 0.0, 0.0);
            let mut samples = Vec::with_capacity(times);
            for _ in 0..times {
                let sample = self.parallel.time_it(report.sequential_time)?;
                time += sample.total_time / times as f64;
                speedup += sample.speedup / times as f64;
                efficiency += sample.efficiency / times as f64;
                samples.push(sample);
            }
            info!(number_of_cores, time, speedup, efficiency, "parallel budget measured");

            report.number_of_cores.push(number_of_cores);
            report.parallel_time.push(time);
            report.parallel_speedup.push(speedup);
            report.parallel_efficiency.push(efficiency);
            report.parallel_samples.push(samples);
            number_of_cores *= 2;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::charges::PointChargeFlatland;

    #[test]
    fn sweep_covers_powers_of_two() {
        let grid = SampleGrid::new(
            (0..16).map(|j| j as f64 * 0.5 - 3.9).collect(),
            (0..12).map(|i| i as f64 * 0.5 - 2.9).collect(),
        )
        .unwrap();
        let charges = vec![
            PointChargeFlatland::new(2.0, [0.0, 0.0]).into(),
            PointChargeFlatland::new(-1.0, [2.0, 0.0]).into(),
        ];
        let mut evaluator = TimeEvaluator::new(grid, charges).unwrap();
        let report = evaluator.process(2, 16).unwrap();

        assert_eq!(report.number_of_cores, vec![1, 2, 4, 8, 16]);
        assert_eq!(report.sequential_samples.len(), 2);
        assert_eq!(report.parallel_time.len(), 5);
        assert!(report.parallel_samples.iter().all(|s| s.len() == 2));
        assert!(report.sequential_time > 0.0);
        for (efficiency, cores) in report.parallel_efficiency.iter().zip(&report.number_of_cores) {
            assert!(efficiency.is_finite() && *efficiency >= 0.0, "budget {cores}: {efficiency}");
        }
    }
}
