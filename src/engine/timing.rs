// Timing Contract
// Stage breakdowns handed to the benchmark harness, in seconds
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Pipeline stages shared by both engines, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    WorkspaceAllocated,
    VectorsComputed,
    MagnitudesReduced,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::WorkspaceAllocated => "workspace-allocated",
            PipelineStage::VectorsComputed => "vectors-computed",
            PipelineStage::MagnitudesReduced => "magnitudes-reduced",
        };
        f.write_str(name)
    }
}

/// Wall time of a parallel stage, split into host-side work
/// (launch setup and transfers) and kernel execution.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageSplit {
    pub transfer: Duration,
    pub kernel: Duration,
}

impl StageSplit {
    pub fn total(&self) -> Duration {
        self.transfer + self.kernel
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequentialTiming {
    pub total_time: f64,
    pub sequential_time: f64,
    /// `[allocation, vectors, magnitudes]`
    pub sequential_times: [f64; 3],
}

impl SequentialTiming {
    pub fn new(allocation: Duration, vectors: Duration, magnitudes: Duration) -> Self {
        let sequential_times = [
            allocation.as_secs_f64(),
            vectors.as_secs_f64(),
            magnitudes.as_secs_f64(),
        ];
        let total: f64 = sequential_times.iter().sum();
        Self {
            total_time: total,
            sequential_time: total,
            sequential_times,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelTiming {
    pub total_time: f64,
    /// `sequential reference time / parallel_time`
    pub speedup: f64,
    /// `speedup / number_of_cores`
    pub efficiency: f64,
    pub sequential_time: f64,
    /// `[allocation, vector transfers, magnitude transfers]`
    pub sequential_times: [f64; 3],
    pub parallel_time: f64,
    /// `[vector kernel, magnitude kernel]`
    pub parallel_times: [f64; 2],
}

impl ParallelTiming {
    pub fn new(
        reference_time: f64,
        number_of_cores: usize,
        allocation: Duration,
        vectors: StageSplit,
        magnitudes: StageSplit,
    ) -> Self {
        let sequential_times = [
            allocation.as_secs_f64(),
            vectors.transfer.as_secs_f64(),
            magnitudes.transfer.as_secs_f64(),
        ];
        let parallel_times = [vectors.kernel.as_secs_f64(), magnitudes.kernel.as_secs_f64()];
        let sequential_time: f64 = sequential_times.iter().sum();
        let parallel_time: f64 = parallel_times.iter().sum();
        let speedup = if parallel_time > 0.0 {
            reference_time / parallel_time
        } else {
            0.0
        };
        Self {
            total_time: sequential_time + parallel_time,
            speedup,
            efficiency: speedup / number_of_cores as f64,
            sequential_time,
            sequential_times,
            parallel_time,
            parallel_times,
        }
    }

    /// Time per stage including transfers: `[allocation, vectors, magnitudes]`.
    pub fn stage_times(&self) -> [f64; 3] {
        [
            self.sequential_times[0],
            self.sequential_times[1] + self.parallel_times[0],
            self.sequential_times[2] + self.parallel_times[1],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speedup_and_efficiency_follow_kernel_time() {
        let ms = Duration::from_millis;
        let timing = ParallelTiming::new(
            0.8,
            4,
            ms(10),
            StageSplit { transfer: ms(20), kernel: ms(300) },
            StageSplit { transfer: ms(30), kernel: ms(100) },
        );
        assert!((timing.parallel_time - 0.4).abs() < 1e-9);
        assert!((timing.speedup - 2.0).abs() < 1e-9);
        assert!((timing.efficiency - 0.5).abs() < 1e-9);
        assert!((timing.total_time - 0.46).abs() < 1e-9);
        let stages = timing.stage_times();
        assert!((stages[1] - 0.32).abs() < 1e-9);
    }

    #[test]
    fn sequential_total_is_sum_of_stages() {
        let ms = Duration::from_millis;
        let timing = SequentialTiming::new(ms(1), ms(2), ms(3));
        assert!((timing.total_time - 0.006).abs() < 1e-12);
        assert_eq!(timing.total_time, timing.sequential_time);
    }

    #[test]
    fn stage_names() {
        assert_eq!(PipelineStage::VectorsComputed.to_string(), "vectors-computed");
    }
}
