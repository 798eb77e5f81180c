// Report Persistence
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::engine::timing::{ParallelTiming, SequentialTiming};
use crate::error::Result;

/// Averaged timings of a benchmark run, one parallel entry per core budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeReport {
    /// Mean total time of the sequential engine
    pub sequential_time: f64,
    pub sequential_samples: Vec<SequentialTiming>,
    /// Core budgets swept, `1, 2, 4, ...`
    pub number_of_cores: Vec<usize>,
    pub parallel_time: Vec<f64>,
    pub parallel_speedup: Vec<f64>,
    pub parallel_efficiency: Vec<f64>,
    pub parallel_samples: Vec<Vec<ParallelTiming>>,
}

impl TimeReport {
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        info!(path = %path.display(), "report saved");
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Core budget with the highest mean speedup.
    pub fn best_speedup(&self) -> Option<(usize, f64)> {
        self.number_of_cores
            .iter()
            .copied()
            .zip(self.parallel_speedup.iter().copied())
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn report() -> TimeReport {
        let ms = Duration::from_millis;
        TimeReport {
            sequential_time: 0.006,
            sequential_samples: vec![SequentialTiming::new(ms(1), ms(2), ms(3))],
            number_of_cores: vec![1, 2, 4],
            parallel_time: vec![0.01, 0.006, 0.005],
            parallel_speedup: vec![0.9, 1.7, 1.5],
            parallel_efficiency: vec![0.9, 0.85, 0.375],
            parallel_samples: vec![vec![], vec![], vec![]],
        }
    }

    #[test]
    fn save_then_load() {
        let path = std::env::temp_dir().join(format!("efield-report-{}.json", std::process::id()));
        let saved = report();
        saved.save_json(&path).unwrap();
        let loaded = TimeReport::load_json(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, saved);
    }

    #[test]
    fn keyed_record_layout() {
        let value = serde_json::to_value(report()).unwrap();
        assert_eq!(value["number_of_cores"][2], 4);
        assert_eq!(value["sequential_samples"][0]["sequential_times"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn best_speedup_picks_the_peak() {
        assert_eq!(report().best_speedup(), Some((2, 1.7)));
    }
}
