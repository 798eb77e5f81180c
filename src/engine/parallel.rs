// Parallel Engine
// Encoded charges + launch partitioning + device-resident workspace
use ndarray::{s, ArrayView1};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::engine::charges::{encode_charges, Charge, EncodedCharge};
use crate::engine::field::{ElectricField, FieldSolution};
use crate::engine::grid::SampleGrid;
use crate::engine::kernels::{field_vector, reduce_magnitude};
use crate::engine::memory::{DeviceArray, Workspace};
use crate::engine::partition::{launch, LaunchConfig};
use crate::engine::timing::{ParallelTiming, PipelineStage, StageSplit};
use crate::error::{Error, Result};

/// Data-parallel engine.
///
/// Charges are encoded once at construction. Each invocation mirrors the
/// workspace to device buffers, launches one unit per `(i, j, k)` for the
/// vector kernel and one per `(i, j)` for the magnitude kernel, and copies
/// results back to the host after each kernel. The copy-back/copy-in pair
/// between the two launches is the barrier the reduction relies on.
pub struct ParallelElectricField {
    grid: SampleGrid,
    charges: Vec<Charge>,
    encoded: Vec<EncodedCharge>,
    number_of_cores: usize,
    pool: ThreadPool,
}

impl ParallelElectricField {
    pub const DEFAULT_NUMBER_OF_CORES: usize = 1024;

    pub fn new(grid: SampleGrid, charges: Vec<Charge>) -> Result<Self> {
        Self::with_cores(grid, charges, Self::DEFAULT_NUMBER_OF_CORES)
    }

    pub fn with_cores(
        grid: SampleGrid,
        charges: Vec<Charge>,
        number_of_cores: usize,
    ) -> Result<Self> {
        let encoded = encode_charges(&charges)?;
        let pool = build_pool(number_of_cores)?;
        info!(
            height = grid.height(),
            width = grid.width(),
            charges = charges.len(),
            number_of_cores,
            workers = pool.current_num_threads(),
            "parallel engine ready"
        );
        Ok(Self {
            grid,
            charges,
            encoded,
            number_of_cores,
            pool,
        })
    }

    pub fn number_of_cores(&self) -> usize {
        self.number_of_cores
    }

    /// Changes the launch budget for subsequent invocations.
    pub fn set_number_of_cores(&mut self, number_of_cores: usize) -> Result<()> {
        if number_of_cores != self.number_of_cores {
            self.pool = build_pool(number_of_cores)?;
            self.number_of_cores = number_of_cores;
            debug!(number_of_cores, workers = self.pool.current_num_threads(), "budget changed");
        }
        Ok(())
    }

    pub fn encoded_charges(&self) -> &[EncodedCharge] {
        &self.encoded
    }

    /// Runs the pipeline once; `sequential_time` is the reference engine's
    /// total time used for speedup.
    pub fn time_it(&self, sequential_time: f64) -> Result<ParallelTiming> {
        let (_, allocation, vectors, magnitudes) = self.run()?;
        Ok(ParallelTiming::new(
            sequential_time,
            self.number_of_cores,
            allocation,
            vectors,
            magnitudes,
        ))
    }

    fn run(&self) -> Result<(Workspace, Duration, StageSplit, StageSplit)> {
        let start = Instant::now();
        let mut ws = Workspace::allocate(&self.grid, self.charges.len());
        let allocation = start.elapsed();
        debug!(stage = %PipelineStage::WorkspaceAllocated, elapsed = ?allocation);

        let vectors = self.compute_field_vectors(&mut ws)?;
        debug!(
            stage = %PipelineStage::VectorsComputed,
            transfer = ?vectors.transfer,
            kernel = ?vectors.kernel
        );

        let magnitudes = self.compute_magnitudes(&mut ws)?;
        debug!(
            stage = %PipelineStage::MagnitudesReduced,
            transfer = ?magnitudes.transfer,
            kernel = ?magnitudes.kernel
        );

        Ok((ws, allocation, vectors, magnitudes))
    }

    fn compute_field_vectors(&self, ws: &mut Workspace) -> Result<StageSplit> {
        // 1. Launch setup and host -> device
        let start = Instant::now();
        let (height, width, count) = ws.shape();
        let shape = [height, width, count];
        let config = LaunchConfig::for_shape(shape, self.number_of_cores)?;
        let mut device_partial = DeviceArray::to_device(&ws.partial);
        let device_x = DeviceArray::to_device(&ws.x);
        let device_y = DeviceArray::to_device(&ws.y);
        let device_charges = DeviceArray::to_device(&ArrayView1::from(self.encoded.as_slice()));
        let mut transfer = start.elapsed();

        // 2. One unit per (i, j, k); each owns the two values at partial[i, j, k, ..]
        let start = Instant::now();
        let out = device_partial.device_ptr();
        let (x, y, charges) = (device_x.view(), device_y.view(), device_charges.view());
        self.pool.install(|| {
            launch(&config, shape, |[i, j, k]| {
                let e = field_vector(x[[i, j]], y[[i, j]], &charges[k]);
                let offset = ((i * width + j) * count + k) * 2;
                // SAFETY: offsets are distinct per (i, j, k) and inside the buffer
                unsafe {
                    out.write(offset, e.re);
                    out.write(offset + 1, e.im);
                }
            })
        });
        let kernel = start.elapsed();

        // 3. Device -> host
        let start = Instant::now();
        device_partial.copy_to_host(&mut ws.partial)?;
        transfer += start.elapsed();

        Ok(StageSplit { transfer, kernel })
    }

    fn compute_magnitudes(&self, ws: &mut Workspace) -> Result<StageSplit> {
        let start = Instant::now();
        let (height, width, _) = ws.shape();
        let shape = [height, width];
        let config = LaunchConfig::for_shape(shape, self.number_of_cores)?;
        let device_partial = DeviceArray::to_device(&ws.partial);
        let mut device_result = DeviceArray::to_device(&ws.result);
        let mut transfer = start.elapsed();

        let start = Instant::now();
        let out = device_result.device_ptr();
        let partial = device_partial.view();
        self.pool.install(|| {
            launch(&config, shape, |[i, j]| {
                let value = reduce_magnitude(partial.slice(s![i, j, .., ..]));
                // SAFETY: one unit per (i, j)
                unsafe { out.write(i * width + j, value) };
            })
        });
        let kernel = start.elapsed();

        let start = Instant::now();
        device_result.copy_to_host(&mut ws.result)?;
        transfer += start.elapsed();

        Ok(StageSplit { transfer, kernel })
    }
}

impl ElectricField for ParallelElectricField {
    fn sample_grid(&self) -> &SampleGrid {
        &self.grid
    }

    fn charges(&self) -> &[Charge] {
        &self.charges
    }

    fn calculate(&self) -> Result<FieldSolution> {
        let (ws, ..) = self.run()?;
        Ok(FieldSolution {
            result: ws.result,
            x: ws.x,
            y: ws.y,
        })
    }
}

/// Worker pool capped at `min(number_of_cores, available parallelism)`.
fn build_pool(number_of_cores: usize) -> Result<ThreadPool> {
    if number_of_cores == 0 {
        return Err(Error::InvalidLaunch {
            shape: vec![],
            max_units: 0,
        });
    }
    let available = std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    let pool = ThreadPoolBuilder::new()
        .num_threads(number_of_cores.min(available))
        .thread_name(|i| format!("efield-worker-{i}"))
        .build()?;
    Ok(pool)
}
