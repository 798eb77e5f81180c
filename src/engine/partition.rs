// Work Partitioner
// Maps a D-dimensional output shape onto (grid x block) launch units
use rayon::prelude::*;

use crate::error::{Error, Result};

/// Execution decomposition of a target shape.
///
/// `block` is the same edge `b` on every axis, chosen so that `b^D <= N + 1`
/// for a budget of `N` parallel units; `grid` is the ceiling division of the
/// shape by `b`, so the launch may over-cover the shape at its far edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchConfig<const D: usize> {
    pub grid: [usize; D],
    pub block: [usize; D],
}

impl<const D: usize> LaunchConfig<D> {
    /// Computes the launch covering `shape` under a budget of `max_units`.
    pub fn for_shape(shape: [usize; D], max_units: usize) -> Result<Self> {
        if D == 0 || max_units == 0 || shape.iter().any(|&extent| extent == 0) {
            return Err(Error::InvalidLaunch {
                shape: shape.to_vec(),
                max_units,
            });
        }

        let edge = block_edge(max_units, D);
        let block = [edge; D];
        let grid = shape.map(|extent| extent.div_ceil(edge));
        Ok(Self { grid, block })
    }

    pub fn block_count(&self) -> usize {
        self.grid.iter().product()
    }

    pub fn units_per_block(&self) -> usize {
        self.block.iter().product()
    }

    /// True when every axis satisfies `grid[d] * block[d] >= shape[d]`.
    pub fn covers(&self, shape: [usize; D]) -> bool {
        (0..D).all(|d| self.grid[d] * self.block[d] >= shape[d])
    }
}

/// Largest `b` with `b^dimensions <= max_units + 1`, i.e. `floor((N+1)^(1/D))`.
pub fn block_edge(max_units: usize, dimensions: usize) -> usize {
    let target = max_units.saturating_add(1);
    let exponent = dimensions as u32;
    let fits = |b: usize| b.checked_pow(exponent).is_some_and(|v| v <= target);

    // Float estimate first, then integer correction for rounding at exact powers
    let mut edge = ((target as f64).powf(1.0 / dimensions as f64).floor() as usize).max(1);
    while edge > 1 && !fits(edge) {
        edge -= 1;
    }
    while fits(edge + 1) {
        edge += 1;
    }
    edge
}

/// Row-major unravel of a linear index over `extents` (last axis fastest).
#[inline]
fn unravel<const D: usize>(mut linear: usize, extents: &[usize; D]) -> [usize; D] {
    let mut index = [0; D];
    for d in (0..D).rev() {
        index[d] = linear % extents[d];
        linear /= extents[d];
    }
    index
}

/// Runs `unit` once for each in-bounds global index of the launch.
///
/// Blocks are distributed over the current rayon pool; the units of one
/// block run in order on the worker that picked the block up. Each block
/// only walks the part of its extent that overlaps `shape`, so a budget far
/// larger than the shape costs no more than the shape itself.
pub fn launch<const D: usize, F>(config: &LaunchConfig<D>, shape: [usize; D], unit: F)
where
    F: Fn([usize; D]) + Sync + Send,
{
    (0..config.block_count())
        .into_par_iter()
        .for_each(|block_id| {
            let block_index = unravel(block_id, &config.grid);
            let mut origin = [0; D];
            let mut extent = [0; D];
            for d in 0..D {
                origin[d] = block_index[d] * config.block[d];
                extent[d] = config.block[d].min(shape[d].saturating_sub(origin[d]));
            }
            let active: usize = extent.iter().product();

            for thread_id in 0..active {
                let thread_index = unravel(thread_id, &extent);
                let mut global = [0; D];
                let mut in_bounds = true;
                for d in 0..D {
                    global[d] = origin[d] + thread_index[d];
                    if global[d] >= shape[d] {
                        in_bounds = false;
                        break;
                    }
                }
                if in_bounds {
                    unit(global);
                }
            }
        });
}
