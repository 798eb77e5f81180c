// Sample Grid
use ndarray::Array2;

use crate::error::{Error, Result};

/// Two ordered axes whose outer product gives the sample points.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleGrid {
    x_axis: Vec<f64>,
    y_axis: Vec<f64>,
}

impl SampleGrid {
    /// Both axes must be non-empty, finite and strictly monotonic.
    pub fn new(x_axis: Vec<f64>, y_axis: Vec<f64>) -> Result<Self> {
        validate_axis("x", &x_axis)?;
        validate_axis("y", &y_axis)?;
        Ok(Self { x_axis, y_axis })
    }

    pub fn x_axis(&self) -> &[f64] {
        &self.x_axis
    }

    pub fn y_axis(&self) -> &[f64] {
        &self.y_axis
    }

    pub fn width(&self) -> usize {
        self.x_axis.len()
    }

    pub fn height(&self) -> usize {
        self.y_axis.len()
    }

    /// `(H, W)`
    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    /// Coordinate matrices `X, Y` of shape `(H, W)`: `(X[i,j], Y[i,j]) = (x_axis[j], y_axis[i])`.
    pub fn meshgrid(&self) -> (Array2<f64>, Array2<f64>) {
        let x = Array2::from_shape_fn(self.shape(), |(_, j)| self.x_axis[j]);
        let y = Array2::from_shape_fn(self.shape(), |(i, _)| self.y_axis[i]);
        (x, y)
    }
}

fn validate_axis(name: &str, axis: &[f64]) -> Result<()> {
    if axis.is_empty() {
        return Err(Error::InvalidSampleGrid(format!("{name} axis is empty")));
    }
    if let Some(v) = axis.iter().find(|v| !v.is_finite()) {
        return Err(Error::InvalidSampleGrid(format!(
            "{name} axis holds non-finite value {v}"
        )));
    }
    let increasing = axis.windows(2).all(|w| w[0] < w[1]);
    let decreasing = axis.windows(2).all(|w| w[0] > w[1]);
    if !(increasing || decreasing) {
        return Err(Error::InvalidSampleGrid(format!(
            "{name} axis is not strictly monotonic"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meshgrid_pairs_rows_with_y_and_columns_with_x() {
        let grid = SampleGrid::new(vec![1.0, 2.0, 3.0], vec![10.0, 20.0]).unwrap();
        let (x, y) = grid.meshgrid();
        assert_eq!(x.shape(), &[2, 3]);
        assert_eq!(y.shape(), &[2, 3]);
        assert_eq!(x[[1, 2]], 3.0);
        assert_eq!(y[[1, 2]], 20.0);
        assert_eq!(x[[0, 0]], 1.0);
        assert_eq!(y[[0, 0]], 10.0);
    }

    #[test]
    fn rejects_bad_axes() {
        assert!(SampleGrid::new(vec![], vec![1.0]).is_err());
        assert!(SampleGrid::new(vec![1.0, f64::NAN], vec![1.0]).is_err());
        assert!(SampleGrid::new(vec![1.0, 1.0], vec![1.0]).is_err());
        assert!(SampleGrid::new(vec![1.0, 3.0, 2.0], vec![1.0]).is_err());
    }

    #[test]
    fn accepts_decreasing_and_single_sample_axes() {
        let grid = SampleGrid::new(vec![3.0, 2.0, 1.0], vec![0.0]).unwrap();
        assert_eq!(grid.shape(), (1, 3));
    }
}
