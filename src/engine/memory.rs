// Workspace Memory
// Host-resident work buffers and their device-resident mirrors
use ndarray::{Array, Array2, Array4, ArrayBase, ArrayView, Data, Dimension};

use crate::engine::grid::SampleGrid;
use crate::error::{Error, Result};

/// Host-side buffers for one engine invocation.
///
/// Sized from the sample grid and charge count; dropped when the invocation
/// finishes, so nothing carries over between runs.
pub struct Workspace {
    /// `(H, W, C, 2)` per-charge field vectors
    pub partial: Array4<f64>,
    /// `(H, W)` log-magnitudes
    pub result: Array2<f64>,
    pub x: Array2<f64>,
    pub y: Array2<f64>,
}

impl Workspace {
    pub fn allocate(grid: &SampleGrid, charge_count: usize) -> Self {
        let (height, width) = grid.shape();
        let (x, y) = grid.meshgrid();
        Self {
            partial: Array4::zeros((height, width, charge_count, 2)),
            result: Array2::zeros((height, width)),
            x,
            y,
        }
    }

    /// `(H, W, C)`
    pub fn shape(&self) -> (usize, usize, usize) {
        let dims = self.partial.dim();
        (dims.0, dims.1, dims.2)
    }
}

/// Device-resident copy of a host array.
///
/// Host and device copies are separate resources: a kernel writes only the
/// device copy, and the host copy is stale until [`DeviceArray::copy_to_host`].
/// The buffer is always in standard (row-major, contiguous) layout.
pub struct DeviceArray<A, D: Dimension> {
    data: Array<A, D>,
}

impl<A: Clone, D: Dimension> DeviceArray<A, D> {
    pub fn to_device<S>(host: &ArrayBase<S, D>) -> Self
    where
        S: Data<Elem = A>,
    {
        Self {
            data: host.as_standard_layout().into_owned(),
        }
    }

    pub fn copy_to_host(&self, host: &mut Array<A, D>) -> Result<()> {
        if host.shape() != self.data.shape() {
            return Err(Error::ShapeMismatch {
                expected: self.data.shape().to_vec(),
                found: host.shape().to_vec(),
            });
        }
        host.assign(&self.data);
        Ok(())
    }

    pub fn view(&self) -> ArrayView<'_, A, D> {
        self.data.view()
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Raw write handle into the contiguous device buffer, for kernels
    /// whose launch units each own a disjoint set of elements.
    pub(crate) fn device_ptr(&mut self) -> DevicePtr<A> {
        DevicePtr {
            ptr: self.data.as_mut_ptr(),
            len: self.data.len(),
        }
    }
}

/// Pointer into a device buffer that may be shared across launch units.
///
/// # Safety
/// Callers must ensure that concurrent units write non-overlapping offsets
/// and that the owning [`DeviceArray`] outlives every write.
#[derive(Copy, Clone)]
pub(crate) struct DevicePtr<A> {
    ptr: *mut A,
    len: usize,
}

unsafe impl<A: Send> Send for DevicePtr<A> {}
unsafe impl<A: Send> Sync for DevicePtr<A> {}

impl<A> DevicePtr<A> {
    #[inline]
    pub(crate) unsafe fn write(&self, offset: usize, value: A) {
        debug_assert!(offset < self.len);
        self.ptr.add(offset).write(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Ix2};

    #[test]
    fn workspace_is_sized_from_grid_and_charges() {
        let grid = SampleGrid::new(vec![0.0, 1.0, 2.0], vec![0.0, 1.0]).unwrap();
        let ws = Workspace::allocate(&grid, 4);
        assert_eq!(ws.partial.shape(), &[2, 3, 4, 2]);
        assert_eq!(ws.result.shape(), &[2, 3]);
        assert_eq!(ws.shape(), (2, 3, 4));
    }

    #[test]
    fn host_copy_changes_only_on_transfer() {
        let mut host = array![[1.0, 2.0], [3.0, 4.0]];
        let mut device: DeviceArray<f64, Ix2> = DeviceArray::to_device(&host);
        let ptr = device.device_ptr();
        unsafe { ptr.write(3, 9.0) };
        assert_eq!(host[[1, 1]], 4.0);

        device.copy_to_host(&mut host).unwrap();
        assert_eq!(host[[1, 1]], 9.0);
    }

    #[test]
    fn transposed_host_is_made_contiguous_on_device() {
        let host = array![[1.0, 2.0], [3.0, 4.0]];
        let device = DeviceArray::to_device(&host.t());
        assert_eq!(device.view(), array![[1.0, 3.0], [2.0, 4.0]]);
    }

    #[test]
    fn copy_back_rejects_mismatched_shape() {
        let device = DeviceArray::to_device(&array![[1.0, 2.0]]);
        let mut host = Array2::<f64>::zeros((2, 2));
        assert!(matches!(
            device.copy_to_host(&mut host),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
