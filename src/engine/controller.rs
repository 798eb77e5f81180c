// Controller
// Python-facing engine classes (feature "python")
use numpy::{IntoPyArray, PyArray2, PyReadonlyArray2};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::config::ViewportConfig;
use crate::engine::charges::{decode_records, Charge, RECORD_WIDTH};
use crate::engine::field::{ElectricField, FieldSolution};
use crate::engine::grid::SampleGrid;
use crate::engine::parallel::ParallelElectricField;
use crate::engine::sequential::SequentialElectricField;
use crate::error::Error;

type PySolution<'py> = (
    Bound<'py, PyArray2<f64>>,
    Bound<'py, PyArray2<f64>>,
    Bound<'py, PyArray2<f64>>,
);

fn to_py_err(e: Error) -> PyErr {
    if e.is_input_fault() {
        PyValueError::new_err(e.to_string())
    } else {
        PyRuntimeError::new_err(e.to_string())
    }
}

/// Viewport JSON (or defaults) plus an `(n, 7)` table of encoded charges.
fn build_inputs(
    charges: PyReadonlyArray2<'_, f64>,
    viewport_json: Option<&str>,
) -> PyResult<(SampleGrid, Vec<Charge>)> {
    let viewport = match viewport_json {
        Some(json) => ViewportConfig::from_json(json).map_err(to_py_err)?,
        None => ViewportConfig::default(),
    };
    let grid = viewport.sample_grid().map_err(to_py_err)?;
    let charges = decode_records(charges.as_array()).map_err(to_py_err)?;
    Ok((grid, charges))
}

fn solution_to_py(py: Python<'_>, solution: FieldSolution) -> PySolution<'_> {
    (
        solution.result.into_pyarray(py),
        solution.x.into_pyarray(py),
        solution.y.into_pyarray(py),
    )
}

#[pyclass(name = "SequentialElectricField")]
pub struct PySequentialElectricField {
    inner: SequentialElectricField,
}

#[pymethods]
impl PySequentialElectricField {
    #[new]
    #[pyo3(signature = (charges, viewport_json=None))]
    pub fn new(charges: PyReadonlyArray2<'_, f64>, viewport_json: Option<&str>) -> PyResult<Self> {
        let (grid, charges) = build_inputs(charges, viewport_json)?;
        let inner = SequentialElectricField::new(grid, charges).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Returns `(result, x, y)`
    pub fn calculate<'py>(&self, py: Python<'py>) -> PyResult<PySolution<'py>> {
        let solution = py.allow_threads(|| self.inner.calculate()).map_err(to_py_err)?;
        Ok(solution_to_py(py, solution))
    }

    pub fn time_it<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let timing = py.allow_threads(|| self.inner.time_it());
        let dict = PyDict::new(py);
        dict.set_item("total_time", timing.total_time)?;
        dict.set_item("sequential_time", timing.sequential_time)?;
        dict.set_item("sequential_times", timing.sequential_times.to_vec())?;
        Ok(dict)
    }
}

#[pyclass(name = "ParallelElectricField")]
pub struct PyParallelElectricField {
    inner: ParallelElectricField,
}

#[pymethods]
impl PyParallelElectricField {
    #[new]
    #[pyo3(signature = (charges, viewport_json=None, number_of_cores=ParallelElectricField::DEFAULT_NUMBER_OF_CORES))]
    pub fn new(
        charges: PyReadonlyArray2<'_, f64>,
        viewport_json: Option<&str>,
        number_of_cores: usize,
    ) -> PyResult<Self> {
        let (grid, charges) = build_inputs(charges, viewport_json)?;
        let inner = ParallelElectricField::with_cores(grid, charges, number_of_cores)
            .map_err(to_py_err)?;
        Ok(Self { inner })
    }

    #[getter]
    pub fn number_of_cores(&self) -> usize {
        self.inner.number_of_cores()
    }

    #[setter]
    pub fn set_number_of_cores(&mut self, number_of_cores: usize) -> PyResult<()> {
        self.inner
            .set_number_of_cores(number_of_cores)
            .map_err(to_py_err)
    }

    /// Cached `(n, 7)` encoded charge table
    pub fn encoded_charges<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let records: Vec<f64> = self
            .inner
            .encoded_charges()
            .iter()
            .flat_map(|c| c.to_record())
            .collect();
        let table = ndarray::Array2::from_shape_vec((records.len() / RECORD_WIDTH, RECORD_WIDTH), records)
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
        Ok(table.into_pyarray(py))
    }

    /// Returns `(result, x, y)`
    pub fn calculate<'py>(&self, py: Python<'py>) -> PyResult<PySolution<'py>> {
        let solution = py.allow_threads(|| self.inner.calculate()).map_err(to_py_err)?;
        Ok(solution_to_py(py, solution))
    }

    pub fn time_it<'py>(&self, py: Python<'py>, sequential_time: f64) -> PyResult<Bound<'py, PyDict>> {
        let timing = py
            .allow_threads(|| self.inner.time_it(sequential_time))
            .map_err(to_py_err)?;
        let dict = PyDict::new(py);
        dict.set_item("total_time", timing.total_time)?;
        dict.set_item("speedup", timing.speedup)?;
        dict.set_item("efficiency", timing.efficiency)?;
        dict.set_item("sequential_time", timing.sequential_time)?;
        dict.set_item("sequential_times", timing.sequential_times.to_vec())?;
        dict.set_item("parallel_time", timing.parallel_time)?;
        dict.set_item("parallel_times", timing.parallel_times.to_vec())?;
        Ok(dict)
    }
}
