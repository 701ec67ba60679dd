use nalgebra::DMatrix;
use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray2, PyReadonlyArray1, PyReadonlyArray2, PyUntypedArrayMethods};
use oneint::{BasisRegistry, IntegralContext, IntegralError, DATA_PATH_ENV};
use pyo3::create_exception;
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use std::path::PathBuf;

create_exception!(oneint_py, BasisNotFoundError, PyValueError);
create_exception!(oneint_py, UnsupportedElementError, PyValueError);
create_exception!(oneint_py, ShapeMismatchError, PyValueError);
create_exception!(oneint_py, BasisParseError, PyRuntimeError);
create_exception!(oneint_py, NumericalInstabilityError, PyRuntimeError);

fn to_py_err(err: IntegralError) -> PyErr {
    let msg = err.to_string();
    match err {
        IntegralError::BasisNotFound { .. } => BasisNotFoundError::new_err(msg),
        IntegralError::UnsupportedElement { .. } => UnsupportedElementError::new_err(msg),
        IntegralError::ShapeMismatch(_) | IntegralError::InvalidGeometry(_) => {
            ShapeMismatchError::new_err(msg)
        }
        IntegralError::BasisParse { .. } => BasisParseError::new_err(msg),
        IntegralError::NumericalInstability { .. } => NumericalInstabilityError::new_err(msg),
        _ => PyRuntimeError::new_err(msg),
    }
}

fn matrix_to_pyarray<'py>(
    py: Python<'py>,
    matrix: &DMatrix<f64>,
) -> Bound<'py, PyArray2<f64>> {
    Array2::from_shape_fn(matrix.shape(), |(i, j)| matrix[(i, j)]).into_pyarray(py)
}

fn atomic_numbers(z: &PyReadonlyArray1<'_, i64>) -> PyResult<Vec<u32>> {
    z.as_array()
        .iter()
        .map(|&n| {
            u32::try_from(n).map_err(|_| {
                ShapeMismatchError::new_err(format!("atomic number {} out of range", n))
            })
        })
        .collect()
}

fn position_rows(positions: &PyReadonlyArray2<'_, f64>) -> PyResult<Vec<[f64; 3]>> {
    let shape = positions.shape();
    if shape[1] != 3 {
        return Err(ShapeMismatchError::new_err(format!(
            "positions must have shape (N, 3), got ({}, {})",
            shape[0], shape[1]
        )));
    }
    Ok(positions
        .as_array()
        .outer_iter()
        .map(|row| [row[0], row[1], row[2]])
        .collect())
}

#[pyclass(name = "IntegralContext", frozen)]
pub struct PyIntegralContext {
    inner: IntegralContext,
}

#[pymethods]
impl PyIntegralContext {
    #[new]
    fn new(
        py: Python<'_>,
        z: PyReadonlyArray1<'_, i64>,
        positions: PyReadonlyArray2<'_, f64>,
        basis_name: &str,
    ) -> PyResult<Self> {
        let z = atomic_numbers(&z)?;
        let rows = position_rows(&positions)?;
        let inner = py
            .allow_threads(|| IntegralContext::new(&z, &rows, basis_name))
            .map_err(to_py_err)?;
        Ok(Self { inner })
    }

    fn overlap<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let m = py.allow_threads(|| self.inner.overlap()).map_err(to_py_err)?;
        Ok(matrix_to_pyarray(py, &m))
    }

    fn kinetic<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let m = py.allow_threads(|| self.inner.kinetic()).map_err(to_py_err)?;
        Ok(matrix_to_pyarray(py, &m))
    }

    fn nuclear<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let m = py.allow_threads(|| self.inner.nuclear()).map_err(to_py_err)?;
        Ok(matrix_to_pyarray(py, &m))
    }

    /// `(S, T, V)` from one pass over the shell pairs.
    #[allow(clippy::type_complexity)]
    fn one_body_integrals<'py>(
        &self,
        py: Python<'py>,
    ) -> PyResult<(
        Bound<'py, PyArray2<f64>>,
        Bound<'py, PyArray2<f64>>,
        Bound<'py, PyArray2<f64>>,
    )> {
        let ints = py
            .allow_threads(|| self.inner.one_body_integrals())
            .map_err(to_py_err)?;
        Ok((
            matrix_to_pyarray(py, &ints.overlap),
            matrix_to_pyarray(py, &ints.kinetic),
            matrix_to_pyarray(py, &ints.nuclear),
        ))
    }

    #[getter]
    fn basis_name(&self) -> &str {
        self.inner.basis_name()
    }

    #[getter]
    fn num_atoms(&self) -> usize {
        self.inner.num_atoms()
    }

    #[getter]
    fn num_shells(&self) -> usize {
        self.inner.num_shells()
    }

    #[getter]
    fn nbf(&self) -> usize {
        self.inner.nbf()
    }

    #[getter]
    fn max_nprim(&self) -> usize {
        self.inner.max_nprim()
    }

    #[getter]
    fn max_l(&self) -> usize {
        self.inner.max_l()
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

// $ONEINT_DATA_PATH wins; otherwise the files installed with the wheel.
fn data_path(py: Python<'_>) -> PyResult<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_PATH_ENV) {
        return Ok(PathBuf::from(dir));
    }
    let platlib: String = py
        .import("sysconfig")?
        .call_method1("get_path", ("platlib",))?
        .extract()?;
    Ok(PathBuf::from(platlib).join("share").join("oneint").join("basis"))
}

#[pymodule]
fn oneint_py(py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    let dir = data_path(py)?;
    let registry = BasisRegistry::new(&dir).map_err(|_| {
        PyRuntimeError::new_err(format!(
            "oneint data directory not found at {}. \
             Please ensure the package was installed correctly.",
            dir.display()
        ))
    })?;
    BasisRegistry::install_global(registry);

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add_class::<PyIntegralContext>()?;
    m.add("BasisNotFoundError", py.get_type::<BasisNotFoundError>())?;
    m.add("UnsupportedElementError", py.get_type::<UnsupportedElementError>())?;
    m.add("ShapeMismatchError", py.get_type::<ShapeMismatchError>())?;
    m.add("BasisParseError", py.get_type::<BasisParseError>())?;
    m.add(
        "NumericalInstabilityError",
        py.get_type::<NumericalInstabilityError>(),
    )?;
    Ok(())
}
