//! Módulo Python `fastmapply`.
use mapply_engine::{ArityError, FunctionDescriptor, NotCallableError, UnsupportedCallableError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyTuple};

use crate::config::CONFIG;

/// Vista de sólo lectura de los parámetros de un callable.
#[pyclass(frozen, name = "ArgInfo", module = "fastmapply")]
pub struct PyArgInfo {
    inner: FunctionDescriptor,
}

#[pymethods]
impl PyArgInfo {
    #[getter]
    fn args(&self) -> Vec<String> {
        self.inner.names().to_vec()
    }

    #[getter]
    fn varargs(&self) -> Option<String> {
        self.inner.varargs().map(str::to_owned)
    }

    #[getter]
    fn keywords(&self) -> Option<String> {
        self.inner.varkw().map(str::to_owned)
    }

    fn __repr__(&self) -> String {
        format!("ArgInfo(args={:?}, varargs={:?}, keywords={:?})",
                self.inner.names(),
                self.inner.varargs(),
                self.inner.varkw())
    }
}

/// lookup_mapply(callable, lookup, *args, **kw)
///
/// Apply with optional lookup parameter.
#[pyfunction(name = "lookup_mapply", signature = (*args, **kwargs))]
fn py_lookup_mapply<'py>(args: &Bound<'py, PyTuple>,
                         kwargs: Option<&Bound<'py, PyDict>>)
                         -> PyResult<Bound<'py, PyAny>> {
    let (head, rest) = mapply_engine::split_invocation("lookup_mapply", args, 2)?;
    let result = mapply_engine::lookup_mapply(&head[0], &head[1], &rest, kwargs, CONFIG.kwargs_policy)?;
    Ok(result)
}

/// mapply(callable, *args, **kw)
///
/// Apply keyword arguments to callable only if it defines them.
#[pyfunction(name = "mapply", signature = (*args, **kwargs))]
fn py_mapply<'py>(args: &Bound<'py, PyTuple>, kwargs: Option<&Bound<'py, PyDict>>) -> PyResult<Bound<'py, PyAny>> {
    let (head, rest) = mapply_engine::split_invocation("mapply", args, 1)?;
    Ok(mapply_engine::mapply(&head[0], &rest, kwargs)?)
}

#[pyfunction(name = "arginfo")]
fn py_arginfo(callable: &Bound<'_, PyAny>) -> PyResult<Option<PyArgInfo>> {
    let info = mapply_engine::arginfo(callable).map_err(PyErr::from)?;
    Ok(info.map(|inner| PyArgInfo { inner }))
}

#[pymodule]
pub fn fastmapply(m: &Bound<'_, PyModule>) -> PyResult<()> {
    let py = m.py();
    m.add_function(wrap_pyfunction!(py_lookup_mapply, m)?)?;
    m.add_function(wrap_pyfunction!(py_mapply, m)?)?;
    m.add_function(wrap_pyfunction!(py_arginfo, m)?)?;
    m.add_class::<PyArgInfo>()?;
    m.add("ArityError", py.get_type::<ArityError>())?;
    m.add("NotCallableError", py.get_type::<NotCallableError>())?;
    m.add("UnsupportedCallableError", py.get_type::<UnsupportedCallableError>())?;
    Ok(())
}
