//! mapply-engine: aplica un callable Python pasándole `lookup` sólo si lo pide.
//!
//! El trabajo real está en `invoke`: clasificar la forma del callable,
//! obtener el descriptor de la función subyacente y reenviar la llamada.
use pyo3::exceptions::PyTypeError;
use pyo3::{create_exception, PyErr};
use thiserror::Error;

pub mod invoke;
pub mod descriptor;

pub use invoke::{arginfo, classify, lookup_mapply, mapply, split_invocation, CallableShape, Classified, KwargsPolicy,
               LOOKUP_NAME};
pub use descriptor::FunctionDescriptor;

create_exception!(fastmapply, ArityError, PyTypeError, "Not enough positional arguments.");
create_exception!(fastmapply, NotCallableError, PyTypeError, "Object is not callable.");
create_exception!(fastmapply, UnsupportedCallableError, PyTypeError, "Callable shape cannot be introspected.");

#[derive(Debug, Error)]
pub enum MapplyError {
    #[error("{function}() takes at least {required} parameters ({given} given)")]
    Arity { function: &'static str, required: usize, given: usize },
    #[error("{0}")]
    NotCallable(String),
    #[error("{reason}")]
    UnsupportedCallable { shape: CallableShape, reason: String },
    /// Error levantado por Python (resolución de atributos o el propio
    /// callable). Se devuelve intacto al convertir a `PyErr`.
    #[error(transparent)]
    Python(#[from] PyErr),
}

impl MapplyError {
    pub fn unsupported(shape: CallableShape, reason: impl Into<String>) -> Self {
        MapplyError::UnsupportedCallable { shape, reason: reason.into() }
    }
}

impl From<MapplyError> for PyErr {
    fn from(e: MapplyError) -> Self {
        match e {
            MapplyError::Python(err) => err,
            MapplyError::NotCallable(msg) => NotCallableError::new_err(msg),
            MapplyError::UnsupportedCallable { reason, .. } => UnsupportedCallableError::new_err(reason),
            arity @ MapplyError::Arity { .. } => ArityError::new_err(arity.to_string()),
        }
    }
}
