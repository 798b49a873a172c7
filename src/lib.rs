//! reg-mapply
//!
//! Librería para invocar callables Python desde un dispatcher:
//! - `Invoker` aplica `lookup_mapply`/`mapply` con la política de keywords
//!   configurada.
//! - `config` lee la configuración desde el entorno (.env incluido).
//! - `python` expone el módulo `fastmapply` para usarlo desde Python.

pub mod config;
pub mod python;

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyTuple};

pub use mapply_engine::{CallableShape, Classified, FunctionDescriptor, KwargsPolicy, MapplyError, LOOKUP_NAME};
pub use python::fastmapply;

/// Punto de entrada desde Rust. Sin estado entre llamadas: sólo guarda la
/// política de keywords.
#[derive(Debug, Clone, Copy)]
pub struct Invoker {
    policy: KwargsPolicy,
}

impl Default for Invoker {
    fn default() -> Self {
        Self::new()
    }
}

impl Invoker {
    /// Usa la política de la configuración global.
    pub fn new() -> Self {
        Self { policy: config::CONFIG.kwargs_policy }
    }

    pub fn with_policy(policy: KwargsPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> KwargsPolicy {
        self.policy
    }

    /// `callable(*args, **kwargs)`, con `lookup=lookup` si el callable lo
    /// declara.
    pub fn invoke<'py>(&self,
                       callable: &Bound<'py, PyAny>,
                       lookup: &Bound<'py, PyAny>,
                       args: &Bound<'py, PyTuple>,
                       kwargs: Option<&Bound<'py, PyDict>>)
                       -> Result<Bound<'py, PyAny>, MapplyError> {
        mapply_engine::lookup_mapply(callable, lookup, args, kwargs, self.policy)
    }

    /// Igual que `invoke`, pero con la lista de argumentos completa
    /// `(callable, lookup, *args)`.
    pub fn invoke_packed<'py>(&self,
                              packed: &Bound<'py, PyTuple>,
                              kwargs: Option<&Bound<'py, PyDict>>)
                              -> Result<Bound<'py, PyAny>, MapplyError> {
        let (head, rest) = mapply_engine::split_invocation("lookup_mapply", packed, 2)?;
        self.invoke(&head[0], &head[1], &rest, kwargs)
    }

    pub fn mapply<'py>(&self,
                       callable: &Bound<'py, PyAny>,
                       args: &Bound<'py, PyTuple>,
                       kwargs: Option<&Bound<'py, PyDict>>)
                       -> Result<Bound<'py, PyAny>, MapplyError> {
        mapply_engine::mapply(callable, args, kwargs)
    }

    pub fn arginfo(&self, callable: &Bound<'_, PyAny>) -> Result<Option<FunctionDescriptor>, MapplyError> {
        mapply_engine::arginfo(callable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_policy_wins_over_config() {
        let inv = Invoker::with_policy(KwargsPolicy::MutateInPlace);
        assert_eq!(inv.policy(), KwargsPolicy::MutateInPlace);
    }
}
