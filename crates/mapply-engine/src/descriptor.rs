//! Descriptor de parámetros formales de una función Python.
//!
//! Se construye leyendo el code object (`__code__`) de la función que
//! finalmente se ejecuta. Sólo se guardan nombres y flags; el descriptor no
//! retiene referencias al intérprete.

use pyo3::intern;
use pyo3::prelude::*;
use pyo3::types::PyFunction;

/// `CO_VARARGS`: la función declara `*args`.
pub const CO_VARARGS: u32 = 0x04;
/// `CO_VARKEYWORDS`: la función declara `**kw`.
pub const CO_VARKEYWORDS: u32 = 0x08;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDescriptor {
    names: Vec<String>,
    positional_only: usize,
    varargs: Option<String>,
    varkw: Option<String>,
    bound_receiver: bool,
}

impl FunctionDescriptor {
    pub fn new(names: Vec<String>, varargs: Option<String>, varkw: Option<String>) -> Self {
        Self { names, positional_only: 0, varargs, varkw, bound_receiver: false }
    }

    /// Lee el descriptor de un objeto función. Devuelve `Ok(None)` si el
    /// objeto no es una función Python (p.ej. un builtin o un slot wrapper).
    pub fn from_function(func: &Bound<'_, PyAny>) -> PyResult<Option<Self>> {
        if !func.is_instance_of::<PyFunction>() {
            return Ok(None);
        }
        let py = func.py();
        let code = func.getattr(intern!(py, "__code__"))?;
        let argcount: usize = code.getattr(intern!(py, "co_argcount"))?.extract()?;
        let kwonly: usize = code.getattr(intern!(py, "co_kwonlyargcount"))?.extract()?;
        // co_posonlyargcount no existe antes de 3.8
        let posonly: usize = match code.getattr(intern!(py, "co_posonlyargcount")) {
            Ok(v) => v.extract()?,
            Err(_) => 0,
        };
        let flags: u32 = code.getattr(intern!(py, "co_flags"))?.extract()?;
        let varnames: Vec<String> = code.getattr(intern!(py, "co_varnames"))?.extract()?;

        let named = argcount + kwonly;
        let mut extra = varnames.iter().skip(named).cloned();
        let varargs = if flags & CO_VARARGS != 0 { extra.next() } else { None };
        let varkw = if flags & CO_VARKEYWORDS != 0 { extra.next() } else { None };

        Ok(Some(Self { names: varnames.into_iter().take(named).collect(),
                       positional_only: posonly.min(named),
                       varargs,
                       varkw,
                       bound_receiver: false }))
    }

    /// Marca el primer parámetro como receptor ya ligado (`self`/`cls`).
    pub fn with_bound_receiver(mut self) -> Self {
        self.bound_receiver = !self.names.is_empty();
        self
    }

    pub fn with_positional_only(mut self, count: usize) -> Self {
        self.positional_only = count.min(self.names.len());
        self
    }

    /// Nombres de los parámetros con nombre, en orden de declaración.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn param_count(&self) -> usize {
        self.names.len()
    }

    pub fn varargs(&self) -> Option<&str> {
        self.varargs.as_deref()
    }

    pub fn varkw(&self) -> Option<&str> {
        self.varkw.as_deref()
    }

    pub fn has_bound_receiver(&self) -> bool {
        self.bound_receiver
    }

    pub fn accepts_arbitrary_keywords(&self) -> bool {
        self.varkw.is_some()
    }

    /// Parámetros que pueden recibirse por nombre: se excluyen los
    /// posicionales puros y el receptor ligado.
    pub fn keyword_names(&self) -> impl Iterator<Item = &str> {
        let skip = self.positional_only.max(usize::from(self.bound_receiver));
        self.names.iter().skip(skip).map(String::as_str)
    }

    pub fn accepts_keyword(&self, name: &str) -> bool {
        self.keyword_names().any(|n| n == name)
    }

    /// Decisión de inyección: hay que pasar `name=` sólo si la función lo
    /// declara por nombre y no acepta `**kw`.
    pub fn wants_injection(&self, name: &str) -> bool {
        !self.accepts_arbitrary_keywords() && self.accepts_keyword(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn injection_requires_named_parameter() {
        let d = FunctionDescriptor::new(names(&["a", "lookup"]), None, None);
        assert!(d.wants_injection("lookup"));
        let d = FunctionDescriptor::new(names(&["a"]), None, None);
        assert!(!d.wants_injection("lookup"));
    }

    #[test]
    fn varkw_disables_injection() {
        let d = FunctionDescriptor::new(names(&["a", "lookup"]), None, Some("kw".into()));
        assert!(d.accepts_arbitrary_keywords());
        assert!(d.accepts_keyword("lookup"));
        assert!(!d.wants_injection("lookup"));
    }

    #[test]
    fn positional_only_lookup_is_not_a_target() {
        let d = FunctionDescriptor::new(names(&["lookup", "b"]), None, None).with_positional_only(1);
        assert!(!d.wants_injection("lookup"));
        assert_eq!(d.keyword_names().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn bound_receiver_is_skipped_for_keywords() {
        let d = FunctionDescriptor::new(names(&["self", "a"]), None, None).with_bound_receiver();
        assert!(d.has_bound_receiver());
        assert_eq!(d.param_count(), 2);
        assert!(!d.accepts_keyword("self"));
        assert!(d.accepts_keyword("a"));
    }

    #[test]
    fn empty_descriptor_has_no_receiver() {
        let d = FunctionDescriptor::new(Vec::new(), Some("args".into()), None).with_bound_receiver();
        assert!(!d.has_bound_receiver());
        assert_eq!(d.varargs(), Some("args"));
    }

    #[test]
    fn reads_code_object() {
        Python::attach(|py| {
            let m = pyo3::types::PyModule::from_code(py,
                                                     pyo3::ffi::c_str!("def f(a, /, b, *rest, lookup, **kw):\n    x = 1\n    return x\n"),
                                                     pyo3::ffi::c_str!("fixture.py"),
                                                     pyo3::ffi::c_str!("fixture")).expect("fixture");
            let f = m.getattr("f").unwrap();
            let d = FunctionDescriptor::from_function(&f).unwrap().expect("function");
            assert_eq!(d.names(), &names(&["a", "b", "lookup"])[..]);
            assert_eq!(d.varargs(), Some("rest"));
            assert_eq!(d.varkw(), Some("kw"));
            assert_eq!(d.keyword_names().collect::<Vec<_>>(), vec!["b", "lookup"]);
        });
    }

    #[test]
    fn builtin_has_no_descriptor() {
        Python::attach(|py| {
            let dir = py.import("builtins").unwrap().getattr("dir").unwrap();
            assert!(FunctionDescriptor::from_function(&dir).unwrap().is_none());
        });
    }
}
