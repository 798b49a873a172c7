//! Clasificación de callables y reenvío de la llamada.
//!
//! Un callable puede ser función, método ligado, clase o instancia con
//! `__call__`. Cada forma se reduce a la función Python que realmente se
//! ejecuta para poder leer sus parámetros; después se decide si se añade
//! `lookup=` a los keywords y se llama al callable original.

use std::fmt;
use std::str::FromStr;

use log::{debug, trace, warn};
use pyo3::exceptions::PyAttributeError;
use pyo3::intern;
use pyo3::prelude::*;
use pyo3::types::{PyCFunction, PyDict, PyFunction, PyTuple, PyType};

use crate::descriptor::FunctionDescriptor;
use crate::MapplyError;

/// Nombre del keyword que se inyecta.
pub const LOOKUP_NAME: &str = "lookup";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableShape {
    PlainFunction,
    Method,
    ClassConstructor,
    NativeFunction,
    LegacyClass,
    CallableInstance,
}

impl fmt::Display for CallableShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CallableShape::PlainFunction => "function",
            CallableShape::Method => "method",
            CallableShape::ClassConstructor => "class",
            CallableShape::NativeFunction => "native function",
            CallableShape::LegacyClass => "class without __init__",
            CallableShape::CallableInstance => "callable instance",
        };
        f.write_str(s)
    }
}

/// Qué hacer con el diccionario de keywords del llamador cuando hay que
/// inyectar `lookup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KwargsPolicy {
    /// Se inyecta sobre una copia; el diccionario del llamador no cambia.
    #[default]
    CopyOnAugment,
    /// Se inyecta en el diccionario del llamador (comportamiento histórico).
    MutateInPlace,
}

impl FromStr for KwargsPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "copy" | "copy-on-augment" => Ok(KwargsPolicy::CopyOnAugment),
            "mutate" | "mutate-in-place" => Ok(KwargsPolicy::MutateInPlace),
            other => Err(format!("unknown kwargs policy '{other}' (expected 'copy' or 'mutate')")),
        }
    }
}

/// Resultado de clasificar un callable. `descriptor` es `None` sólo para
/// clases cuyo `__init__` no es una función Python.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub shape: CallableShape,
    pub descriptor: Option<FunctionDescriptor>,
}

impl Classified {
    pub fn wants_lookup(&self) -> bool {
        self.descriptor.as_ref().is_some_and(|d| d.wants_injection(LOOKUP_NAME))
    }
}

fn is_bound_method(obj: &Bound<'_, PyAny>) -> PyResult<bool> {
    let py = obj.py();
    let method_type = py.import(intern!(py, "types"))?.getattr(intern!(py, "MethodType"))?;
    obj.is_instance(&method_type)
}

fn describe(func: &Bound<'_, PyAny>, shape: CallableShape, bound: bool) -> Result<FunctionDescriptor, MapplyError> {
    match FunctionDescriptor::from_function(func)? {
        Some(d) if bound => Ok(d.with_bound_receiver()),
        Some(d) => Ok(d),
        None => Err(MapplyError::unsupported(shape, format!("{shape} does not wrap a Python function"))),
    }
}

fn describe_method(method: &Bound<'_, PyAny>, shape: CallableShape) -> Result<FunctionDescriptor, MapplyError> {
    let func = method.getattr(intern!(method.py(), "__func__"))?;
    describe(&func, shape, true)
}

fn classify_class(ty: &Bound<'_, PyType>) -> Result<Classified, MapplyError> {
    let py = ty.py();
    let shape = CallableShape::ClassConstructor;
    let init = match ty.getattr(intern!(py, "__init__")) {
        Ok(init) => init,
        Err(e) if e.is_instance_of::<PyAttributeError>(py) => {
            return Err(MapplyError::unsupported(CallableShape::LegacyClass,
                                                "classes without __init__ are not supported"));
        }
        Err(e) => return Err(e.into()),
    };
    let descriptor = if init.is_instance_of::<PyFunction>() {
        Some(describe(&init, shape, true)?)
    } else if is_bound_method(&init)? {
        Some(describe_method(&init, shape)?)
    } else {
        // slot wrapper heredado (object.__init__ o un tipo nativo)
        None
    };
    Ok(Classified { shape, descriptor })
}

fn classify_instance(obj: &Bound<'_, PyAny>) -> Result<Classified, MapplyError> {
    let py = obj.py();
    let shape = CallableShape::CallableInstance;
    let call = match obj.getattr(intern!(py, "__call__")) {
        Ok(call) => call,
        Err(e) if e.is_instance_of::<PyAttributeError>(py) => {
            return Err(MapplyError::NotCallable("Instance is not callable".into()));
        }
        Err(e) => return Err(e.into()),
    };
    let descriptor = if is_bound_method(&call)? {
        describe_method(&call, shape)?
    } else if call.is_instance_of::<PyFunction>() {
        describe(&call, shape, false)?
    } else {
        return Err(MapplyError::unsupported(shape, "instances with a native __call__ are not supported"));
    };
    Ok(Classified { shape, descriptor: Some(descriptor) })
}

/// Reduce el callable a la función Python subyacente y lee su descriptor.
pub fn classify(callable: &Bound<'_, PyAny>) -> Result<Classified, MapplyError> {
    if !callable.is_callable() {
        return Err(MapplyError::NotCallable("first parameter must be callable".into()));
    }
    let classified = if callable.is_instance_of::<PyFunction>() {
        let shape = CallableShape::PlainFunction;
        Classified { shape, descriptor: Some(describe(callable, shape, false)?) }
    } else if is_bound_method(callable)? {
        let shape = CallableShape::Method;
        Classified { shape, descriptor: Some(describe_method(callable, shape)?) }
    } else if let Ok(ty) = callable.downcast::<PyType>() {
        classify_class(ty)?
    } else if callable.is_instance_of::<PyCFunction>() {
        return Err(MapplyError::unsupported(CallableShape::NativeFunction,
                                            "functions implemented in C are not supported"));
    } else {
        classify_instance(callable)?
    };
    debug!("classified callable as {} (descriptor: {:?})", classified.shape, classified.descriptor);
    Ok(classified)
}

/// Descriptor de la función que ejecutaría `callable`.
pub fn arginfo(callable: &Bound<'_, PyAny>) -> Result<Option<FunctionDescriptor>, MapplyError> {
    classify(callable).map(|c| c.descriptor)
}

/// Separa los `leading` primeros argumentos posicionales del resto.
pub fn split_invocation<'py>(function: &'static str,
                             args: &Bound<'py, PyTuple>,
                             leading: usize)
                             -> Result<(Vec<Bound<'py, PyAny>>, Bound<'py, PyTuple>), MapplyError> {
    let given = args.len();
    if given < leading {
        return Err(MapplyError::Arity { function, required: leading, given });
    }
    let head = (0..leading).map(|i| args.get_item(i)).collect::<PyResult<Vec<_>>>()?;
    Ok((head, args.get_slice(leading, given)))
}

/// Llama `callable(*args, **kwargs)` añadiendo `lookup=lookup` si la función
/// subyacente declara un parámetro `lookup` y no acepta `**kw`.
///
/// Con `KwargsPolicy::MutateInPlace` el diccionario `kwargs` del llamador
/// recibe la entrada `lookup`; con `CopyOnAugment` queda intacto. Los errores
/// del callable se devuelven como `MapplyError::Python` sin modificar.
pub fn lookup_mapply<'py>(callable: &Bound<'py, PyAny>,
                          lookup: &Bound<'py, PyAny>,
                          args: &Bound<'py, PyTuple>,
                          kwargs: Option<&Bound<'py, PyDict>>,
                          policy: KwargsPolicy)
                          -> Result<Bound<'py, PyAny>, MapplyError> {
    let classified = classify(callable)?;
    let inject = classified.wants_lookup();
    trace!("{} {}: inject lookup = {inject}", classified.shape, callable_name(callable));
    if !inject {
        return Ok(callable.call(args, kwargs)?);
    }

    let py = callable.py();
    let name = intern!(py, LOOKUP_NAME);
    let kw = match (kwargs, policy) {
        (Some(kw), KwargsPolicy::MutateInPlace) => kw.clone(),
        (Some(kw), KwargsPolicy::CopyOnAugment) => kw.copy()?,
        (None, _) => PyDict::new(py),
    };
    if kw.contains(name)? {
        warn!("explicit '{LOOKUP_NAME}' keyword for {} replaced by injected value", callable_name(callable));
    }
    kw.set_item(name, lookup)?;
    Ok(callable.call(args, Some(&kw))?)
}

/// Llama `callable` pasando sólo los keywords que declara. Si acepta `**kw`
/// se pasan todos.
pub fn mapply<'py>(callable: &Bound<'py, PyAny>,
                   args: &Bound<'py, PyTuple>,
                   kwargs: Option<&Bound<'py, PyDict>>)
                   -> Result<Bound<'py, PyAny>, MapplyError> {
    let classified = classify(callable)?;
    let Some(kw) = kwargs else {
        return Ok(callable.call(args, None)?);
    };
    let result = match &classified.descriptor {
        Some(d) if d.accepts_arbitrary_keywords() => callable.call(args, Some(kw)),
        Some(d) => {
            let filtered = PyDict::new(callable.py());
            for name in d.keyword_names() {
                if let Some(value) = kw.get_item(name)? {
                    filtered.set_item(name, value)?;
                }
            }
            callable.call(args, Some(&filtered))
        }
        None => callable.call(args, None),
    };
    Ok(result?)
}

fn callable_name(callable: &Bound<'_, PyAny>) -> String {
    callable.getattr(intern!(callable.py(), "__qualname__"))
            .and_then(|n| n.extract::<String>())
            .unwrap_or_else(|_| "<callable>".to_string())
}
