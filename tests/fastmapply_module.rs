//! El módulo `fastmapply` usado desde código Python.

use pyo3::ffi::c_str;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use pyo3::wrap_pymodule;
use std::ffi::CStr;
use test_support::fixtures;

fn run(code: &CStr) {
    Python::attach(|py| {
        let globals = PyDict::new(py);
        globals.set_item("fastmapply", wrap_pymodule!(reg_mapply::fastmapply)(py)).unwrap();
        globals.set_item("fx", fixtures(py)).unwrap();
        if let Err(e) = py.run(code, Some(&globals), None) {
            e.print(py);
            panic!("python snippet failed: {e}");
        }
    });
}

#[test]
fn lookup_mapply_from_python() {
    run(c_str!(
        r#"
lm = fastmapply.lookup_mapply
assert lm(fx.without_lookup, 'lookup', 1) == 1
assert lm(fx.with_lookup, 'lookup', 1) == (1, 'lookup')
assert lm(fx.defines_kw, 'lookup', 1) == (1, {})
assert lm(fx.without_lookup, 'lookup', a=1) == 1
assert lm(fx.with_lookup, 'lookup', a=1) == (1, 'lookup')
assert lm(fx.Foo().f, 'lookup', 1) == (1, 'lookup')
assert lm(fx.CallableInstance(), 'lookup', 1) == (1, 'lookup')
obj = lm(fx.WithInit, 'lookup', 1)
assert (obj.a, obj.lookup) == (1, 'lookup')
assert isinstance(lm(fx.WithoutInit, 'lookup'), fx.WithoutInit)
assert lm(int, 'lookup', '1') == 1
"#
    ));
}

#[test]
fn error_kinds_from_python() {
    run(c_str!(
        r#"
lm = fastmapply.lookup_mapply

def expect(exc, *args):
    try:
        lm(*args)
    except exc as e:
        return e
    raise AssertionError("%r not raised" % exc)

e = expect(fastmapply.ArityError, fx.with_lookup)
assert isinstance(e, TypeError)
expect(fastmapply.ArityError)
e = expect(fastmapply.NotCallableError, fx.WithoutInit(), 'lookup')
assert isinstance(e, TypeError)
e = expect(fastmapply.UnsupportedCallableError, dir, 'lookup')
assert isinstance(e, TypeError)
expect(fastmapply.UnsupportedCallableError, fx.Legacy, 'lookup')
e = expect(ValueError, fx.raises, 'lookup', 1)
assert str(e) == "raised by callable"
assert not isinstance(e, TypeError)
"#
    ));
}

#[test]
fn keyword_dict_of_python_caller_is_never_mutated() {
    run(c_str!(
        r#"
kw = {'y': 2}
assert fastmapply.lookup_mapply(fx.three, 'L', 1, **kw) == (1, 2, 'L')
assert kw == {'y': 2}
"#
    ));
}

#[test]
fn mapply_from_python() {
    run(c_str!(
        r#"
m = fastmapply.mapply
assert m(fx.PlainInit, a=1).a == 1
assert m(fx.PlainInit, a=1, b=1).a == 1
assert m(fx.Foo().method, a=1, b=2) == "method with 1"
assert m(fx.CallableNoLookup(), a=1, b=1) == "called with 1"
assert m(fx.without_lookup, 1) == 1
assert m(fx.defines_kw, 1, b=2) == (1, {'b': 2})
assert m(fx.star_args, a=1) == ()
assert m(fx.star_args, 1) == (1,)
assert m(fx.all_args_kw, 2, 3, b=1) == (2, (3,), {'b': 1})
try:
    m(fx.without_lookup, b=2)
except TypeError:
    pass
else:
    raise AssertionError("missing argument not reported")
try:
    m(1, a=1)
except fastmapply.NotCallableError:
    pass
else:
    raise AssertionError("non callable accepted")
"#
    ));
}

#[test]
fn arginfo_from_python() {
    run(c_str!(
        r#"
info = fastmapply.arginfo(fx.all_args_kw)
assert info.args == ['a']
assert info.varargs == 'args'
assert info.keywords == 'kw'
assert "ArgInfo" in repr(info)
assert fastmapply.arginfo(fx.Foo().f).args == ['self', 'a', 'lookup']
assert fastmapply.arginfo(fx.WithoutInit) is None
"#
    ));
}
