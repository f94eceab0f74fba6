//! Binding values
//!
//! A unit's execution produces an environment of named bindings. `Value` is
//! the closed set of binding shapes the engine itself understands; anything
//! richer lives behind the [`Callable`] trait object the host supplies.

use std::fmt;
use std::rc::{Rc, Weak};

use crate::host::ExecuteFailure;
use crate::unit::Unit;

/// A callable binding.
///
/// Implemented by the host runtime for functions defined in hosted code, and
/// by [`LazyCallable`](crate::lazy::LazyCallable) for deferred symbols.
pub trait Callable {
    /// Name of the callable, for diagnostics.
    fn name(&self) -> &str;

    /// Invoke the callable.
    fn call(&self, args: &[Value]) -> Result<Value, ExecuteFailure>;
}

/// A reference to a loaded unit, held weakly.
///
/// Units reference themselves from their own environment (the `__unit__`
/// binding); a weak link keeps rollback from leaking failed units.
#[derive(Clone)]
pub struct UnitRef(Weak<Unit>);

impl UnitRef {
    /// Create a reference to the given unit.
    pub fn new(unit: &Rc<Unit>) -> Self {
        Self(Rc::downgrade(unit))
    }

    /// Upgrade to a strong unit handle, if the unit is still registered.
    pub fn upgrade(&self) -> Option<Rc<Unit>> {
        self.0.upgrade()
    }
}

impl fmt::Debug for UnitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(unit) => write!(f, "UnitRef({})", unit.qualified_name()),
            None => write!(f, "UnitRef(<dropped>)"),
        }
    }
}

/// A binding value in a unit's environment.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// A loaded unit, e.g. the result of binding a whole sibling file.
    Unit(UnitRef),
    /// A callable, either host-defined or lazily bound.
    Callable(Rc<dyn Callable>),
}

impl Value {
    /// Runtime type name, used by the typed-import conformance check.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Unit(_) => "unit",
            Value::Callable(_) => "callable",
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Callable(_))
    }

    pub fn as_callable(&self) -> Option<Rc<dyn Callable>> {
        match self {
            Value::Callable(c) => Some(c.clone()),
            _ => None,
        }
    }

    pub fn as_unit(&self) -> Option<Rc<Unit>> {
        match self {
            Value::Unit(r) => r.upgrade(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Unit(r) => write!(f, "{:?}", r),
            Value::Callable(c) => write!(f, "Callable({})", c.name()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Unit(a), Value::Unit(b)) => match (a.upgrade(), b.upgrade()) {
                (Some(a), Some(b)) => Rc::ptr_eq(&a, &b),
                _ => false,
            },
            (Value::Callable(a), Value::Callable(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Expected type of a requested symbol, for typed imports.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedType {
    /// The symbol must be callable.
    Callable,
    /// The symbol's runtime type name must match exactly.
    Named(String),
}

impl ExpectedType {
    /// Check a value against this expectation.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ExpectedType::Callable => value.is_callable(),
            ExpectedType::Named(name) => value.type_name() == name,
        }
    }

    /// Human-readable description for error messages.
    pub fn describe(&self) -> String {
        match self {
            ExpectedType::Callable => String::from("callable"),
            ExpectedType::Named(name) => name.clone(),
        }
    }
}
