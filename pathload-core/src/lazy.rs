//! Lazy binding proxies
//!
//! A lazy proxy stands in for a unit or callable that has not been loaded
//! yet. The underlying load runs at most once, on first use, and only a
//! successful load is cached; a failed first use leaves the proxy armed so a
//! later attempt can retry after the cause is fixed.

use std::fmt;
use std::rc::Rc;

use once_cell::unsync::OnceCell;
use tracing::debug;

use crate::error::LoadError;
use crate::host::ExecuteFailure;
use crate::unit::Unit;
use crate::value::{Callable, Value};

/// Deferred producer of a unit.
pub type UnitLoaderFn = Box<dyn Fn() -> Result<Rc<Unit>, LoadError>>;

/// Deferred producer of a callable.
pub type CallableLoaderFn = Box<dyn Fn() -> Result<Rc<dyn Callable>, LoadError>>;

/// A unit that loads on first access.
pub struct LazyUnit {
    path: String,
    loader: UnitLoaderFn,
    cell: OnceCell<Rc<Unit>>,
}

impl LazyUnit {
    pub fn new(path: impl Into<String>, loader: UnitLoaderFn) -> Self {
        Self {
            path: path.into(),
            loader,
            cell: OnceCell::new(),
        }
    }

    /// The request path this proxy defers.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Has the underlying load already run successfully?
    pub fn is_resolved(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Force the load, or return the already-loaded unit.
    pub fn resolve(&self) -> Result<Rc<Unit>, LoadError> {
        self.cell
            .get_or_try_init(|| {
                debug!(path = %self.path, "resolving lazy unit");
                (self.loader)()
            })
            .cloned()
    }

    /// Look up a symbol, loading the unit first if needed.
    pub fn get(&self, name: &str) -> Result<Option<Value>, LoadError> {
        Ok(self.resolve()?.symbol(name))
    }
}

impl fmt::Debug for LazyUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyUnit")
            .field("path", &self.path)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// A callable symbol that loads its unit on first call.
pub struct LazyCallable {
    symbol: String,
    loader: CallableLoaderFn,
    resolved: OnceCell<Rc<dyn Callable>>,
}

impl LazyCallable {
    pub fn new(symbol: impl Into<String>, loader: CallableLoaderFn) -> Self {
        Self {
            symbol: symbol.into(),
            loader,
            resolved: OnceCell::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    fn target(&self) -> Result<Rc<dyn Callable>, LoadError> {
        self.resolved
            .get_or_try_init(|| {
                debug!(symbol = %self.symbol, "resolving lazy callable");
                (self.loader)()
            })
            .cloned()
    }
}

impl Callable for LazyCallable {
    fn name(&self) -> &str {
        &self.symbol
    }

    fn call(&self, args: &[Value]) -> Result<Value, ExecuteFailure> {
        let target = self.target().map_err(ExecuteFailure::from)?;
        target.call(args)
    }
}

impl fmt::Debug for LazyCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyCallable")
            .field("symbol", &self.symbol)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::path::PathBuf;

    fn make_unit(name: &str) -> Rc<Unit> {
        Rc::new(Unit::new(
            name.to_string(),
            name.to_string(),
            PathBuf::from(format!("/{}.py", name)),
            PathBuf::from(format!("/{}.py", name)),
            None,
            None,
        ))
    }

    #[test]
    fn test_lazy_unit_loads_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let lazy = LazyUnit::new(
            "__dir__/mod.py",
            Box::new(move || {
                counter.set(counter.get() + 1);
                Ok(make_unit("mod"))
            }),
        );

        assert!(!lazy.is_resolved());
        assert_eq!(calls.get(), 0);

        let first = lazy.resolve().unwrap();
        let second = lazy.resolve().unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(calls.get(), 1);
        assert!(lazy.is_resolved());
    }

    #[test]
    fn test_lazy_unit_retries_after_failure() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let lazy = LazyUnit::new(
            "__dir__/mod.py",
            Box::new(move || {
                counter.set(counter.get() + 1);
                if counter.get() == 1 {
                    Err(LoadError::invalid_options("first attempt fails"))
                } else {
                    Ok(make_unit("mod"))
                }
            }),
        );

        assert!(lazy.resolve().is_err());
        assert!(!lazy.is_resolved());
        assert!(lazy.resolve().is_ok());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_lazy_unit_symbol_lookup() {
        let unit = make_unit("mod");
        unit.env_mut().set("answer", Value::Int(42));
        let lazy = LazyUnit::new("__dir__/mod.py", Box::new(move || Ok(unit.clone())));

        assert_eq!(lazy.get("answer").unwrap(), Some(Value::Int(42)));
        assert_eq!(lazy.get("missing").unwrap(), None);
    }

    struct Double;

    impl Callable for Double {
        fn name(&self) -> &str {
            "double"
        }

        fn call(&self, args: &[Value]) -> Result<Value, ExecuteFailure> {
            match args {
                [Value::Int(n)] => Ok(Value::Int(n * 2)),
                _ => Err(ExecuteFailure::runtime("expected one int")),
            }
        }
    }

    #[test]
    fn test_lazy_callable_defers_until_first_call() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let lazy = LazyCallable::new(
            "double",
            Box::new(move || {
                counter.set(counter.get() + 1);
                Ok(Rc::new(Double) as Rc<dyn Callable>)
            }),
        );

        assert_eq!(calls.get(), 0);
        assert_eq!(lazy.call(&[Value::Int(3)]).unwrap(), Value::Int(6));
        assert_eq!(lazy.call(&[Value::Int(4)]).unwrap(), Value::Int(8));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_lazy_callable_surfaces_load_error() {
        let lazy = LazyCallable::new(
            "broken",
            Box::new(|| Err(LoadError::invalid_options("no such symbol"))),
        );

        let err = lazy.call(&[]).unwrap_err();
        assert!(matches!(err, ExecuteFailure::Load(_)));
    }
}
