//! Shared test fixtures: an in-memory file tree plus a line-oriented mock
//! host runtime.
//!
//! The mock language, one statement per line:
//! - `def NAME` binds a callable that returns `"NAME result"`
//! - `let NAME = 42` / `let NAME = "text"` binds an int or string
//! - `import "<path>"` issues a nested load and binds the unit
//! - `BINDING = __load_any__('spec', ...)  # stmt @ line:off` services a
//!   rewritten fallback chain
//! - `from .` lines report an unresolvable relative reference
//! - `fail MESSAGE` aborts execution
//! - `#` comments and blank lines are skipped

#![allow(dead_code)]

use std::any::Any;
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use pathload_core::error::CodeInfo;
use pathload_core::host::{
    CompileFailure, CompiledUnit, ExecContext, ExecuteFailure, HostRuntime, RelativeRefKind,
};
use pathload_core::loader::{FallbackOutcome, Loader};
use pathload_core::options::LoadOptions;
use pathload_core::rewrite::Candidate;
use pathload_core::value::{Callable, UnitRef, Value};
use pathload_core::LoaderConfig;
use pathload_vfs::MemoryFileSystem;

pub struct Script {
    name: String,
    lines: Vec<String>,
}

impl CompiledUnit for Script {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

struct ScriptFn {
    name: String,
}

impl Callable for ScriptFn {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, _args: &[Value]) -> Result<Value, ExecuteFailure> {
        Ok(Value::Str(format!("{} result", self.name)))
    }
}

/// Line-oriented host runtime over the mock language.
pub struct MockHost {
    compile_count: Rc<Cell<usize>>,
}

impl MockHost {
    pub fn new(compile_count: Rc<Cell<usize>>) -> Self {
        Self { compile_count }
    }
}

impl HostRuntime for MockHost {
    fn compile(
        &self,
        name: &str,
        source: &[u8],
        _display_path: &Path,
    ) -> Result<Box<dyn CompiledUnit>, CompileFailure> {
        self.compile_count.set(self.compile_count.get() + 1);
        let text = String::from_utf8(source.to_vec())
            .map_err(|_| CompileFailure::new("source is not valid UTF-8"))?;
        Ok(Box::new(Script {
            name: name.to_string(),
            lines: text.lines().map(str::to_string).collect(),
        }))
    }

    fn execute(
        &self,
        compiled: &dyn CompiledUnit,
        ctx: &mut ExecContext<'_>,
    ) -> Result<(), ExecuteFailure> {
        let script = compiled
            .as_any()
            .downcast_ref::<Script>()
            .ok_or_else(|| ExecuteFailure::runtime("not a mock script"))?;

        for line in &script.lines {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            execute_line(line, ctx)?;
        }
        Ok(())
    }
}

fn execute_line(line: &str, ctx: &mut ExecContext<'_>) -> Result<(), ExecuteFailure> {
    if let Some(name) = line.strip_prefix("def ") {
        let name = name.trim().to_string();
        ctx.env.set(
            name.clone(),
            Value::Callable(Rc::new(ScriptFn { name })),
        );
        return Ok(());
    }

    if let Some(rest) = line.strip_prefix("let ") {
        let (name, literal) = rest
            .split_once('=')
            .ok_or_else(|| ExecuteFailure::runtime(format!("bad let: {}", line)))?;
        let name = name.trim().to_string();
        let literal = literal.trim();
        let value = if let Some(text) = literal.strip_prefix('"') {
            Value::Str(text.trim_end_matches('"').to_string())
        } else {
            let n: i64 = literal
                .parse()
                .map_err(|_| ExecuteFailure::runtime(format!("bad literal: {}", literal)))?;
            Value::Int(n)
        };
        ctx.env.set(name, value);
        return Ok(());
    }

    if let Some(rest) = line.strip_prefix("import ") {
        let path = rest.trim().trim_matches('"');
        let unit = ctx
            .loader
            .load_unit(path, LoadOptions::new().with_caller(ctx.path))?;
        ctx.env
            .set(unit.name().to_string(), Value::Unit(UnitRef::new(&unit)));
        return Ok(());
    }

    if line.contains("__load_any__") {
        return execute_fallback(line, ctx);
    }

    if line.starts_with("from .") {
        return Err(ExecuteFailure::RelativeReference {
            kind: RelativeRefKind::NoParentPackage,
            statement: line.to_string(),
        });
    }

    if let Some(message) = line.strip_prefix("fail") {
        return Err(ExecuteFailure::runtime(message.trim().to_string()));
    }

    Err(ExecuteFailure::runtime(format!(
        "unrecognized statement: {}",
        line
    )))
}

fn execute_fallback(line: &str, ctx: &mut ExecContext<'_>) -> Result<(), ExecuteFailure> {
    let (binding, rest) = line
        .split_once(" = __load_any__(")
        .ok_or_else(|| ExecuteFailure::runtime(format!("bad directive: {}", line)))?;
    let (args, trailer) = rest
        .split_once(')')
        .ok_or_else(|| ExecuteFailure::runtime(format!("bad directive: {}", line)))?;

    let candidates: Vec<Candidate> = args
        .split(", ")
        .map(|arg| Candidate::from_spec(arg.trim_matches('\'')))
        .collect();

    let origin = parse_origin(trailer, ctx.path);
    let outcome = ctx
        .loader
        .load_fallback(&candidates, binding, ctx.path, origin)?;

    match outcome {
        FallbackOutcome::Value(value) => ctx.env.set(binding.to_string(), value),
        FallbackOutcome::Unit(unit) => ctx
            .env
            .set(binding.to_string(), Value::Unit(UnitRef::new(&unit))),
        FallbackOutcome::Bindings(bindings) => ctx.env.merge(bindings),
    }
    Ok(())
}

fn parse_origin(trailer: &str, path: &Path) -> CodeInfo {
    // Trailer format: `  # <statement> @ <line>:<offset>`
    let comment = trailer.trim_start().trim_start_matches('#').trim_start();
    let (source, location) = comment.rsplit_once(" @ ").unwrap_or((comment, "0:0"));
    let (line, offset) = location.split_once(':').unwrap_or(("0", "0"));
    CodeInfo {
        source: source.to_string(),
        file_path: path.to_path_buf(),
        line: line.parse().unwrap_or(0),
        offset: offset.parse().unwrap_or(0),
    }
}

/// Build a loader over an in-memory file tree, returning the host's compile
/// counter alongside.
pub fn loader_with(files: &[(&str, &str)]) -> (Loader, Rc<Cell<usize>>) {
    let (loader, _, compile_count) = loader_with_fs(files);
    (loader, compile_count)
}

/// Like [`loader_with`], also handing back a clone of the memory file
/// system; clones share storage, so the test can edit files after loads.
pub fn loader_with_fs(
    files: &[(&str, &str)],
) -> (Loader, MemoryFileSystem, Rc<Cell<usize>>) {
    // Engine traces go to the test writer; run with RUST_LOG=debug and
    // --nocapture to see them.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let vfs = MemoryFileSystem::with_files(files.iter().map(|(p, c)| (*p, *c)));
    let compile_count = Rc::new(Cell::new(0));
    let host = MockHost::new(compile_count.clone());
    let loader = Loader::new(
        Box::new(vfs.clone()),
        Box::new(host),
        LoaderConfig::with_base_dir("/app"),
    );
    (loader, vfs, compile_count)
}
