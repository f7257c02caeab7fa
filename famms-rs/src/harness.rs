//! Smoke-test driver behind the `famms` binary.
//!
//! Builds one functor from the command line (the base functor, an
//! expression, or a script function), evaluates it at a point and formats
//! the scalar and vector results.  With a problem file it instead assigns the
//! problem to a [`CallbackTable`] and prints every inserted callback.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;

use crate::callback::{ExprCallable, CallbackFunctor};
use crate::cli::{self, CliArgs, ConfigFile, Script};
use crate::config::Problem;
use crate::error::{ExprError, FammsError};
use crate::famms::{space_symbols, CallbackTable, DEFAULT_TIME};
use crate::functor::{BaseFunctor, Functor};
use crate::script::Expr;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Famms(#[from] FammsError),

    #[error(transparent)]
    Expr(#[from] ExprError),

    #[error("{0}")]
    Script(String),

    #[error("built without the `{0}` feature")]
    FeatureDisabled(&'static str),
}

// ── Formatting ────────────────────────────────────────────────────────────────

/// Six decimals followed by a space, like each vector entry.
pub fn format_scalar(x: f64) -> String {
    format!("{x:.6} ")
}

/// Six decimals per value, each followed by a space.
pub fn format_vector(values: &[f64]) -> String {
    values.iter().map(|x| format!("{x:.6} ")).collect()
}

pub fn test_scalar(f: &dyn Functor, point: &[f64], t: f64) -> String {
    format_scalar(f.eval(point, t))
}

/// Evaluate into a zeroed buffer of `len` entries.
pub fn test_vector(f: &dyn Functor, point: &[f64], len: usize, t: f64) -> String {
    let mut rets = vec![0.0; len];
    f.eval_vector(point, &mut rets, t);
    format_vector(&rets)
}

fn test_gradient(f: &dyn Functor, point: &[f64], len: usize, t: f64) -> String {
    let mut rets = vec![0.0; len];
    f.eval_gradient(point, &mut rets, t);
    format_vector(&rets)
}

// ── Functor construction ──────────────────────────────────────────────────────

/// The functor selected by `-e`, `-p`/`-l`, or the base functor.
pub fn build_functor(args: &CliArgs) -> Result<Box<dyn Functor>, HarnessError> {
    if !args.exprs.is_empty() {
        let space = space_symbols(args.point.len());
        let components = args
            .exprs
            .iter()
            .map(|s| Expr::parse(s))
            .collect::<Result<Vec<_>, _>>()?;
        let callable = match <[Expr; 1]>::try_from(components) {
            Ok([e]) => ExprCallable::scalar(e, &space, Some(DEFAULT_TIME)),
            Err(many) => ExprCallable::vector(many, &space, Some(DEFAULT_TIME)),
        };
        return Ok(Box::new(CallbackFunctor::attach(Rc::new(callable))));
    }
    match &args.script {
        None => Ok(Box::new(BaseFunctor)),
        Some(Script::Python(path)) => python_functor(path, args.func_name()),
        Some(Script::Lua(path)) => lua_functor(path, args.func_name()),
    }
}

#[cfg(feature = "python")]
fn python_functor(path: &Path, func: &str) -> Result<Box<dyn Functor>, HarnessError> {
    let session = crate::python::PythonSession::new();
    let script_err = |e: pyo3::PyErr| HarnessError::Script(format!("{}: {e}", path.display()));
    session.run_file(path).map_err(script_err)?;
    let callable = session.callable(func).map_err(script_err)?;
    Ok(Box::new(CallbackFunctor::attach(Rc::new(callable))))
}

#[cfg(not(feature = "python"))]
fn python_functor(_path: &Path, _func: &str) -> Result<Box<dyn Functor>, HarnessError> {
    Err(HarnessError::FeatureDisabled("python"))
}

#[cfg(feature = "lua")]
fn lua_functor(path: &Path, func: &str) -> Result<Box<dyn Functor>, HarnessError> {
    let session = crate::lua::LuaSession::new();
    let script_err = |e: mlua::Error| HarnessError::Script(format!("{}: {e}", path.display()));
    session.load_file(path).map_err(script_err)?;
    let callable = session.callable(func).map_err(script_err)?;
    Ok(Box::new(CallbackFunctor::attach(Rc::new(callable))))
}

#[cfg(not(feature = "lua"))]
fn lua_functor(_path: &Path, _func: &str) -> Result<Box<dyn Functor>, HarnessError> {
    Err(HarnessError::FeatureDisabled("lua"))
}

// ── Problem files ─────────────────────────────────────────────────────────────

fn problem_path(config: &ConfigFile) -> Option<PathBuf> {
    match config {
        ConfigFile::Skip => None,
        ConfigFile::Explicit(path) => Some(path.clone()),
        ConfigFile::Search => cli::find_user_config(),
    }
}

/// Assign the problem at `path` and print every callback at `point`.
pub fn run_problem(path: &Path, point: &[f64], t: f64) -> Result<Vec<String>, HarnessError> {
    let (problem, errors) = Problem::load_file(path).map_err(|source| HarnessError::Io {
        path: path.to_owned(),
        source,
    })?;
    for e in &errors {
        tracing::warn!(path = %path.display(), "{e}");
    }

    let mut sim = CallbackTable::new();
    let famms = problem.assign(&mut sim)?;
    tracing::debug!(path = %path.display(), callbacks = sim.len(), "problem assigned");

    let mut lines = Vec::new();
    let (v_name, b_name) = famms.callback_names();
    let fields = [(v_name, famms.solution()), (b_name, famms.source())];
    for (name, field) in fields {
        let (Some(f), Some(field)) = (sim.get(name), field) else {
            continue;
        };
        if field.is_scalar() {
            lines.push(format!("{name}: {}", test_scalar(f, point, t)));
        } else {
            let len = field.components().len();
            lines.push(format!("{name}: {}", test_vector(f, point, len, t)));
        }
    }
    if let (Some(v), Some(g)) = (sim.get(v_name), famms.gradient()) {
        let len = g.components().len();
        lines.push(format!("{v_name} grad: {}", test_gradient(v, point, len, t)));
    }
    for extra in famms.extra_names() {
        let slot = format!("set_{extra}");
        if let Some(f) = sim.get(&slot) {
            lines.push(format!("{slot}: {}", test_scalar(f, point, t)));
        }
    }
    Ok(lines)
}

// ── Entry point ───────────────────────────────────────────────────────────────

/// Run the harness and return the lines to print.
pub fn run(args: &CliArgs) -> Result<Vec<String>, HarnessError> {
    if args.exprs.is_empty() && args.script.is_none() {
        if let Some(path) = problem_path(&args.config) {
            return run_problem(&path, &args.point, args.time);
        }
    }

    let functor = build_functor(args)?;
    let point = &args.point;
    Ok(vec![
        test_scalar(functor.as_ref(), point, args.time),
        test_vector(functor.as_ref(), point, point.len(), args.time),
    ])
}

// ── Tests ─────────────────────────────────────────────────────────────────────
