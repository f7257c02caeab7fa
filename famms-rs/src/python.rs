//! Optional Python callables via the `pyo3` crate.
//!
//! Enabled with the `python` Cargo feature:
//! ```text
//! cargo build --features python
//! cargo test  --features python
//! ```
//!
//! # Calling convention
//!
//! A Python callback is called as `f(point, t)` where `point` is a tuple of
//! floats.  It may return
//!
//! | Python result              | Unmarshaled as            |
//! |----------------------------|---------------------------|
//! | `float` / `int`            | [`Returned::Scalar`]      |
//! | list/tuple of numbers      | [`Returned::Sequence`]    |
//! | anything else              | incompatible-type error   |
//!
//! A raised exception becomes [`CallbackError::Raised`].
//!
//! [`Returned::Scalar`]: crate::callback::Returned::Scalar
//! [`Returned::Sequence`]: crate::callback::Returned::Sequence
//! [`CallbackError::Raised`]: crate::error::CallbackError::Raised

#[cfg(feature = "python")]
pub use python_impl::{PyCallable, PythonSession};

#[cfg(feature = "python")]
mod python_impl {
    use std::path::Path;
    use std::sync::OnceLock;

    use pyo3::prelude::*;
    use pyo3::types::PyTuple;

    use crate::callback::{Callable, Returned};
    use crate::error::CallbackError;

    static PYTHON_INIT: OnceLock<()> = OnceLock::new();

    // ── PyCallable ────────────────────────────────────────────────────────

    /// A Python callable behind the [`Callable`] interface.
    ///
    /// Holds one strong Python reference: taken in [`PyCallable::new`],
    /// released when the value is dropped.
    pub struct PyCallable {
        func: Py<PyAny>,
        name: String,
    }

    impl PyCallable {
        /// Take a new reference to `func`.  Fails if it is not callable.
        pub fn new(func: &Bound<'_, PyAny>) -> PyResult<Self> {
            if !func.is_callable() {
                return Err(pyo3::exceptions::PyTypeError::new_err(format!(
                    "'{}' object is not callable",
                    func.get_type()
                )));
            }
            let name = func
                .getattr("__name__")
                .and_then(|n| n.extract::<String>())
                .unwrap_or_else(|_| "<python callable>".to_owned());
            Ok(Self {
                func: func.clone().unbind(),
                name,
            })
        }
    }

    fn unmarshal(result: &Bound<'_, PyAny>) -> Result<Returned, CallbackError> {
        if let Ok(x) = result.extract::<f64>() {
            return Ok(Returned::Scalar(x));
        }
        if let Ok(v) = result.extract::<Vec<f64>>() {
            return Ok(Returned::Sequence(v));
        }
        Err(CallbackError::IncompatibleType {
            expected: "number or sequence of numbers",
            got: result.get_type().to_string(),
        })
    }

    impl Callable for PyCallable {
        fn call(&self, point: &[f64], t: f64) -> Result<Returned, CallbackError> {
            Python::with_gil(|py| {
                let pt = PyTuple::new_bound(py, point.iter().copied());
                let result = self
                    .func
                    .bind(py)
                    .call1((pt, t))
                    .map_err(|e| CallbackError::Raised(e.to_string()))?;
                unmarshal(&result)
            })
        }

        fn describe(&self) -> String {
            format!("python:{}", self.name)
        }
    }

    // ── PythonSession ─────────────────────────────────────────────────────

    /// Handle on the process-wide Python interpreter.
    ///
    /// Code runs in the `__main__` namespace, so functions defined by
    /// [`PythonSession::exec`] or [`PythonSession::run_file`] can be looked
    /// up with [`PythonSession::callable`].
    pub struct PythonSession;

    impl PythonSession {
        /// Initialise the interpreter (at most once per process).
        pub fn new() -> Self {
            PYTHON_INIT.get_or_init(pyo3::prepare_freethreaded_python);
            Self
        }

        /// Execute Python statements in the `__main__` namespace.
        pub fn exec(&self, code: &str) -> PyResult<()> {
            Python::with_gil(|py| py.run_bound(code, None, None))
        }

        /// Evaluate a Python expression and return the result.
        pub fn eval_expr(&self, expr: &str) -> PyResult<PyObject> {
            Python::with_gil(|py| py.eval_bound(expr, None, None).map(|v| v.unbind()))
        }

        /// Execute a Python source file in the `__main__` namespace.
        pub fn run_file(&self, path: &Path) -> PyResult<()> {
            let code = std::fs::read_to_string(path).map_err(|e| {
                PyErr::new::<pyo3::exceptions::PyOSError, _>(format!("{}: {e}", path.display()))
            })?;
            self.exec(&code)
        }

        /// Wrap the `__main__` attribute `name` as a [`PyCallable`].
        pub fn callable(&self, name: &str) -> PyResult<PyCallable> {
            Python::with_gil(|py| {
                let func = py.import_bound("__main__")?.getattr(name)?;
                PyCallable::new(&func)
            })
        }
    }

    impl Default for PythonSession {
        fn default() -> Self {
            Self::new()
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
