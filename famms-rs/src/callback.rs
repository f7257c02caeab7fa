//! Adapter from an externally supplied callable to the [`Functor`] interface.
//!
//! A [`CallbackFunctor`] owns a shared reference to a [`Callable`] (and
//! optionally a second one for the gradient).  Every evaluation marshals the
//! point and the time into the callable's calling convention, invokes it, and
//! unmarshals the result:
//!
//! | Call            | Expected result | On failure                  |
//! |-----------------|-----------------|-----------------------------|
//! | `eval`          | scalar          | `0.0`                       |
//! | `eval_vector`   | sequence        | output buffer left untouched |
//! | `eval_gradient` | sequence        | output buffer left untouched |
//!
//! The `try_*` methods expose the underlying [`CallbackError`] instead.
//!
//! Backends: [`FnCallable`] (a Rust closure), [`ExprCallable`] (an
//! expression from [`crate::script`]), and behind the `python` / `lua`
//! features `PyCallable` and `LuaCallable`.

use std::fmt;
use std::rc::Rc;

use crate::error::CallbackError;
use crate::functor::Functor;
use crate::script::{Bindings, Expr};

// ── Returned ──────────────────────────────────────────────────────────────────

/// A value unmarshaled from a callable's result.
#[derive(Debug, Clone, PartialEq)]
pub enum Returned {
    Scalar(f64),
    Sequence(Vec<f64>),
}

impl Returned {
    fn kind(&self) -> &'static str {
        match self {
            Returned::Scalar(_) => "scalar",
            Returned::Sequence(_) => "sequence",
        }
    }

    /// The scalar, or an incompatible-type error for a sequence.
    pub fn into_scalar(self) -> Result<f64, CallbackError> {
        match self {
            Returned::Scalar(x) => Ok(x),
            other => Err(CallbackError::IncompatibleType {
                expected: "scalar",
                got: other.kind().to_owned(),
            }),
        }
    }

    /// The sequence, or an incompatible-type error for a scalar.
    pub fn into_sequence(self) -> Result<Vec<f64>, CallbackError> {
        match self {
            Returned::Sequence(v) => Ok(v),
            other => Err(CallbackError::IncompatibleType {
                expected: "sequence",
                got: other.kind().to_owned(),
            }),
        }
    }
}

// ── Callable ──────────────────────────────────────────────────────────────────

/// An externally supplied function of `(point, t)`.
pub trait Callable {
    /// Invoke with the point coordinates and the time.
    fn call(&self, point: &[f64], t: f64) -> Result<Returned, CallbackError>;

    /// Short description used in log messages.
    fn describe(&self) -> String {
        "callable".to_owned()
    }
}

/// A Rust closure as a [`Callable`].
pub struct FnCallable<F>(pub F);

impl<F> FnCallable<F>
where
    F: Fn(&[f64], f64) -> Result<Returned, CallbackError>,
{
    pub fn new(f: F) -> Self {
        FnCallable(f)
    }
}

impl<F> Callable for FnCallable<F>
where
    F: Fn(&[f64], f64) -> Result<Returned, CallbackError>,
{
    fn call(&self, point: &[f64], t: f64) -> Result<Returned, CallbackError> {
        (self.0)(point, t)
    }

    fn describe(&self) -> String {
        "closure".to_owned()
    }
}

/// One or more expressions bound to space symbols and an optional time symbol.
///
/// `space[i]` is bound to `point[i]`; the time symbol is bound to `t`.  A
/// single component yields [`Returned::Scalar`], several yield
/// [`Returned::Sequence`].
#[derive(Debug, Clone)]
pub struct ExprCallable {
    components: Vec<Expr>,
    scalar: bool,
    names: Vec<String>,
    nsd: usize,
}

impl ExprCallable {
    pub fn scalar(expr: Expr, space: &[String], time: Option<&str>) -> Self {
        Self::build(vec![expr], true, space, time)
    }

    pub fn vector(components: Vec<Expr>, space: &[String], time: Option<&str>) -> Self {
        Self::build(components, false, space, time)
    }

    fn build(components: Vec<Expr>, scalar: bool, space: &[String], time: Option<&str>) -> Self {
        let mut names = space.to_vec();
        names.extend(time.map(str::to_owned));
        ExprCallable {
            components,
            scalar,
            names,
            nsd: space.len(),
        }
    }
}

impl Callable for ExprCallable {
    fn call(&self, point: &[f64], t: f64) -> Result<Returned, CallbackError> {
        if point.len() < self.nsd {
            return Err(CallbackError::MissingCoordinate {
                symbol: self.names[point.len()].clone(),
                index: point.len(),
                got: point.len(),
            });
        }
        let mut values: Vec<f64> = point[..self.nsd].to_vec();
        if self.names.len() > self.nsd {
            values.push(t);
        }
        let ctx = Bindings {
            names: &self.names,
            values: &values,
        };
        let out = self
            .components
            .iter()
            .map(|e| e.eval(&ctx))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| CallbackError::Raised(e.to_string()))?;
        if self.scalar {
            Ok(Returned::Scalar(out[0]))
        } else {
            Ok(Returned::Sequence(out))
        }
    }

    fn describe(&self) -> String {
        let parts: Vec<String> = self.components.iter().map(Expr::to_string).collect();
        if self.scalar {
            parts.join("")
        } else {
            format!("[{}]", parts.join(", "))
        }
    }
}

// ── CallbackFunctor ───────────────────────────────────────────────────────────

/// A [`Functor`] that forwards every evaluation to attached callables.
#[derive(Clone)]
pub struct CallbackFunctor {
    value: Rc<dyn Callable>,
    grad: Option<Rc<dyn Callable>>,
    nsd: Option<usize>,
}

impl fmt::Debug for CallbackFunctor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackFunctor")
            .field("value", &self.value.describe())
            .field("grad", &self.grad.as_ref().map(|g| g.describe()))
            .field("nsd", &self.nsd)
            .finish()
    }
}

impl CallbackFunctor {
    /// Attach `value`.  Shares ownership: the reference count of `value`
    /// goes up by one until this functor is dropped.
    pub fn attach(value: Rc<dyn Callable>) -> Self {
        tracing::debug!(callable = %value.describe(), "attach");
        CallbackFunctor {
            value,
            grad: None,
            nsd: None,
        }
    }

    /// Attach `value` together with its gradient.
    pub fn attach_with_gradient(value: Rc<dyn Callable>, grad: Rc<dyn Callable>) -> Self {
        tracing::debug!(callable = %value.describe(), grad = %grad.describe(), "attach");
        CallbackFunctor {
            value,
            grad: Some(grad),
            nsd: None,
        }
    }

    /// Only the first `nsd` coordinates of each point are passed on.
    pub fn with_nsd(mut self, nsd: usize) -> Self {
        self.nsd = Some(nsd);
        self
    }

    pub fn has_gradient(&self) -> bool {
        self.grad.is_some()
    }

    fn clip<'p>(&self, point: &'p [f64]) -> &'p [f64] {
        match self.nsd {
            Some(n) => &point[..n.min(point.len())],
            None => point,
        }
    }

    pub fn try_eval(&self, point: &[f64], t: f64) -> Result<f64, CallbackError> {
        self.value.call(self.clip(point), t)?.into_scalar()
    }

    /// Evaluate the vector form and copy the result into `rets`.
    ///
    /// Returns the number of entries written: the shorter of the returned
    /// sequence and `rets`.
    pub fn try_eval_vector(
        &self,
        point: &[f64],
        rets: &mut [f64],
        t: f64,
    ) -> Result<usize, CallbackError> {
        let values = self.value.call(self.clip(point), t)?.into_sequence()?;
        Ok(copy_into(&values, rets))
    }

    pub fn try_eval_gradient(
        &self,
        point: &[f64],
        rets: &mut [f64],
        t: f64,
    ) -> Result<usize, CallbackError> {
        let grad = self.grad.as_ref().ok_or(CallbackError::NoGradient)?;
        let values = grad.call(self.clip(point), t)?.into_sequence()?;
        Ok(copy_into(&values, rets))
    }
}

fn copy_into(values: &[f64], rets: &mut [f64]) -> usize {
    let n = values.len().min(rets.len());
    rets[..n].copy_from_slice(&values[..n]);
    n
}

impl Functor for CallbackFunctor {
    fn eval(&self, point: &[f64], t: f64) -> f64 {
        self.try_eval(point, t).unwrap_or_else(|e| {
            tracing::warn!(callable = %self.value.describe(), error = %e, "scalar callback failed, returning 0");
            0.0
        })
    }

    fn eval_vector(&self, point: &[f64], rets: &mut [f64], t: f64) {
        if let Err(e) = self.try_eval_vector(point, rets, t) {
            tracing::warn!(callable = %self.value.describe(), error = %e, "vector callback failed, output untouched");
        }
    }

    fn eval_gradient(&self, point: &[f64], rets: &mut [f64], t: f64) {
        if let Err(e) = self.try_eval_gradient(point, rets, t) {
            tracing::warn!(callable = %self.value.describe(), error = %e, "gradient callback failed, output untouched");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
