//! The point-evaluation contract.
//!
//! A [`Functor`] is the object a legacy simulator is handed when it needs an
//! analytical solution or a source term: it is asked for a value at a point
//! (and a time), either as a scalar or as a vector written into a caller
//! owned buffer.
//!
//! Every method has a default body.  The defaults describe `f(x) = |x|²`,
//! so [`BaseFunctor`] (which overrides nothing) is a usable smoke-test
//! function:
//!
//! ```rust
//! use famms::functor::{BaseFunctor, Functor};
//!
//! let f = BaseFunctor;
//! assert_eq!(f.eval(&[1.0, 2.0], 0.0), 5.0);
//!
//! let mut rets = [0.0; 2];
//! f.eval_vector(&[1.0, 2.0], &mut rets, 0.0);
//! assert_eq!(rets, [1.0, 4.0]);
//! ```

/// A function evaluated pointwise in space and (optionally) time.
///
/// The number of space dimensions is the length of `point`.  Implementations
/// that ignore time simply ignore `t`.
pub trait Functor {
    /// Scalar value at `point` and time `t`.
    fn eval(&self, point: &[f64], _t: f64) -> f64 {
        point.iter().map(|x| x * x).sum()
    }

    /// Vector value at `point` and time `t`, written into `rets`.
    ///
    /// At most `min(point.len(), rets.len())` entries are written.
    fn eval_vector(&self, point: &[f64], rets: &mut [f64], _t: f64) {
        for (r, x) in rets.iter_mut().zip(point) {
            *r = x * x;
        }
    }

    /// Spatial gradient at `point` and time `t`, written into `rets`.
    fn eval_gradient(&self, point: &[f64], rets: &mut [f64], _t: f64) {
        for (r, x) in rets.iter_mut().zip(point) {
            *r = 2.0 * x;
        }
    }
}

/// The functor that keeps every default: `|x|²`, `x²` elementwise, `2x`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseFunctor;

impl Functor for BaseFunctor {}

impl<F: Functor + ?Sized> Functor for Box<F> {
    fn eval(&self, point: &[f64], t: f64) -> f64 {
        (**self).eval(point, t)
    }

    fn eval_vector(&self, point: &[f64], rets: &mut [f64], t: f64) {
        (**self).eval_vector(point, rets, t)
    }

    fn eval_gradient(&self, point: &[f64], rets: &mut [f64], t: f64) {
        (**self).eval_gradient(point, rets, t)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
