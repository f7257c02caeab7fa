//! Error types shared across the crate.

use thiserror::Error;

/// Failure of a single callback invocation.
///
/// The [`Functor`](crate::functor::Functor) entry points swallow these (zero
/// for scalars, untouched buffer for vectors); the `try_*` methods on
/// [`CallbackFunctor`](crate::callback::CallbackFunctor) return them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallbackError {
    /// The callable raised (Python exception, Lua error, closure failure).
    #[error("callback raised: {0}")]
    Raised(String),

    /// The callable returned something that is neither a number nor a
    /// sequence of numbers, or the wrong one of the two.
    #[error("callback returned an incompatible value: expected {expected}, got {got}")]
    IncompatibleType { expected: &'static str, got: String },

    /// The point is shorter than the number of symbols the callable binds.
    #[error("point has {got} coordinates but symbol '{symbol}' needs index {index}")]
    MissingCoordinate {
        symbol: String,
        index: usize,
        got: usize,
    },

    /// A gradient was requested from a functor with no gradient attached.
    #[error("no gradient callable attached")]
    NoGradient,
}

/// Errors from parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("parse error in '{src}': {message}")]
    Parse { src: String, message: String },

    #[error("evaluation error: {0}")]
    Eval(String),
}

/// Errors from building or attaching manufactured solutions.
#[derive(Debug, Error)]
pub enum FammsError {
    #[error("solution is {got} but {expected} was expected")]
    Shape { expected: &'static str, got: &'static str },

    #[error("no time symbol declared; the equation needs one")]
    NoTimeSymbol,

    #[error("could not attach functors to the simulator using '{v_name}' and '{b_name}': {source}")]
    Attach {
        v_name: String,
        b_name: String,
        #[source]
        source: SimulatorError,
    },

    #[error("could not attach extra callback '{name}': {source}")]
    AttachExtra {
        name: String,
        #[source]
        source: SimulatorError,
    },

    #[error("expected {expected} {what}, got {got}")]
    Count {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("dimension {nsd} exceeds the {max} declared space symbols")]
    Dimension { nsd: usize, max: usize },

    #[error("the problem must at least specify the {0}")]
    Missing(&'static str),

    #[error("unknown equation '{0}'")]
    UnknownEquation(String),

    #[error(transparent)]
    Expr(#[from] ExprError),
}

/// Rejection from a [`Simulator`](crate::famms::Simulator) slot.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulatorError {
    #[error("simulator has no callback slot named '{0}'")]
    UnknownSlot(String),
}
