//! Fully automatic method of manufactured solutions.
//!
//! A simulator evaluates coefficient and source functions pointwise through
//! the [`Functor`] interface.  [`CallbackFunctor`] adapts any [`Callable`]
//! (a closure, a symbolic expression, or a Python/Lua function behind the
//! `python` / `lua` features) to that interface, and [`Famms`] derives the
//! source term and gradient of a manufactured [`Solution`] and inserts them
//! into a [`Simulator`].
//!
//! ```rust
//! use famms::{equation, CallbackTable, Famms, Functor, Solution};
//!
//! let mut sim = CallbackTable::new();
//! let mut famms = Famms::new(2);
//! let u = Solution::parse_scalar("x_0^2 + x_1^2").unwrap();
//! famms.assign(&equation::poisson(), u, Some(&mut sim), None).unwrap();
//!
//! let b = sim.get("set_b_func").unwrap();
//! assert_eq!(b.eval(&[1.0, 2.0], 0.0), -4.0);
//! ```

pub mod callback;
pub mod cli;
pub mod config;
pub mod equation;
pub mod error;
pub mod famms;
pub mod functor;
pub mod harness;
pub mod logging;
pub mod lua;
pub mod python;
pub mod script;
pub mod solution;
pub mod system;
pub mod var;

pub use callback::{Callable, CallbackFunctor, ExprCallable, FnCallable, Returned};
pub use equation::Equation;
pub use error::{CallbackError, ExprError, FammsError, SimulatorError};
pub use famms::{CallbackTable, Famms, Simulator};
pub use functor::{BaseFunctor, Functor};
pub use solution::Solution;
pub use system::{Dimensions, SystemFamms};
