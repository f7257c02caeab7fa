//! Symbolic expression language for manufactured solutions.
//!
//! Expressions are parsed once, differentiated symbolically to build source
//! terms and gradients, and evaluated pointwise by the callbacks handed to a
//! simulator.
//!
//! # Quick start
//!
//! ```rust
//! use famms::script::{laplace, Expr};
//!
//! let u = Expr::parse("x_0^2 + x_1^2").unwrap();
//! let symbols = vec!["x_0".to_string(), "x_1".to_string()];
//! assert_eq!(laplace(&u, &symbols), Expr::Num(4.0));
//! ```

pub mod diff;
pub mod expr;

// Re-exports for convenience.
pub use diff::{divergence, grad, laplace};
pub use expr::{Bindings, EvalContext, Expr, Func};
