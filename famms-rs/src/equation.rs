//! Differential operators applied to manufactured solutions.
//!
//! An [`Equation`] maps the list of coupled solutions to the operator
//! `F(u_1, …, u_n)`; the source term handed to a simulator is that result.

use crate::error::FammsError;
use crate::solution::Solution;

/// `F(u_1, …, u_n)`.
pub type Equation = Box<dyn Fn(&[Solution]) -> Result<Solution, FammsError>>;

fn first(sols: &[Solution]) -> Result<&Solution, FammsError> {
    sols.first().ok_or(FammsError::Count {
        what: "solutions",
        expected: 1,
        got: 0,
    })
}

/// `F(u) = u`
pub fn identity() -> Equation {
    Box::new(|sols| first(sols).cloned())
}

/// `F(u) = -Δu`
pub fn poisson() -> Equation {
    Box::new(|sols| Ok(first(sols)?.laplace().neg()))
}

/// `F(u) = u_t - Δu`
pub fn heat() -> Equation {
    Box::new(|sols| {
        let u = first(sols)?;
        u.dt()?.sub(&u.laplace())
    })
}

/// `F(u) = -Δu - k²u`
pub fn helmholtz(k: f64) -> Equation {
    Box::new(move |sols| {
        let u = first(sols)?;
        u.laplace().neg().sub(&u.scale(k * k))
    })
}

/// Names accepted by [`by_name`].
pub const NAMES: &[&str] = &["identity", "poisson", "heat", "helmholtz"];

/// Resolve a preset by name, as written in a problem file.
///
/// `helmholtz` takes the wave number as its single argument (default 1).
pub fn by_name(name: &str, args: &[f64]) -> Result<Equation, FammsError> {
    let eq = match name.to_ascii_lowercase().as_str() {
        "identity" => identity(),
        "poisson" | "laplace" => poisson(),
        "heat" | "diffusion" => heat(),
        "helmholtz" => helmholtz(args.first().copied().unwrap_or(1.0)),
        _ => return Err(FammsError::UnknownEquation(name.to_owned())),
    };
    Ok(eq)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
