//! Manufactured solutions: scalar or vector fields of symbolic expressions.

use crate::callback::ExprCallable;
use crate::error::{ExprError, FammsError};
use crate::script::diff;
use crate::script::{divergence, grad, laplace, Expr};

/// A scalar or vector field over the space symbols and an optional time
/// symbol.
///
/// The symbols are usually set by [`Famms::assign`](crate::famms::Famms::assign);
/// the differential operators act on whatever symbols are set at the time
/// of the call.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    components: Vec<Expr>,
    vector: bool,
    space: Vec<String>,
    time: Option<String>,
}

impl Solution {
    pub fn scalar(expr: Expr) -> Self {
        Solution {
            components: vec![expr],
            vector: false,
            space: Vec::new(),
            time: None,
        }
    }

    pub fn vector(components: Vec<Expr>) -> Self {
        Solution {
            components,
            vector: true,
            space: Vec::new(),
            time: None,
        }
    }

    pub fn parse_scalar(src: &str) -> Result<Self, ExprError> {
        Expr::parse(src).map(Self::scalar)
    }

    pub fn parse_vector(srcs: &[&str]) -> Result<Self, ExprError> {
        let components = srcs
            .iter()
            .map(|s| Expr::parse(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::vector(components))
    }

    /// Same symbols as `self`, different components.
    fn derive(&self, components: Vec<Expr>, vector: bool) -> Self {
        Solution {
            components,
            vector,
            space: self.space.clone(),
            time: self.time.clone(),
        }
    }

    pub fn is_scalar(&self) -> bool {
        !self.vector
    }

    fn shape(&self) -> &'static str {
        if self.vector {
            "a vector"
        } else {
            "a scalar"
        }
    }

    pub fn components(&self) -> &[Expr] {
        &self.components
    }

    pub fn as_scalar(&self) -> Result<&Expr, FammsError> {
        match (self.vector, self.components.first()) {
            (false, Some(e)) => Ok(e),
            _ => Err(FammsError::Shape {
                expected: "a scalar",
                got: self.shape(),
            }),
        }
    }

    pub fn space(&self) -> &[String] {
        &self.space
    }

    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }

    pub fn set_spatial_symbols(&mut self, space: &[String]) {
        self.space = space.to_vec();
    }

    pub fn set_time_symbol(&mut self, time: Option<&str>) {
        self.time = time.map(str::to_owned);
    }

    // ── Differential operators ────────────────────────────────────────────

    /// Gradient of a scalar field.
    pub fn grad(&self) -> Result<Solution, FammsError> {
        let u = self.as_scalar()?;
        Ok(self.derive(grad(u, &self.space), true))
    }

    /// Divergence of a vector field.
    pub fn div(&self) -> Result<Solution, FammsError> {
        if !self.vector {
            return Err(FammsError::Shape {
                expected: "a vector",
                got: self.shape(),
            });
        }
        Ok(self.derive(vec![divergence(&self.components, &self.space)], false))
    }

    /// Componentwise Laplacian.
    pub fn laplace(&self) -> Solution {
        let components = self
            .components
            .iter()
            .map(|c| laplace(c, &self.space))
            .collect();
        self.derive(components, self.vector)
    }

    /// Componentwise time derivative.
    pub fn dt(&self) -> Result<Solution, FammsError> {
        let t = self.time.as_deref().ok_or(FammsError::NoTimeSymbol)?;
        let components = self.components.iter().map(|c| c.diff(t)).collect();
        Ok(self.derive(components, self.vector))
    }

    // ── Arithmetic ────────────────────────────────────────────────────────

    pub fn neg(&self) -> Solution {
        let components = self.components.iter().cloned().map(diff::neg).collect();
        self.derive(components, self.vector)
    }

    pub fn scale(&self, k: f64) -> Solution {
        let components = self
            .components
            .iter()
            .map(|c| diff::mul(Expr::Num(k), c.clone()))
            .collect();
        self.derive(components, self.vector)
    }

    fn zip_with(
        &self,
        other: &Solution,
        op: fn(Expr, Expr) -> Expr,
    ) -> Result<Solution, FammsError> {
        if self.vector != other.vector {
            return Err(FammsError::Shape {
                expected: self.shape(),
                got: other.shape(),
            });
        }
        if self.components.len() != other.components.len() {
            return Err(FammsError::Count {
                what: "components",
                expected: self.components.len(),
                got: other.components.len(),
            });
        }
        let components = self
            .components
            .iter()
            .zip(&other.components)
            .map(|(a, b)| op(a.clone(), b.clone()))
            .collect();
        Ok(self.derive(components, self.vector))
    }

    pub fn add(&self, other: &Solution) -> Result<Solution, FammsError> {
        self.zip_with(other, diff::add)
    }

    pub fn sub(&self, other: &Solution) -> Result<Solution, FammsError> {
        self.zip_with(other, diff::sub)
    }

    pub fn simplify(&self) -> Solution {
        let components = self.components.iter().map(Expr::simplify).collect();
        self.derive(components, self.vector)
    }

    /// An evaluator over `space` and `time` for these components.
    pub fn callable(&self, space: &[String], time: Option<&str>) -> ExprCallable {
        if self.vector {
            ExprCallable::vector(self.components.clone(), space, time)
        } else {
            ExprCallable::scalar(self.components[0].clone(), space, time)
        }
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.vector {
            f.write_str("[")?;
            for (i, c) in self.components.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{c}")?;
            }
            f.write_str("]")
        } else {
            write!(f, "{}", self.components[0])
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn scalar(src: &str) -> Solution {
        let mut u = Solution::parse_scalar(src).unwrap();
        u.set_spatial_symbols(&symbols(&["x_0", "x_1"]));
        u.set_time_symbol(Some("t"));
        u
    }

    #[test]
    fn gradient_of_scalar() {
        let g = scalar("x_0^2 + 3*x_1").grad().unwrap();
        assert!(!g.is_scalar());
        assert_eq!(g.to_string(), "[2 * x_0, 3]");
    }

    #[test]
    fn gradient_of_vector_is_an_error() {
        let v = Solution::parse_vector(&["x_0", "x_1"]).unwrap();
        assert!(matches!(v.grad(), Err(FammsError::Shape { .. })));
    }

    #[test]
    fn divergence_of_gradient_is_laplacian() {
        let u = scalar("x_0^2*x_1 + x_1^3");
        let lhs = u.grad().unwrap().div().unwrap().simplify();
        let rhs = u.laplace().simplify();
        let ctx = [("x_0", 0.5), ("x_1", -2.0)];
        let l = lhs.as_scalar().unwrap().eval(&ctx).unwrap();
        let r = rhs.as_scalar().unwrap().eval(&ctx).unwrap();
        assert!((l - r).abs() < 1e-12);
    }

    #[test]
    fn time_derivative_needs_time_symbol() {
        let mut u = scalar("exp(-t)*x_0");
        assert_eq!(u.dt().unwrap().to_string(), "-exp(-t) * x_0");
        u.set_time_symbol(None);
        assert!(matches!(u.dt(), Err(FammsError::NoTimeSymbol)));
    }

    #[test]
    fn arithmetic_keeps_symbols() {
        let u = scalar("x_0");
        let w = u.add(&scalar("x_1")).unwrap().scale(2.0);
        assert_eq!(w.to_string(), "2 * (x_0 + x_1)");
        assert_eq!(w.space(), u.space());
        assert_eq!(w.time(), Some("t"));
        assert_eq!(u.sub(&u).unwrap().simplify().to_string(), "x_0 - x_0");
        assert_eq!(u.neg().to_string(), "-x_0");
    }

    #[test]
    fn mismatched_shapes_do_not_add() {
        let v = Solution::parse_vector(&["x_0", "x_1"]).unwrap();
        assert!(matches!(scalar("x_0").add(&v), Err(FammsError::Shape { .. })));
        let w = Solution::parse_vector(&["x_0"]).unwrap();
        assert!(matches!(v.add(&w), Err(FammsError::Count { .. })));
    }

    #[test]
    fn callable_binds_space_then_time() {
        use crate::callback::{Callable, Returned};
        let u = scalar("x_0 + 10*x_1 + 100*t");
        let c = u.callable(u.space(), u.time());
        assert_eq!(c.call(&[1.0, 2.0], 3.0), Ok(Returned::Scalar(321.0)));
    }
}
