//! Symbolic differentiation and light algebraic simplification.
//!
//! The smart constructors (`add`, `mul`, …) fold constants and drop
//! additive/multiplicative identities as they build, so derivatives stay
//! readable without a separate rewriting pass.

use super::expr::{BinOp, Expr, Func};

// ── Smart constructors ────────────────────────────────────────────────────────

fn num(e: &Expr) -> Option<f64> {
    match e {
        Expr::Num(x) => Some(*x),
        _ => None,
    }
}

pub fn add(a: Expr, b: Expr) -> Expr {
    match (num(&a), num(&b)) {
        (Some(x), Some(y)) => Expr::Num(x + y),
        (Some(x), _) if x == 0.0 => b,
        (_, Some(y)) if y == 0.0 => a,
        _ => match b {
            Expr::Neg(inner) => Expr::Binary(BinOp::Sub, Box::new(a), inner),
            b => Expr::Binary(BinOp::Add, Box::new(a), Box::new(b)),
        },
    }
}

pub fn sub(a: Expr, b: Expr) -> Expr {
    match (num(&a), num(&b)) {
        (Some(x), Some(y)) => Expr::Num(x - y),
        (Some(x), _) if x == 0.0 => neg(b),
        (_, Some(y)) if y == 0.0 => a,
        _ => match b {
            Expr::Neg(inner) => Expr::Binary(BinOp::Add, Box::new(a), inner),
            b => Expr::Binary(BinOp::Sub, Box::new(a), Box::new(b)),
        },
    }
}

pub fn mul(a: Expr, b: Expr) -> Expr {
    match (num(&a), num(&b)) {
        (Some(x), Some(y)) => Expr::Num(x * y),
        (Some(x), _) | (_, Some(x)) if x == 0.0 => Expr::Num(0.0),
        (Some(x), _) if x == 1.0 => b,
        (_, Some(y)) if y == 1.0 => a,
        (Some(x), _) if x == -1.0 => neg(b),
        (_, Some(y)) if y == -1.0 => neg(a),
        // Keep numeric factors on the left.
        (None, Some(_)) => Expr::Binary(BinOp::Mul, Box::new(b), Box::new(a)),
        _ => Expr::Binary(BinOp::Mul, Box::new(a), Box::new(b)),
    }
}

pub fn div(a: Expr, b: Expr) -> Expr {
    match (num(&a), num(&b)) {
        (Some(x), Some(y)) if y != 0.0 => Expr::Num(x / y),
        (Some(x), _) if x == 0.0 => Expr::Num(0.0),
        (_, Some(y)) if y == 1.0 => a,
        _ => Expr::Binary(BinOp::Div, Box::new(a), Box::new(b)),
    }
}

pub fn pow(a: Expr, b: Expr) -> Expr {
    match (num(&a), num(&b)) {
        (Some(x), Some(y)) => Expr::Num(x.powf(y)),
        (_, Some(y)) if y == 0.0 => Expr::Num(1.0),
        (_, Some(y)) if y == 1.0 => a,
        _ => Expr::Binary(BinOp::Pow, Box::new(a), Box::new(b)),
    }
}

pub fn neg(a: Expr) -> Expr {
    match a {
        Expr::Num(x) => Expr::Num(-x),
        Expr::Neg(inner) => *inner,
        a => Expr::Neg(Box::new(a)),
    }
}

pub fn call(f: Func, a: Expr) -> Expr {
    match num(&a) {
        Some(x) => Expr::Num(f.apply(x)),
        None => Expr::Call(f, Box::new(a)),
    }
}

fn binary(op: BinOp, a: Expr, b: Expr) -> Expr {
    match op {
        BinOp::Add => add(a, b),
        BinOp::Sub => sub(a, b),
        BinOp::Mul => mul(a, b),
        BinOp::Div => div(a, b),
        BinOp::Pow => pow(a, b),
    }
}

// ── Simplify / differentiate ──────────────────────────────────────────────────

impl Expr {
    /// Rebuild bottom-up through the smart constructors.
    pub fn simplify(&self) -> Expr {
        match self {
            Expr::Num(_) | Expr::Var(_) => self.clone(),
            Expr::Neg(a) => neg(a.simplify()),
            Expr::Binary(op, a, b) => binary(*op, a.simplify(), b.simplify()),
            Expr::Call(f, a) => call(*f, a.simplify()),
        }
    }

    /// Partial derivative with respect to the symbol `var`.
    pub fn diff(&self, var: &str) -> Expr {
        match self {
            Expr::Num(_) => Expr::Num(0.0),
            Expr::Var(v) => Expr::Num(if v == var { 1.0 } else { 0.0 }),
            Expr::Neg(a) => neg(a.diff(var)),
            Expr::Binary(op, a, b) => {
                let (a, b) = (a.as_ref(), b.as_ref());
                match op {
                    BinOp::Add => add(a.diff(var), b.diff(var)),
                    BinOp::Sub => sub(a.diff(var), b.diff(var)),
                    BinOp::Mul => add(
                        mul(a.diff(var), b.simplify()),
                        mul(a.simplify(), b.diff(var)),
                    ),
                    BinOp::Div => div(
                        sub(
                            mul(a.diff(var), b.simplify()),
                            mul(a.simplify(), b.diff(var)),
                        ),
                        pow(b.simplify(), Expr::Num(2.0)),
                    ),
                    BinOp::Pow if !b.depends_on(var) => {
                        // d(a^n) = n a^(n-1) a'
                        let n = b.simplify();
                        mul(
                            mul(n.clone(), pow(a.simplify(), sub(n, Expr::Num(1.0)))),
                            a.diff(var),
                        )
                    }
                    BinOp::Pow => {
                        // d(a^b) = a^b (b' ln a + b a'/a)
                        let (a_s, b_s) = (a.simplify(), b.simplify());
                        mul(
                            pow(a_s.clone(), b_s.clone()),
                            add(
                                mul(b.diff(var), call(Func::Log, a_s.clone())),
                                div(mul(b_s, a.diff(var)), a_s),
                            ),
                        )
                    }
                }
            }
            Expr::Call(f, a) => {
                let inner = a.simplify();
                let outer = match f {
                    Func::Sin => call(Func::Cos, inner),
                    Func::Cos => neg(call(Func::Sin, inner)),
                    Func::Tan => div(
                        Expr::Num(1.0),
                        pow(call(Func::Cos, inner), Expr::Num(2.0)),
                    ),
                    Func::Exp => call(Func::Exp, inner),
                    Func::Log => div(Expr::Num(1.0), inner),
                    Func::Sqrt => div(Expr::Num(1.0), mul(Expr::Num(2.0), call(Func::Sqrt, inner))),
                    Func::Sinh => call(Func::Cosh, inner),
                    Func::Cosh => call(Func::Sinh, inner),
                    Func::Tanh => div(
                        Expr::Num(1.0),
                        pow(call(Func::Cosh, inner), Expr::Num(2.0)),
                    ),
                };
                mul(outer, a.diff(var))
            }
        }
    }
}

// ── Differential operators ────────────────────────────────────────────────────

/// Gradient of `e` with respect to `symbols`.
pub fn grad(e: &Expr, symbols: &[String]) -> Vec<Expr> {
    symbols.iter().map(|s| e.diff(s)).collect()
}

/// Divergence of the vector field `components` (component `i` is
/// differentiated with respect to `symbols[i]`).
pub fn divergence(components: &[Expr], symbols: &[String]) -> Expr {
    components
        .iter()
        .zip(symbols)
        .fold(Expr::Num(0.0), |acc, (c, s)| add(acc, c.diff(s)))
}

/// Laplacian of `e` with respect to `symbols`.
pub fn laplace(e: &Expr, symbols: &[String]) -> Expr {
    symbols
        .iter()
        .fold(Expr::Num(0.0), |acc, s| add(acc, e.diff(s).diff(s)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
