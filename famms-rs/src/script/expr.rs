//! Expression lexer, AST, parser, evaluator and printer.
//!
//! The language is ordinary real arithmetic over named symbols:
//!
//! ```text
//! sin(pi*x_0)*exp(-t) + x_1^2 / 2
//! ```
//!
//! Operator precedence (lowest → highest):
//!   additive  →  multiplicative  →  unary minus  →  power  →  primary
//!
//! `^` (also spelled `**`) is right associative and binds tighter than unary
//! minus, so `-x^2` is `-(x^2)` and `2^-1` is `0.5`.

use std::collections::HashMap;
use std::fmt;

use crate::error::ExprError;

// ── EvalContext ───────────────────────────────────────────────────────────────

/// Variable lookup used by the evaluator.
pub trait EvalContext {
    /// Value bound to `name`, if any.
    fn get_var(&self, name: &str) -> Option<f64>;
}

impl EvalContext for HashMap<String, f64> {
    fn get_var(&self, name: &str) -> Option<f64> {
        self.get(name).copied()
    }
}

impl<const N: usize> EvalContext for [(&str, f64); N] {
    fn get_var(&self, name: &str) -> Option<f64> {
        self.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
    }
}

/// Positional binding: `names[i]` is bound to `values[i]`.
#[derive(Debug, Clone, Copy)]
pub struct Bindings<'a> {
    pub names: &'a [String],
    pub values: &'a [f64],
}

impl EvalContext for Bindings<'_> {
    fn get_var(&self, name: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == name)?;
        self.values.get(i).copied()
    }
}

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    /// Unrecognised input byte, reported as a diagnostic rather than EOF.
    Unknown(char),
    Eof,
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer {
            src: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.src.get(self.pos + 1).copied()
    }

    fn eat(&mut self, ch: u8) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\r' | b'\n')) {
            self.pos += 1;
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
    }

    fn read_number(&mut self, start: usize) -> Token {
        self.take_while(|c| c.is_ascii_digit());
        if self.peek() == Some(b'.') {
            self.pos += 1;
            self.take_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let exp_digit = match self.peek2() {
                Some(b'+' | b'-') => self.src.get(self.pos + 2).is_some_and(u8::is_ascii_digit),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            // `2e` is the number `2` followed by the identifier `e`.
            if exp_digit {
                self.pos += 2;
                self.take_while(|c| c.is_ascii_digit());
            }
        }
        let text = String::from_utf8_lossy(&self.src[start..self.pos]);
        match text.parse() {
            Ok(x) => Token::Num(x),
            Err(_) => Token::Unknown('.'),
        }
    }

    fn read_ident(&mut self, start: usize) -> Token {
        self.take_while(|c| c.is_ascii_alphanumeric() || c == b'_');
        Token::Ident(String::from_utf8_lossy(&self.src[start..self.pos]).into_owned())
    }

    fn next_token(&mut self) -> Token {
        self.skip_ws();
        let start = self.pos;
        let Some(ch) = self.peek() else {
            return Token::Eof;
        };
        self.pos += 1;

        match ch {
            b'0'..=b'9' => self.read_number(start),
            b'.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.read_number(start),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.read_ident(start),
            b'+' => Token::Plus,
            b'-' => Token::Minus,
            b'*' => {
                if self.eat(b'*') {
                    Token::Caret
                } else {
                    Token::Star
                }
            }
            b'/' => Token::Slash,
            b'^' => Token::Caret,
            b'(' => Token::LParen,
            b')' => Token::RParen,
            c => Token::Unknown(c as char),
        }
    }

    fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let t = self.next_token();
            let done = matches!(t, Token::Eof);
            tokens.push(t);
            if done {
                break;
            }
        }
        tokens
    }
}

// ── AST ───────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinOp {
    fn apply(self, l: f64, r: f64) -> f64 {
        match self {
            BinOp::Add => l + r,
            BinOp::Sub => l - r,
            BinOp::Mul => l * r,
            BinOp::Div => l / r,
            BinOp::Pow => l.powf(r),
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Pow => "^",
        }
    }
}

/// Built-in single-argument functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Exp,
    Log,
    Sqrt,
    Sinh,
    Cosh,
    Tanh,
}

impl Func {
    pub fn from_name(name: &str) -> Option<Func> {
        Some(match name {
            "sin" => Func::Sin,
            "cos" => Func::Cos,
            "tan" => Func::Tan,
            "exp" => Func::Exp,
            "log" | "ln" => Func::Log,
            "sqrt" => Func::Sqrt,
            "sinh" => Func::Sinh,
            "cosh" => Func::Cosh,
            "tanh" => Func::Tanh,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Exp => "exp",
            Func::Log => "log",
            Func::Sqrt => "sqrt",
            Func::Sinh => "sinh",
            Func::Cosh => "cosh",
            Func::Tanh => "tanh",
        }
    }

    pub fn apply(self, x: f64) -> f64 {
        match self {
            Func::Sin => x.sin(),
            Func::Cos => x.cos(),
            Func::Tan => x.tan(),
            Func::Exp => x.exp(),
            Func::Log => x.ln(),
            Func::Sqrt => x.sqrt(),
            Func::Sinh => x.sinh(),
            Func::Cosh => x.cosh(),
            Func::Tanh => x.tanh(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Var(String),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(Func, Box<Expr>),
}

impl Expr {
    pub fn var(name: impl Into<String>) -> Expr {
        Expr::Var(name.into())
    }

    /// Parse `src` into an expression.
    pub fn parse(src: &str) -> Result<Expr, ExprError> {
        parse_expr(src).map_err(|message| ExprError::Parse {
            src: src.to_owned(),
            message,
        })
    }

    /// Evaluate against `ctx`.
    pub fn eval(&self, ctx: &dyn EvalContext) -> Result<f64, ExprError> {
        eval_expr(self, ctx).map_err(ExprError::Eval)
    }

    /// `true` if `name` occurs anywhere in the expression.
    pub fn depends_on(&self, name: &str) -> bool {
        match self {
            Expr::Num(_) => false,
            Expr::Var(v) => v == name,
            Expr::Neg(a) | Expr::Call(_, a) => a.depends_on(name),
            Expr::Binary(_, a, b) => a.depends_on(name) || b.depends_on(name),
        }
    }

    /// Names of all free symbols, in first-occurrence order.
    pub fn symbols(&self) -> Vec<String> {
        fn walk(e: &Expr, out: &mut Vec<String>) {
            match e {
                Expr::Num(_) => {}
                Expr::Var(v) => {
                    if !out.contains(v) {
                        out.push(v.clone());
                    }
                }
                Expr::Neg(a) | Expr::Call(_, a) => walk(a, out),
                Expr::Binary(_, a, b) => {
                    walk(a, out);
                    walk(b, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }

    /// Binding strength used by the printer.
    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary(BinOp::Add | BinOp::Sub, ..) => 1,
            Expr::Binary(BinOp::Mul | BinOp::Div, ..) => 2,
            Expr::Neg(_) => 3,
            Expr::Num(x) if *x < 0.0 => 3,
            Expr::Binary(BinOp::Pow, ..) => 4,
            Expr::Num(_) | Expr::Var(_) | Expr::Call(..) => 5,
        }
    }
}

// ── Parser ────────────────────────────────────────────────────────────────────

/// Deepest unary / parenthesis nesting the parser accepts.
const MAX_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        self.pos += 1;
        t
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // ── Grammar ───────────────────────────────────────────────────────────────

    fn parse_additive(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Sub,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, String> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinOp::Mul,
                Token::Slash => BinOp::Div,
                _ => break,
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    // Every recursive path of the grammar passes through here.
    fn parse_unary(&mut self) -> Result<Expr, String> {
        if self.depth >= MAX_DEPTH {
            return Err("expression nested too deeply".into());
        }
        self.depth += 1;
        let result = self.parse_unary_inner();
        self.depth -= 1;
        result
    }

    fn parse_unary_inner(&mut self) -> Result<Expr, String> {
        match self.peek() {
            Token::Minus => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.parse_unary()?)))
            }
            Token::Plus => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Expr, String> {
        let base = self.parse_primary()?;
        if self.eat(&Token::Caret) {
            // Right associative; the exponent may carry its own sign.
            let exp = self.parse_unary()?;
            Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exp)))
        } else {
            Ok(base)
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, String> {
        match self.advance() {
            Token::Num(x) => Ok(Expr::Num(x)),
            Token::Ident(name) => {
                if self.eat(&Token::LParen) {
                    let func = Func::from_name(&name)
                        .ok_or_else(|| format!("unknown function '{name}'"))?;
                    let arg = self.parse_additive()?;
                    if !self.eat(&Token::RParen) {
                        return Err(format!("expected ')' after argument to {name}"));
                    }
                    Ok(Expr::Call(func, Box::new(arg)))
                } else {
                    Ok(match name.as_str() {
                        "pi" => Expr::Num(std::f64::consts::PI),
                        "e" => Expr::Num(std::f64::consts::E),
                        _ => Expr::Var(name),
                    })
                }
            }
            Token::LParen => {
                let inner = self.parse_additive()?;
                if !self.eat(&Token::RParen) {
                    return Err("expected ')'".into());
                }
                Ok(inner)
            }
            Token::Unknown(c) => Err(format!("unexpected character '{c}'")),
            Token::Eof => Err("unexpected end of expression".into()),
            other => Err(format!("unexpected token {other:?}")),
        }
    }
}

/// Parse an expression string into an AST.
pub fn parse_expr(src: &str) -> Result<Expr, String> {
    let tokens = Lexer::new(src).tokenize();
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_additive()?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        other => Err(format!("trailing input at {other:?}")),
    }
}

// ── Evaluator ─────────────────────────────────────────────────────────────────

/// Evaluate an [`Expr`] AST node against the given context.
pub fn eval_expr(expr: &Expr, ctx: &dyn EvalContext) -> Result<f64, String> {
    match expr {
        Expr::Num(x) => Ok(*x),
        Expr::Var(name) => ctx
            .get_var(name)
            .ok_or_else(|| format!("undefined symbol '{name}'")),
        Expr::Neg(inner) => Ok(-eval_expr(inner, ctx)?),
        Expr::Binary(op, lhs, rhs) => {
            let l = eval_expr(lhs, ctx)?;
            let r = eval_expr(rhs, ctx)?;
            Ok(op.apply(l, r))
        }
        Expr::Call(func, arg) => Ok(func.apply(eval_expr(arg, ctx)?)),
    }
}

/// Parse and evaluate `src` in one step.
pub fn eval_str(src: &str, ctx: &dyn EvalContext) -> Result<f64, String> {
    eval_expr(&parse_expr(src)?, ctx)
}

// ── Printer ───────────────────────────────────────────────────────────────────

fn fmt_num(x: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        write!(f, "{}", x as i64)
    } else {
        // `{:?}` never drops precision and always re-parses.
        write!(f, "{x:?}")
    }
}

fn fmt_child(e: &Expr, min_prec: u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if e.precedence() < min_prec {
        write!(f, "({e})")
    } else {
        write!(f, "{e}")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(x) => fmt_num(*x, f),
            Expr::Var(name) => write!(f, "{name}"),
            Expr::Neg(inner) => {
                write!(f, "-")?;
                // `--x` would lex fine, but `-(-x)` reads better.
                fmt_child(inner, 4, f)
            }
            Expr::Call(func, arg) => write!(f, "{}({arg})", func.name()),
            Expr::Binary(op, lhs, rhs) => {
                let prec = self.precedence();
                let (lmin, rmin) = match op {
                    BinOp::Add | BinOp::Mul => (prec, prec),
                    BinOp::Sub | BinOp::Div => (prec, prec + 1),
                    BinOp::Pow => (prec + 1, prec),
                };
                fmt_child(lhs, lmin, f)?;
                if *op == BinOp::Pow {
                    write!(f, "^")?;
                } else {
                    write!(f, " {} ", op.symbol())?;
                }
                fmt_child(rhs, rmin, f)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str) -> f64 {
        let ctx = [("x", 3.0), ("y", -2.0), ("t", 0.5)];
        eval_str(src, &ctx).unwrap_or_else(|e| panic!("eval({src:?}): {e}"))
    }

    #[test]
    fn literals() {
        assert_eq!(eval("42"), 42.0);
        assert_eq!(eval("1.5"), 1.5);
        assert_eq!(eval(".25"), 0.25);
        assert_eq!(eval("1e3"), 1000.0);
        assert_eq!(eval("2.5E-1"), 0.25);
    }

    #[test]
    fn arithmetic() {
        assert_eq!(eval("1 + 2 * 3"), 7.0);
        assert_eq!(eval("(1 + 2) * 3"), 9.0);
        assert_eq!(eval("10 / 4"), 2.5);
        assert_eq!(eval("10 - 4 - 3"), 3.0);
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(eval("2^3^2"), 512.0);
        assert_eq!(eval("2**3"), 8.0);
    }

    #[test]
    fn unary_minus_binds_looser_than_power() {
        assert_eq!(eval("-x^2"), -9.0);
        assert_eq!(eval("(-x)^2"), 9.0);
        assert_eq!(eval("2^-1"), 0.5);
    }

    #[test]
    fn variables_and_constants() {
        assert_eq!(eval("x*y + t"), -5.5);
        assert!((eval("pi") - std::f64::consts::PI).abs() < 1e-15);
        assert!((eval("e") - std::f64::consts::E).abs() < 1e-15);
        // No implicit multiplication.
        assert!(parse_expr("2e").is_err());
    }

    #[test]
    fn functions() {
        assert!((eval("sin(pi/2)") - 1.0).abs() < 1e-15);
        assert_eq!(eval("exp(0)"), 1.0);
        assert_eq!(eval("sqrt(16)"), 4.0);
        assert_eq!(eval("ln(1)"), 0.0);
    }

    #[test]
    fn undefined_symbol_is_an_error() {
        let ctx: [(&str, f64); 0] = [];
        assert!(eval_str("z + 1", &ctx).is_err());
    }

    #[test]
    fn parse_errors() {
        assert!(parse_expr("").is_err());
        assert!(parse_expr("1 +").is_err());
        assert!(parse_expr("(1").is_err());
        assert!(parse_expr("foo(1)").is_err());
        assert!(parse_expr("1 2").is_err());
        assert!(parse_expr("x $ y").is_err());
    }

    #[test]
    fn deep_nesting_is_an_error() {
        let parens = format!("{}x{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(parse_expr(&parens), Err("expression nested too deeply".into()));
        assert!(parse_expr(&format!("{}x", "-".repeat(200_000))).is_err());
        assert!(parse_expr(&"2^".repeat(10_000)).is_err());
        let shallow = format!("{}x{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(parse_expr(&shallow), Ok(Expr::Var("x".into())));
    }

    #[test]
    fn positional_bindings() {
        let names = vec!["x_0".to_string(), "x_1".to_string()];
        let b = Bindings {
            names: &names,
            values: &[1.0, 2.0],
        };
        assert_eq!(eval_str("x_0 + 10*x_1", &b), Ok(21.0));
    }

    #[test]
    fn symbols_in_order() {
        let e = Expr::parse("x_1*t + sin(x_0) - x_1").unwrap();
        assert_eq!(e.symbols(), ["x_1", "t", "x_0"]);
        assert!(e.depends_on("t"));
        assert!(!e.depends_on("x_2"));
    }

    #[test]
    fn display_reparses_to_same_value() {
        for src in [
            "1 - (2 - 3)",
            "x / (y * t)",
            "-x^2",
            "(-x)^2",
            "2^3^2",
            "(2^3)^2",
            "-(x + y)",
            "sin(x)^2 + cos(x)^2",
            "x - -y",
            "0.1 * x",
        ] {
            let e = Expr::parse(src).unwrap();
            let printed = e.to_string();
            let again = Expr::parse(&printed)
                .unwrap_or_else(|err| panic!("{src:?} printed as {printed:?}: {err}"));
            let ctx = [("x", 3.0), ("y", -2.0), ("t", 0.5)];
            assert_eq!(e.eval(&ctx).unwrap(), again.eval(&ctx).unwrap(), "{src:?} -> {printed:?}");
        }
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(Expr::parse("x_0^2 + 2*t").unwrap().to_string(), "x_0^2 + 2 * t");
        assert_eq!(Expr::parse("(a+b)*c").unwrap().to_string(), "(a + b) * c");
    }
}
