//! Problem file parser.
//!
//! A problem file is a line-oriented list of directives:
//!
//! | Directive | Action |
//! |-----------|--------|
//! | `/set <name>=<value>` or `/set <name> <value>` | set a variable |
//! | `/solution <expr>` | add a solution component |
//! | `/equation <name> [args…]` | select the equation |
//! | `/extra <name> <expr>` | extra callback inserted as `set_<name>` |
//! | Lines starting with `;` | comment, ignored |
//! | Any other `/command` | silently skipped |
//!
//! One `/solution` line gives a scalar solution, several give a vector.
//! Recognised variables are listed in [`crate::var::names`].

use std::path::Path;

use thiserror::Error;

use crate::equation::{self, Equation};
use crate::error::FammsError;
use crate::famms::{Famms, Simulator, DEFAULT_TIME};
use crate::script::Expr;
use crate::solution::Solution;
use crate::var::{names, VarStore};

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a problem file.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {message}")]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

/// A parsed problem file.
#[derive(Debug, Default, Clone)]
pub struct Problem {
    pub vars: VarStore,
    pub solution: Vec<Expr>,
    pub equation: Option<(String, Vec<f64>)>,
    pub extra: Vec<(String, Expr)>,
}

impl Problem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a problem file string.
    ///
    /// Returns the problem and a list of any errors on recognised lines;
    /// lines with errors are skipped.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut problem = Problem::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let Some(rest) = line.strip_prefix('/') else { continue };

            let (cmd, args_str) = rest
                .split_once(|c: char| c.is_ascii_whitespace())
                .unwrap_or((rest, ""));
            let args_str = args_str.trim();

            let result = match cmd {
                "set" => parse_set(&split_args(args_str), &mut problem.vars),
                "solution" => parse_component(args_str).map(|e| problem.solution.push(e)),
                "equation" => parse_equation(&split_args(args_str)).map(|eq| problem.equation = Some(eq)),
                "extra" => parse_extra(args_str).map(|x| problem.extra.push(x)),
                _ => Ok(()),
            };
            if let Err(message) = result {
                errors.push(ConfigError {
                    line: lineno,
                    message,
                });
            }
        }

        (problem, errors)
    }

    /// Read and parse a problem file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }

    /// `/set nsd`, else one more than the highest `x_<i>` used, at least 1.
    pub fn nsd(&self) -> usize {
        if let Some(n) = self.vars.get_usize(names::NSD) {
            return n;
        }
        self.solution
            .iter()
            .chain(self.extra.iter().map(|(_, e)| e))
            .flat_map(Expr::symbols)
            .filter_map(|s| s.strip_prefix("x_")?.parse::<usize>().ok())
            .map(|i| i + 1)
            .max()
            .unwrap_or(1)
    }

    /// `/set time` as a flag or a symbol name; otherwise `t` when the
    /// solution uses it.
    pub fn time_symbol(&self) -> Option<String> {
        if let Some(on) = self.vars.get_flag(names::TIME) {
            return on.then(|| DEFAULT_TIME.to_owned());
        }
        if let Some(name) = self.vars.get(names::TIME) {
            return Some(name.trim().to_owned());
        }
        self.solution
            .iter()
            .any(|e| e.depends_on(DEFAULT_TIME))
            .then(|| DEFAULT_TIME.to_owned())
    }

    pub fn to_solution(&self) -> Result<Solution, FammsError> {
        match self.solution.as_slice() {
            [] => Err(FammsError::Missing("solution")),
            [u] => Ok(Solution::scalar(u.clone())),
            many => Ok(Solution::vector(many.to_vec())),
        }
    }

    pub fn to_equation(&self) -> Result<Equation, FammsError> {
        let (name, args) = self
            .equation
            .as_ref()
            .ok_or(FammsError::Missing("equation"))?;
        equation::by_name(name, args)
    }

    /// A [`Famms`] configured from the variables and extra callbacks.
    pub fn to_famms(&self) -> Famms {
        let mut famms = Famms::new(self.nsd());
        if let Some(t) = self.time_symbol() {
            famms = famms.with_time_symbol(&t);
        }
        let (v, b) = famms.callback_names();
        let v = self.vars.get(names::V_FUNC).unwrap_or(v).to_owned();
        let b = self.vars.get(names::B_FUNC).unwrap_or(b).to_owned();
        famms.set_callback_names(&v, &b);
        for (name, e) in &self.extra {
            famms = famms.with_extra_callback(name, Solution::scalar(e.clone()));
        }
        famms
    }

    /// Build the front-end and assign the problem to `sim`.
    pub fn assign(&self, sim: &mut dyn Simulator) -> Result<Famms, FammsError> {
        let equation = self.to_equation()?;
        let solution = self.to_solution()?;
        let mut famms = self.to_famms();
        famms.assign(&equation, solution, Some(sim), None)?;
        Ok(famms)
    }
}

// ── Argument tokenizer ────────────────────────────────────────────────────────

/// Split `s` into whitespace-delimited tokens, honouring double-quoted strings
/// and `\"` escapes within them.
pub fn split_args(s: &str) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    cur.push(escaped);
                }
            }
            c if c.is_ascii_whitespace() && !in_quotes => {
                if !cur.is_empty() {
                    args.push(std::mem::take(&mut cur));
                }
            }
            c => cur.push(c),
        }
    }
    if !cur.is_empty() {
        args.push(cur);
    }
    args
}

// ── Directives ────────────────────────────────────────────────────────────────

/// `/set <name>=<value>` or `/set <name> <value>`.
fn parse_set(tokens: &[String], vars: &mut VarStore) -> Result<(), String> {
    if tokens.is_empty() {
        return Err("/set: requires an argument".into());
    }

    let (name, value) = if let Some((name, value)) = tokens[0].split_once('=') {
        (name.to_owned(), value.to_owned())
    } else if tokens.len() >= 2 {
        (tokens[0].clone(), tokens[1..].join(" "))
    } else {
        return Err(format!("/set: missing value for '{}'", tokens[0]));
    };

    if name.is_empty() {
        return Err("/set: variable name cannot be empty".into());
    }

    vars.set(name, value);
    Ok(())
}

/// `/solution <expr>`; the expression is the rest of the line.
fn parse_component(src: &str) -> Result<Expr, String> {
    if src.is_empty() {
        return Err("/solution: requires an expression".into());
    }
    Expr::parse(src).map_err(|e| format!("/solution: {e}"))
}

/// `/equation <name> [args…]`
fn parse_equation(tokens: &[String]) -> Result<(String, Vec<f64>), String> {
    let Some((name, rest)) = tokens.split_first() else {
        return Err(format!(
            "/equation: requires a name ({})",
            equation::NAMES.join(", ")
        ));
    };
    // Resolve now so an unknown name is reported against its line.
    equation::by_name(name, &[]).map_err(|e| format!("/equation: {e}"))?;
    let args = rest
        .iter()
        .map(|a| {
            a.parse::<f64>()
                .map_err(|_| format!("/equation: '{a}' is not a number"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((name.clone(), args))
}

/// `/extra <name> <expr>`
fn parse_extra(args: &str) -> Result<(String, Expr), String> {
    let Some((name, src)) = args.split_once(|c: char| c.is_ascii_whitespace()) else {
        return Err("/extra: requires a name and an expression".into());
    };
    let e = Expr::parse(src.trim()).map_err(|e| format!("/extra: {e}"))?;
    Ok((name.to_owned(), e))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
