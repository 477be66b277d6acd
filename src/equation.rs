//! Compiles a radius expression over `theta` and `phi` into a reusable function.
//!
//! Expressions are parsed by `meval` into an RPN token list and evaluated
//! against [`AngleContext`], which is the whole world an expression can see:
//! the two angles, three constants and a fixed table of math functions.
//! Nothing else resolves, so an expression cannot reach ambient state.
//!
//! meval has no infix comparison operators; comparisons and logic are exposed
//! as functions returning `1.0` / `0.0` (`lt(theta, 1)`, `if(c, a, b)`).

use std::f64::consts::{E, PI, TAU};
use std::fmt;

use meval::{ContextProvider, Expr, FuncEvalError};
use thiserror::Error;

use crate::geom::RadialField;

/// Names bound to the polar angle and the azimuth.
pub const VARIABLES: [&str; 2] = ["theta", "phi"];

const CONSTANTS: &[(&str, f64)] = &[("pi", PI), ("tau", TAU), ("e", E)];

/// Reasons an expression is rejected before any vertex is touched.
#[derive(Debug, Error, PartialEq)]
pub enum CompileError {
    #[error("equation is empty")]
    Empty,
    #[error("equation could not be parsed: {0}")]
    Syntax(String),
    #[error("unknown variable `{name}`{}", suggestion_hint(.suggestion))]
    UnknownVariable {
        name: String,
        suggestion: Option<&'static str>,
    },
    #[error("unknown function `{name}`{}", suggestion_hint(.suggestion))]
    UnknownFunction {
        name: String,
        suggestion: Option<&'static str>,
    },
    #[error("function `{name}` called with the wrong number of arguments: {reason}")]
    Arity { name: String, reason: String },
}

fn suggestion_hint(suggestion: &Option<&'static str>) -> String {
    suggestion.map_or_else(
        || format!(" (expressions may only use {} and {})", VARIABLES[0], VARIABLES[1]),
        |name| format!(" (did you mean `{name}`?)"),
    )
}

impl CompileError {
    fn from_probe(error: meval::Error) -> Self {
        match error {
            meval::Error::UnknownVariable(name) => {
                let suggestion = closest(&name, variable_names());
                Self::UnknownVariable { name, suggestion }
            }
            meval::Error::Function(name, FuncEvalError::UnknownFunction) => {
                let suggestion = closest(&name, BUILTINS.iter().map(|b| b.name));
                Self::UnknownFunction { name, suggestion }
            }
            meval::Error::Function(name, reason) => Self::Arity {
                name,
                reason: reason.to_string(),
            },
            other => Self::Syntax(other.to_string()),
        }
    }
}

/// A compiled radius expression `r(theta, phi)`.
///
/// Compiled once per run and shared read-only by every job; evaluation is
/// pure and thread-safe.
pub struct RadiusFunction {
    source: String,
    expr: Expr,
}

impl fmt::Debug for RadiusFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RadiusFunction")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl RadiusFunction {
    /// Parses `source` and resolves every identifier and call in it.
    ///
    /// # Errors
    /// Returns a [`CompileError`] for empty text, syntax errors, identifiers
    /// other than the bound angles and constants, functions outside the
    /// allow-list, and calls with the wrong number of arguments.
    pub fn compile(source: &str) -> Result<Self, CompileError> {
        let normalized = normalize_expression(source);
        if normalized.is_empty() {
            return Err(CompileError::Empty);
        }

        let expr: Expr = normalized
            .parse()
            .map_err(|error: meval::Error| CompileError::Syntax(error.to_string()))?;

        // RPN evaluation visits every token, so a single probe resolves every
        // variable and function call in the expression.
        expr.eval_with_context(AngleContext::new(0.0, 0.0))
            .map_err(CompileError::from_probe)?;

        log::debug!("compiled radius function `{normalized}`");
        Ok(Self {
            source: normalized,
            expr,
        })
    }

    /// The normalized expression text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluates `r(theta, phi)`.
    ///
    /// May return NaN or ±Inf for inputs outside the expression's numeric
    /// domain (e.g. `sqrt(-1)`); callers decide how to treat that.
    #[must_use]
    pub fn eval(&self, theta: f64, phi: f64) -> f64 {
        // Compilation rejected every structural error already.
        self.expr
            .eval_with_context(AngleContext::new(theta, phi))
            .unwrap_or(f64::NAN)
    }
}

impl RadialField for RadiusFunction {
    fn radius(&self, theta: f64, phi: f64) -> f64 {
        self.eval(theta, phi)
    }
}

fn normalize_expression(source: &str) -> String {
    let mut normalized = source.trim().to_owned();
    while normalized.ends_with(';') {
        normalized.pop();
        normalized = normalized.trim_end().to_owned();
    }
    normalized
}

fn variable_names() -> impl Iterator<Item = &'static str> {
    VARIABLES
        .into_iter()
        .chain(CONSTANTS.iter().map(|(name, _)| *name))
}

fn closest(name: &str, candidates: impl Iterator<Item = &'static str>) -> Option<&'static str> {
    const MAX_DISTANCE: usize = 2;
    let lowered = name.to_lowercase();
    candidates
        .map(|candidate| (levenshtein::levenshtein(&lowered, candidate), candidate))
        .filter(|(distance, _)| *distance <= MAX_DISTANCE && *distance < lowered.len())
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate)
}

// ─────────────────────────────────────────────────────────────────────────────
// Evaluation context
// ─────────────────────────────────────────────────────────────────────────────

/// The names visible to an expression.
#[derive(Debug, Clone, Copy)]
struct AngleContext {
    theta: f64,
    phi: f64,
}

impl AngleContext {
    const fn new(theta: f64, phi: f64) -> Self {
        Self { theta, phi }
    }
}

impl ContextProvider for AngleContext {
    fn get_var(&self, name: &str) -> Option<f64> {
        match name {
            "theta" => Some(self.theta),
            "phi" => Some(self.phi),
            _ => CONSTANTS
                .iter()
                .find(|(constant, _)| *constant == name)
                .map(|(_, value)| *value),
        }
    }

    fn eval_func(&self, name: &str, args: &[f64]) -> Result<f64, FuncEvalError> {
        let builtin = BUILTINS
            .iter()
            .find(|builtin| builtin.name == name)
            .ok_or(FuncEvalError::UnknownFunction)?;
        builtin.call(args)
    }
}

#[derive(Clone, Copy)]
enum Kernel {
    Unary(fn(f64) -> f64),
    Binary(fn(f64, f64) -> f64),
    Ternary(fn(f64, f64, f64) -> f64),
    Variadic(fn(&[f64]) -> f64),
}

#[derive(Clone, Copy)]
struct Builtin {
    name: &'static str,
    min_args: usize,
    max_args: usize,
    kernel: Kernel,
}

impl Builtin {
    const fn unary(name: &'static str, f: fn(f64) -> f64) -> Self {
        Self {
            name,
            min_args: 1,
            max_args: 1,
            kernel: Kernel::Unary(f),
        }
    }

    const fn binary(name: &'static str, f: fn(f64, f64) -> f64) -> Self {
        Self {
            name,
            min_args: 2,
            max_args: 2,
            kernel: Kernel::Binary(f),
        }
    }

    const fn ternary(name: &'static str, f: fn(f64, f64, f64) -> f64) -> Self {
        Self {
            name,
            min_args: 3,
            max_args: 3,
            kernel: Kernel::Ternary(f),
        }
    }

    const fn variadic(
        name: &'static str,
        min_args: usize,
        max_args: usize,
        f: fn(&[f64]) -> f64,
    ) -> Self {
        Self {
            name,
            min_args,
            max_args,
            kernel: Kernel::Variadic(f),
        }
    }

    fn call(&self, args: &[f64]) -> Result<f64, FuncEvalError> {
        let count = args.len();
        if self.min_args == self.max_args && count != self.min_args {
            return Err(FuncEvalError::NumberArgs(self.min_args));
        }
        if count < self.min_args {
            return Err(FuncEvalError::TooFewArguments);
        }
        if count > self.max_args {
            return Err(FuncEvalError::TooManyArguments);
        }

        Ok(match self.kernel {
            Kernel::Unary(f) => f(args[0]),
            Kernel::Binary(f) => f(args[0], args[1]),
            Kernel::Ternary(f) => f(args[0], args[1], args[2]),
            Kernel::Variadic(f) => f(args),
        })
    }
}

const BUILTINS: &[Builtin] = &[
    Builtin::unary("sqrt", f64::sqrt),
    Builtin::unary("cbrt", f64::cbrt),
    Builtin::unary("exp", f64::exp),
    Builtin::unary("ln", f64::ln),
    Builtin::unary("log", f64::ln),
    Builtin::unary("log2", f64::log2),
    Builtin::unary("log10", f64::log10),
    Builtin::unary("abs", f64::abs),
    Builtin::unary("sign", f64::signum),
    Builtin::unary("floor", f64::floor),
    Builtin::unary("ceil", f64::ceil),
    Builtin::unary("round", f64::round),
    Builtin::unary("frac", f64::fract),
    Builtin::unary("sin", f64::sin),
    Builtin::unary("cos", f64::cos),
    Builtin::unary("tan", f64::tan),
    Builtin::unary("asin", f64::asin),
    Builtin::unary("acos", f64::acos),
    Builtin::unary("atan", f64::atan),
    Builtin::unary("sinh", f64::sinh),
    Builtin::unary("cosh", f64::cosh),
    Builtin::unary("tanh", f64::tanh),
    Builtin::unary("sec", |value| 1.0 / value.cos()),
    Builtin::unary("csc", |value| 1.0 / value.sin()),
    Builtin::unary("cot", |value| 1.0 / value.tan()),
    Builtin::unary("deg", f64::to_degrees),
    Builtin::unary("rad", f64::to_radians),
    Builtin::unary("not", |value| bool_to_f64(!to_boolean(value))),
    Builtin::binary("atan2", f64::atan2),
    Builtin::binary("pow", f64::powf),
    Builtin::binary("hypot", f64::hypot),
    Builtin::binary("mod", modulo),
    Builtin::binary("lt", |a, b| bool_to_f64(a < b)),
    Builtin::binary("le", |a, b| bool_to_f64(a <= b)),
    Builtin::binary("gt", |a, b| bool_to_f64(a > b)),
    Builtin::binary("ge", |a, b| bool_to_f64(a >= b)),
    Builtin::binary("eq", |a, b| bool_to_f64(a == b)),
    Builtin::binary("ne", |a, b| bool_to_f64(a != b)),
    Builtin::binary("and", |a, b| bool_to_f64(to_boolean(a) && to_boolean(b))),
    Builtin::binary("or", |a, b| bool_to_f64(to_boolean(a) || to_boolean(b))),
    Builtin::ternary("clamp", clamp),
    Builtin::ternary("lerp", |a, b, t| a + (b - a) * t),
    Builtin::variadic("min", 1, usize::MAX, |args| {
        args.iter().copied().fold(f64::INFINITY, f64::min)
    }),
    Builtin::variadic("max", 1, usize::MAX, |args| {
        args.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }),
    Builtin::variadic("if", 2, 3, conditional),
];

fn to_boolean(value: f64) -> bool {
    value != 0.0
}

fn bool_to_f64(state: bool) -> f64 {
    if state { 1.0 } else { 0.0 }
}

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    let lower = min.min(max);
    let upper = min.max(max);
    value.max(lower).min(upper)
}

fn modulo(dividend: f64, divisor: f64) -> f64 {
    if divisor == 0.0 {
        return f64::NAN;
    }
    let remainder = dividend % divisor;
    if remainder == 0.0 {
        0.0
    } else if (divisor > 0.0 && remainder < 0.0) || (divisor < 0.0 && remainder > 0.0) {
        remainder + divisor
    } else {
        remainder
    }
}

fn conditional(args: &[f64]) -> f64 {
    let truthy = args[1];
    let falsy = args.get(2).copied().unwrap_or(0.0);
    if to_boolean(args[0]) { truthy } else { falsy }
}
