//! Formula engine - parse and evaluate designer-authored expressions
//!
//! Formulas are compiled into a small syntax tree once and evaluated against
//! an explicit [`FormulaContext`]; nothing outside the context is reachable.
//!
//! Two entry points mirror how the rest of the engine uses formulas:
//! - [`check_formula`] is the static gate a formula must pass before it is
//!   accepted into a rule set. It reports *why* a formula is rejected.
//! - [`evaluate`] never fails: any syntax or evaluation problem yields `0.0`,
//!   which callers treat as the "formula failed" sentinel.

mod ast;
mod context;
mod eval;
mod lexer;

pub use ast::{BinaryOp, Expr, Func, UnaryOp};
pub use context::{ContextRules, FormulaContext};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Static validation failure
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("formula is empty")]
    Empty,
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    #[error("formula ends with a binary operator")]
    TrailingOperator,
    #[error("unexpected character '{ch}' at {pos}")]
    UnexpectedChar { pos: usize, ch: char },
    #[error("unexpected '{found}' at {pos}")]
    UnexpectedToken { pos: usize, found: String },
    #[error("unexpected end of formula")]
    UnexpectedEnd,
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("function '{name}' takes at least {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),
}

/// Failure of an accepted formula against one specific context
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),
    #[error("formula produced a non-finite value")]
    NonFinite,
}

/// A compiled formula
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    source: String,
    expr: Expr,
}

impl Formula {
    /// Validate and compile a formula string
    pub fn compile(source: &str) -> Result<Formula, FormulaError> {
        if source.trim().is_empty() {
            return Err(FormulaError::Empty);
        }

        let tokens = lexer::tokenize(source)?;

        let mut depth: i32 = 0;
        for (token, _) in &tokens {
            match token {
                lexer::Token::LParen => depth += 1,
                lexer::Token::RParen => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(FormulaError::UnbalancedParens);
                    }
                }
                _ => {}
            }
        }
        if depth != 0 {
            return Err(FormulaError::UnbalancedParens);
        }

        if tokens.last().map_or(false, |(t, _)| t.is_binary_operator()) {
            return Err(FormulaError::TrailingOperator);
        }

        let expr = ast::parse(&tokens)?;
        Ok(Formula {
            source: source.to_string(),
            expr,
        })
    }

    /// A formula that always yields `value`
    pub fn constant(value: f64) -> Formula {
        Formula {
            source: value.to_string(),
            expr: Expr::Num(value),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Identifiers the formula reads
    pub fn identifiers(&self) -> Vec<&str> {
        self.expr.identifiers()
    }

    /// Evaluate, reporting why a value could not be produced
    pub fn eval(&self, ctx: &FormulaContext) -> Result<f64, EvalError> {
        let value = self.expr.eval(ctx)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvalError::NonFinite)
        }
    }

    /// Evaluate, degrading any failure to `0.0`
    pub fn eval_or_zero(&self, ctx: &FormulaContext) -> f64 {
        self.eval(ctx).unwrap_or(0.0)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Formula {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Formula::compile(s)
    }
}

impl Serialize for Formula {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.source.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Formula {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Formula::compile(&source).map_err(serde::de::Error::custom)
    }
}

/// Static validation of a formula string
pub fn check_formula(source: &str) -> Result<(), FormulaError> {
    Formula::compile(source).map(|_| ())
}

/// Evaluate a formula string against a context; any failure yields `0.0`
pub fn evaluate(source: &str, ctx: &FormulaContext) -> f64 {
    match Formula::compile(source) {
        Ok(formula) => formula.eval_or_zero(ctx),
        Err(_) => 0.0,
    }
}
