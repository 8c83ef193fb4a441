//! Tree-walking evaluator

use super::ast::{BinaryOp, Expr, UnaryOp};
use super::context::FormulaContext;
use super::EvalError;

fn truthy(value: f64) -> bool {
    value != 0.0 && !value.is_nan()
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

impl Expr {
    /// Evaluate against `ctx`. Only the branch a ternary or `&&`/`||` selects
    /// is evaluated, so an unknown identifier in an untaken branch is not an error.
    pub fn eval(&self, ctx: &FormulaContext) -> Result<f64, EvalError> {
        match self {
            Expr::Num(value) => Ok(*value),
            Expr::Var(name) => ctx
                .get(name)
                .ok_or_else(|| EvalError::UnknownIdentifier(name.clone())),
            Expr::Unary(op, inner) => {
                let value = inner.eval(ctx)?;
                Ok(match op {
                    UnaryOp::Neg => -value,
                    UnaryOp::Not => flag(!truthy(value)),
                })
            }
            Expr::Binary(BinaryOp::And, lhs, rhs) => {
                let left = lhs.eval(ctx)?;
                if !truthy(left) {
                    return Ok(0.0);
                }
                Ok(flag(truthy(rhs.eval(ctx)?)))
            }
            Expr::Binary(BinaryOp::Or, lhs, rhs) => {
                let left = lhs.eval(ctx)?;
                if truthy(left) {
                    return Ok(1.0);
                }
                Ok(flag(truthy(rhs.eval(ctx)?)))
            }
            Expr::Binary(op, lhs, rhs) => {
                let a = lhs.eval(ctx)?;
                let b = rhs.eval(ctx)?;
                Ok(match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Rem => a % b,
                    BinaryOp::Lt => flag(a < b),
                    BinaryOp::Le => flag(a <= b),
                    BinaryOp::Gt => flag(a > b),
                    BinaryOp::Ge => flag(a >= b),
                    BinaryOp::Eq => flag(a == b),
                    BinaryOp::Ne => flag(a != b),
                    BinaryOp::And => flag(truthy(a) && truthy(b)),
                    BinaryOp::Or => flag(truthy(a) || truthy(b)),
                })
            }
            Expr::Ternary(cond, then, otherwise) => {
                if truthy(cond.eval(ctx)?) {
                    then.eval(ctx)
                } else {
                    otherwise.eval(ctx)
                }
            }
            Expr::Call(func, args) => {
                let values = args
                    .iter()
                    .map(|arg| arg.eval(ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(func.call(&values))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Formula;

    fn run(source: &str, ctx: &FormulaContext) -> Result<f64, EvalError> {
        Formula::compile(source).unwrap().eval(ctx)
    }

    #[test]
    fn test_ternary_selects_branch() {
        let ctx = FormulaContext::new().with("lvl", 12.0);
        assert!((run("lvl >= 10 ? 2 : 1", &ctx).unwrap() - 2.0).abs() < f64::EPSILON);
        assert!((run("lvl < 10 ? 2 : 1", &ctx).unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_untaken_branch_not_evaluated() {
        let ctx = FormulaContext::new().with("x", 1.0);
        assert!((run("x > 0 ? x : missing", &ctx).unwrap() - 1.0).abs() < f64::EPSILON);
        assert!((run("x || missing", &ctx).unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_identifier() {
        let err = run("atk + nope", &FormulaContext::new().with("atk", 1.0)).unwrap_err();
        assert_eq!(err, EvalError::UnknownIdentifier("nope".into()));
    }

    #[test]
    fn test_functions() {
        let ctx = FormulaContext::new().with("atk", 7.0);
        assert!((run("max(atk, 10)", &ctx).unwrap() - 10.0).abs() < f64::EPSILON);
        assert!((run("clamp(atk, 0, 5)", &ctx).unwrap() - 5.0).abs() < f64::EPSILON);
        assert!((run("pow(2, 3) + floor(atk / 2)", &ctx).unwrap() - 11.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_logic_yields_flags() {
        let ctx = FormulaContext::new().with("a", 3.0).with("b", 0.0);
        assert!((run("a > 1 && !b", &ctx).unwrap() - 1.0).abs() < f64::EPSILON);
        assert!((run("a == 3", &ctx).unwrap() - 1.0).abs() < f64::EPSILON);
        assert!((run("-a % 2", &ctx).unwrap() + 1.0).abs() < f64::EPSILON);
    }
}
