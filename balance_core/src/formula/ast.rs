//! Formula syntax tree and recursive-descent parser
//!
//! Precedence, lowest first:
//! `?:` (right associative), `||`, `&&`, `== !=`, `< <= > >=`, `+ -`,
//! `* / %`, unary `- + !`, then literals, identifiers, calls and groups.

use super::lexer::{Spanned, Token};
use super::FormulaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

/// Builtin pure functions available to formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Min,
    Max,
    Abs,
    Floor,
    Ceil,
    Round,
    Sqrt,
    Pow,
    Clamp,
}

impl Func {
    /// Look up a builtin by name; a `Math.` prefix is accepted
    pub fn lookup(name: &str) -> Option<Func> {
        let bare = name.strip_prefix("Math.").unwrap_or(name);
        match bare {
            "min" => Some(Func::Min),
            "max" => Some(Func::Max),
            "abs" => Some(Func::Abs),
            "floor" => Some(Func::Floor),
            "ceil" => Some(Func::Ceil),
            "round" => Some(Func::Round),
            "sqrt" => Some(Func::Sqrt),
            "pow" => Some(Func::Pow),
            "clamp" => Some(Func::Clamp),
            _ => None,
        }
    }

    /// Accepted argument count range (inclusive)
    fn arity(self) -> (usize, usize) {
        match self {
            Func::Min | Func::Max => (1, usize::MAX),
            Func::Abs | Func::Floor | Func::Ceil | Func::Round | Func::Sqrt => (1, 1),
            Func::Pow => (2, 2),
            Func::Clamp => (3, 3),
        }
    }

    pub fn call(self, args: &[f64]) -> f64 {
        match self {
            Func::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            Func::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Func::Abs => args[0].abs(),
            Func::Floor => args[0].floor(),
            Func::Ceil => args[0].ceil(),
            Func::Round => args[0].round(),
            Func::Sqrt => args[0].sqrt(),
            Func::Pow => args[0].powf(args[1]),
            Func::Clamp => {
                let (value, lo, hi) = (args[0], args[1], args[2]);
                if lo > hi {
                    f64::NAN
                } else {
                    value.max(lo).min(hi)
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    Var(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
    Call(Func, Vec<Expr>),
}

impl Expr {
    /// Every identifier referenced by the expression, in first-use order
    pub fn identifiers(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Num(_) => {}
            Expr::Var(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Expr::Unary(_, inner) => inner.collect_identifiers(out),
            Expr::Binary(_, lhs, rhs) => {
                lhs.collect_identifiers(out);
                rhs.collect_identifiers(out);
            }
            Expr::Ternary(cond, then, otherwise) => {
                cond.collect_identifiers(out);
                then.collect_identifiers(out);
                otherwise.collect_identifiers(out);
            }
            Expr::Call(_, args) => {
                for arg in args {
                    arg.collect_identifiers(out);
                }
            }
        }
    }
}

/// Parse a token stream into a single expression
pub fn parse(tokens: &[Spanned]) -> Result<Expr, FormulaError> {
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.ternary()?;
    match parser.tokens.get(parser.pos) {
        None => Ok(expr),
        Some((token, at)) => Err(FormulaError::UnexpectedToken {
            pos: *at,
            found: token.describe(),
        }),
    }
}

struct Parser<'a> {
    tokens: &'a [Spanned],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn advance(&mut self) -> Option<&'a Spanned> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), FormulaError> {
        match self.advance() {
            Some((token, _)) if *token == expected => Ok(()),
            Some((token, at)) => Err(FormulaError::UnexpectedToken {
                pos: *at,
                found: token.describe(),
            }),
            None => Err(FormulaError::UnexpectedEnd),
        }
    }

    fn ternary(&mut self) -> Result<Expr, FormulaError> {
        let cond = self.or()?;
        if !self.eat(&Token::Question) {
            return Ok(cond);
        }
        let then = self.ternary()?;
        self.expect(Token::Colon)?;
        let otherwise = self.ternary()?;
        Ok(Expr::Ternary(Box::new(cond), Box::new(then), Box::new(otherwise)))
    }

    fn or(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.and()?;
        while self.eat(&Token::OrOr) {
            let rhs = self.and()?;
            lhs = Expr::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.equality()?;
        while self.eat(&Token::AndAnd) {
            let rhs = self.equality()?;
            lhs = Expr::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn equality(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.relational()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::Ne,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.relational()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn relational(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn additive(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, FormulaError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr, FormulaError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.unary()?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            Some(Token::Bang) => {
                self.pos += 1;
                Ok(Expr::Unary(UnaryOp::Not, Box::new(self.unary()?)))
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Expr, FormulaError> {
        let (token, at) = self.advance().ok_or(FormulaError::UnexpectedEnd)?;
        match token {
            Token::Number(value) => Ok(Expr::Num(*value)),
            Token::Ident(name) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    self.call(name)
                } else {
                    Ok(Expr::Var(name.clone()))
                }
            }
            Token::LParen => {
                let inner = self.ternary()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            other => Err(FormulaError::UnexpectedToken {
                pos: *at,
                found: other.describe(),
            }),
        }
    }

    /// Parse call arguments; the opening paren is already consumed
    fn call(&mut self, name: &str) -> Result<Expr, FormulaError> {
        let func = Func::lookup(name).ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

        let mut args = Vec::new();
        if !self.eat(&Token::RParen) {
            loop {
                args.push(self.ternary()?);
                if self.eat(&Token::Comma) {
                    continue;
                }
                self.expect(Token::RParen)?;
                break;
            }
        }

        let (min, max) = func.arity();
        if args.len() < min || args.len() > max {
            return Err(FormulaError::Arity {
                name: name.to_string(),
                expected: min,
                found: args.len(),
            });
        }
        Ok(Expr::Call(func, args))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::lexer::tokenize;

    fn parse_str(source: &str) -> Result<Expr, FormulaError> {
        parse(&tokenize(source)?)
    }

    #[test]
    fn test_precedence() {
        let expr = parse_str("1 + 2 * 3").unwrap();
        assert_eq!(
            expr,
            Expr::Binary(
                BinaryOp::Add,
                Box::new(Expr::Num(1.0)),
                Box::new(Expr::Binary(
                    BinaryOp::Mul,
                    Box::new(Expr::Num(2.0)),
                    Box::new(Expr::Num(3.0))
                ))
            )
        );
    }

    #[test]
    fn test_ternary_is_right_associative() {
        let expr = parse_str("a ? 1 : b ? 2 : 3").unwrap();
        match expr {
            Expr::Ternary(_, _, otherwise) => assert!(matches!(*otherwise, Expr::Ternary(..))),
            other => panic!("expected ternary, got {:?}", other),
        }
    }

    #[test]
    fn test_call_arity() {
        assert!(parse_str("max(a, b, 3)").is_ok());
        assert!(parse_str("Math.floor(atk / 2)").is_ok());
        assert!(matches!(parse_str("pow(2)"), Err(FormulaError::Arity { .. })));
        assert!(matches!(parse_str("sin(2)"), Err(FormulaError::UnknownFunction(_))));
    }

    #[test]
    fn test_identifiers_collected_once() {
        let expr = parse_str("a.atk * 2 - b.def + a.atk").unwrap();
        assert_eq!(expr.identifiers(), vec!["a.atk", "b.def"]);
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        assert!(matches!(
            parse_str("atk def"),
            Err(FormulaError::UnexpectedToken { .. })
        ));
    }
}
