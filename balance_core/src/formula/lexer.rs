//! Tokenizer for designer-authored formulas

use super::FormulaError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    Comma,
    Question,
    Colon,
    Bang,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
}

impl Token {
    /// Whether this token needs an operand on its right-hand side
    pub fn is_binary_operator(&self) -> bool {
        matches!(
            self,
            Token::Plus
                | Token::Minus
                | Token::Star
                | Token::Slash
                | Token::Percent
                | Token::Question
                | Token::Colon
                | Token::Lt
                | Token::Le
                | Token::Gt
                | Token::Ge
                | Token::EqEq
                | Token::NotEq
                | Token::AndAnd
                | Token::OrOr
        )
    }

    pub fn describe(&self) -> String {
        match self {
            Token::Number(n) => n.to_string(),
            Token::Ident(name) => name.clone(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Star => "*".into(),
            Token::Slash => "/".into(),
            Token::Percent => "%".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::Comma => ",".into(),
            Token::Question => "?".into(),
            Token::Colon => ":".into(),
            Token::Bang => "!".into(),
            Token::Lt => "<".into(),
            Token::Le => "<=".into(),
            Token::Gt => ">".into(),
            Token::Ge => ">=".into(),
            Token::EqEq => "==".into(),
            Token::NotEq => "!=".into(),
            Token::AndAnd => "&&".into(),
            Token::OrOr => "||".into(),
        }
    }
}

/// A token and the byte offset where it starts
pub type Spanned = (Token, usize);

/// Split a formula into tokens
///
/// Identifiers follow `[a-zA-Z_][a-zA-Z0-9_.]*`, so `a.atk` is one token.
/// `===` and `!==` are accepted as aliases of `==` and `!=`.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, FormulaError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        let start = i;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() || (c == '.' && peek_digit(bytes, i + 1)) {
            i = scan_number(bytes, i);
            let text = &source[start..i];
            let value = text
                .parse::<f64>()
                .map_err(|_| FormulaError::InvalidNumber(text.to_string()))?;
            tokens.push((Token::Number(value), start));
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            i += 1;
            while i < bytes.len() {
                let n = bytes[i] as char;
                if n.is_ascii_alphanumeric() || n == '_' || n == '.' {
                    i += 1;
                } else {
                    break;
                }
            }
            tokens.push((Token::Ident(source[start..i].to_string()), start));
            continue;
        }

        let next = bytes.get(i + 1).map(|b| *b as char);
        let (token, width) = match (c, next) {
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            (',', _) => (Token::Comma, 1),
            ('?', _) => (Token::Question, 1),
            (':', _) => (Token::Colon, 1),
            ('<', Some('=')) => (Token::Le, 2),
            ('<', _) => (Token::Lt, 1),
            ('>', Some('=')) => (Token::Ge, 2),
            ('>', _) => (Token::Gt, 1),
            ('=', Some('=')) => (Token::EqEq, equality_width(bytes, i)),
            ('!', Some('=')) => (Token::NotEq, equality_width(bytes, i)),
            ('!', _) => (Token::Bang, 1),
            ('&', Some('&')) => (Token::AndAnd, 2),
            ('|', Some('|')) => (Token::OrOr, 2),
            _ => {
                let ch = source[i..].chars().next().unwrap_or(c);
                return Err(FormulaError::UnexpectedChar { pos: i, ch });
            }
        };
        tokens.push((token, start));
        i += width;
    }

    Ok(tokens)
}

fn peek_digit(bytes: &[u8], i: usize) -> bool {
    bytes.get(i).map_or(false, |b| b.is_ascii_digit())
}

fn scan_number(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    // exponent only if followed by digits, so `2e` stays a syntax error downstream
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if peek_digit(bytes, j) {
            i = j;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
    }
    i
}

/// `==`/`!=` are two bytes wide, `===`/`!==` three
fn equality_width(bytes: &[u8], i: usize) -> usize {
    if bytes.get(i + 2) == Some(&b'=') {
        3
    } else {
        2
    }
}
