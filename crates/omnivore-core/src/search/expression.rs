//! Per-byte boolean expressions such as `(a & 7) > 3 and b == $ea`.
//!
//! `a` is the address of the byte and `b` its value. Precedence from
//! tightest to loosest: unary sign, `* / // %`, `+ -`, `& and`, then the
//! comparisons `< <= > >= == != <>`. Binary operators associate left.
//!
//! ## Learning: Recursive Descent
//!
//! Each precedence level is one function that parses the next tighter
//! level and then loops over its own operators. The result is an AST that
//! is evaluated once per byte.

use crate::{EditError, EditResult};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Num(i64),
    Var(char),
    Op(&'static str),
    LParen,
    RParen,
}

const OPERATORS: &[&str] = &[
    "//", "<=", ">=", "==", "!=", "<>", "+", "-", "*", "/", "%", "&", "<", ">",
];

fn invalid(msg: impl Into<String>) -> EditError {
    EditError::InvalidSearchQuery(msg.into())
}

fn parse_radix(digits: &str, radix: u32, text: &str) -> EditResult<i64> {
    i64::from_str_radix(digits, radix).map_err(|_| invalid(format!("Bad number '{text}'")))
}

fn tokenize(text: &str) -> EditResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = text.trim_start();
    while let Some(c) = rest.chars().next() {
        let len;
        if c == '(' || c == ')' {
            tokens.push(if c == '(' { Token::LParen } else { Token::RParen });
            len = 1;
        } else if c == '$' || rest.starts_with("0x") || rest.starts_with("0X") {
            let skip = if c == '$' { 1 } else { 2 };
            let digits = rest[skip..]
                .find(|ch: char| !ch.is_ascii_hexdigit())
                .unwrap_or(rest.len() - skip);
            len = skip + digits;
            tokens.push(Token::Num(parse_radix(&rest[skip..len], 16, &rest[..len])?));
        } else if c.is_ascii_digit() {
            len = rest.find(|ch: char| !ch.is_ascii_digit()).unwrap_or(rest.len());
            tokens.push(Token::Num(parse_radix(&rest[..len], 10, &rest[..len])?));
        } else if c.is_ascii_alphabetic() {
            len = rest
                .find(|ch: char| !ch.is_ascii_alphabetic())
                .unwrap_or(rest.len());
            match &rest[..len] {
                "and" => tokens.push(Token::Op("&")),
                "a" => tokens.push(Token::Var('a')),
                "b" => tokens.push(Token::Var('b')),
                other => return Err(invalid(format!("Unknown variable '{other}'"))),
            }
        } else if let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            tokens.push(Token::Op(*op));
            len = op.len();
        } else {
            return Err(invalid(format!("Unexpected character '{c}'")));
        }
        rest = rest[len..].trim_start();
    }
    Ok(tokens)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    Num(i64),
    Addr,
    Byte,
    Neg(Box<Expr>),
    Binary(&'static str, Box<Expr>, Box<Expr>),
}

impl Expr {
    fn eval(&self, addr: i64, byte: i64) -> i64 {
        match self {
            Expr::Num(n) => *n,
            Expr::Addr => addr,
            Expr::Byte => byte,
            Expr::Neg(inner) => inner.eval(addr, byte).wrapping_neg(),
            Expr::Binary(op, lhs, rhs) => {
                let (l, r) = (lhs.eval(addr, byte), rhs.eval(addr, byte));
                match *op {
                    "+" => l.wrapping_add(r),
                    "-" => l.wrapping_sub(r),
                    "*" => l.wrapping_mul(r),
                    "/" | "//" => l.checked_div_euclid(r).unwrap_or(0),
                    "%" => l.checked_rem_euclid(r).unwrap_or(0),
                    "&" => l & r,
                    "<" => (l < r) as i64,
                    "<=" => (l <= r) as i64,
                    ">" => (l > r) as i64,
                    ">=" => (l >= r) as i64,
                    "==" => (l == r) as i64,
                    _ => (l != r) as i64,
                }
            }
        }
    }
}

const MAX_NESTING: usize = 256;
const MAX_TOKENS: usize = 4096;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn nested(&mut self, next: fn(&mut Self) -> EditResult<Expr>) -> EditResult<Expr> {
        if self.depth >= MAX_NESTING {
            return Err(invalid("Expression nested too deeply"));
        }
        self.depth += 1;
        let result = next(self);
        self.depth -= 1;
        result
    }

    fn peek_op(&self, ops: &[&str]) -> Option<&'static str> {
        match self.tokens.get(self.pos) {
            Some(Token::Op(op)) if ops.contains(op) => Some(*op),
            _ => None,
        }
    }

    fn binary(&mut self, ops: &[&str], next: fn(&mut Self) -> EditResult<Expr>) -> EditResult<Expr> {
        let mut lhs = next(self)?;
        while let Some(op) = self.peek_op(ops) {
            self.pos += 1;
            let rhs = next(self)?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn comparison(&mut self) -> EditResult<Expr> {
        self.binary(&["<", "<=", ">", ">=", "==", "!=", "<>"], Self::and)
    }

    fn and(&mut self) -> EditResult<Expr> {
        self.binary(&["&"], Self::additive)
    }

    fn additive(&mut self) -> EditResult<Expr> {
        self.binary(&["+", "-"], Self::multiplicative)
    }

    fn multiplicative(&mut self) -> EditResult<Expr> {
        self.binary(&["*", "/", "//", "%"], Self::unary)
    }

    fn unary(&mut self) -> EditResult<Expr> {
        match self.peek_op(&["+", "-"]) {
            Some(op) => {
                self.pos += 1;
                let inner = self.nested(Self::unary)?;
                Ok(if op == "-" { Expr::Neg(Box::new(inner)) } else { inner })
            }
            None => self.primary(),
        }
    }

    fn primary(&mut self) -> EditResult<Expr> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        match token {
            Some(Token::Num(n)) => Ok(Expr::Num(n)),
            Some(Token::Var('a')) => Ok(Expr::Addr),
            Some(Token::Var(_)) => Ok(Expr::Byte),
            Some(Token::LParen) => {
                let inner = self.nested(Self::comparison)?;
                match self.tokens.get(self.pos) {
                    Some(Token::RParen) => {
                        self.pos += 1;
                        Ok(inner)
                    }
                    _ => Err(invalid("Missing ')'")),
                }
            }
            Some(other) => Err(invalid(format!("Unexpected {other:?}"))),
            None => Err(invalid("Unexpected end of expression")),
        }
    }
}

/// A parsed expression, evaluated per byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteExpression {
    root: Expr,
}

impl ByteExpression {
    pub fn parse(text: &str) -> EditResult<Self> {
        let tokens = tokenize(text)?;
        if tokens.is_empty() {
            return Err(invalid("Empty expression"));
        }
        if tokens.len() > MAX_TOKENS {
            return Err(invalid("Expression too long"));
        }
        let mut parser = Parser {
            tokens,
            pos: 0,
            depth: 0,
        };
        let root = parser.comparison()?;
        if parser.pos < parser.tokens.len() {
            return Err(invalid(format!(
                "Unexpected {:?}",
                parser.tokens[parser.pos]
            )));
        }
        Ok(Self { root })
    }

    /// Value of the expression for one byte.
    pub fn eval(&self, addr: usize, byte: u8) -> i64 {
        self.root.eval(addr as i64, byte as i64)
    }

    /// True when the expression is non-zero for this byte.
    pub fn matches(&self, addr: usize, byte: u8) -> bool {
        self.eval(addr, byte) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(text: &str, a: usize, b: u8) -> i64 {
        ByteExpression::parse(text).unwrap().eval(a, b)
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("1 + 2 * 3", 0, 0), 7);
        assert_eq!(eval("-2 * 3", 0, 0), -6);
        assert_eq!(eval("(1 + 2) * 3", 0, 0), 9);
        assert_eq!(eval("a & 7 > 3", 0x0c, 0), 1);
        assert_eq!(eval("1 + 6 and 3", 0, 0), 3);
    }

    #[test]
    fn test_literals_and_variables() {
        assert_eq!(eval("$ff", 0, 0), 255);
        assert_eq!(eval("0x10 + b", 0, 1), 17);
        assert_eq!(eval("a // 2", 9, 0), 4);
        assert_eq!(eval("a % 0", 9, 0), 0);
    }

    #[test]
    fn test_comparisons() {
        let expr = ByteExpression::parse("(a > 3) and (b <> 0)").unwrap();
        assert!(expr.matches(4, 1));
        assert!(!expr.matches(4, 0));
        assert!(!expr.matches(3, 1));
    }

    #[test]
    fn test_errors() {
        assert!(ByteExpression::parse("").is_err());
        assert!(ByteExpression::parse("(a > 3").is_err());
        assert!(ByteExpression::parse("c == 1").is_err());
        assert!(ByteExpression::parse("a >").is_err());
        assert!(ByteExpression::parse("a ? 1").is_err());
        assert!(ByteExpression::parse("1 2").is_err());
    }

    #[test]
    fn test_deep_input_is_rejected() {
        let signs = format!("{}1", "-".repeat(200_000));
        assert!(ByteExpression::parse(&signs).is_err());
        let parens = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert!(ByteExpression::parse(&parens).is_err());

        let nested = format!("{}1{}", "(".repeat(300), ")".repeat(300));
        let err = ByteExpression::parse(&nested).unwrap_err();
        assert_eq!(err.to_string(), "Expression nested too deeply");
        let err = ByteExpression::parse(&format!("{}1", "-".repeat(300))).unwrap_err();
        assert_eq!(err.to_string(), "Expression nested too deeply");

        let shallow = format!("{}b{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(eval(&shallow, 0, 9), 9);
        assert_eq!(eval("--5", 0, 0), 5);
    }
}
