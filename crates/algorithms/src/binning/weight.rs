//! Per-point weights
//!
//! A weight is the amount a point adds to its cell's `weightSum`. Without
//! configuration every point weighs 1.0, so sums equal counts. A configured
//! weight is a small arithmetic expression over the point's attributes:
//!
//! - `population`
//! - `pop * 0.5 + 1`
//! - `("floor area" - 10) / 2`
//!
//! A missing or non-numeric field, or a division by zero, makes that one
//! point weigh 0.0; it never fails the batch.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tessera_core::{Error, PointFeature, Result};

/// Computes a point's contribution to its cell
pub trait WeightEvaluator {
    fn evaluate(&self, feature: &PointFeature) -> f64;
}

/// Every point weighs 1.0
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitWeight;

impl WeightEvaluator for UnitWeight {
    fn evaluate(&self, _feature: &PointFeature) -> f64 {
        1.0
    }
}

impl<F> WeightEvaluator for F
where
    F: Fn(&PointFeature) -> f64,
{
    fn evaluate(&self, feature: &PointFeature) -> f64 {
        let w = self(feature);
        if w.is_finite() {
            w
        } else {
            0.0
        }
    }
}

/// Arithmetic operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl ArithOp {
    fn symbol(&self) -> char {
        match self {
            ArithOp::Add => '+',
            ArithOp::Subtract => '-',
            ArithOp::Multiply => '*',
            ArithOp::Divide => '/',
        }
    }

    fn apply(&self, l: f64, r: f64) -> Option<f64> {
        let v = match self {
            ArithOp::Add => l + r,
            ArithOp::Subtract => l - r,
            ArithOp::Multiply => l * r,
            ArithOp::Divide => {
                if r == 0.0 {
                    return None;
                }
                l / r
            }
        };
        v.is_finite().then_some(v)
    }
}

/// Weight expression: constant, field reference, or arithmetic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WeightExpr {
    Constant(f64),
    Field(String),
    Neg(Box<WeightExpr>),
    Binary {
        op: ArithOp,
        left: Box<WeightExpr>,
        right: Box<WeightExpr>,
    },
}

impl WeightExpr {
    pub fn field(name: impl Into<String>) -> Self {
        WeightExpr::Field(name.into())
    }

    pub fn binary(op: ArithOp, left: WeightExpr, right: WeightExpr) -> Self {
        WeightExpr::Binary { op, left: Box::new(left), right: Box::new(right) }
    }

    /// Parse a formula.
    ///
    /// Supports `+ - * /`, unary minus, parentheses, numeric literals,
    /// bare identifiers and double-quoted field names.
    pub fn parse(formula: &str) -> Result<Self> {
        let tokens = tokenize(formula)?;
        if tokens.is_empty() {
            return Err(Error::Expression("empty formula".into()));
        }
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_expr()?;
        if let Some(t) = parser.peek() {
            return Err(Error::Expression(format!("unexpected trailing token {:?}", t)));
        }
        Ok(expr)
    }

    /// Evaluate, or `None` if a field is missing/non-numeric or the
    /// arithmetic is undefined
    pub fn try_eval(&self, feature: &PointFeature) -> Option<f64> {
        match self {
            WeightExpr::Constant(v) => Some(*v),
            WeightExpr::Field(name) => feature.get_property(name)?.as_f64(),
            WeightExpr::Neg(inner) => inner.try_eval(feature).map(|v| -v),
            WeightExpr::Binary { op, left, right } => {
                op.apply(left.try_eval(feature)?, right.try_eval(feature)?)
            }
        }
    }

    /// Field names referenced by the expression, in first-use order
    pub fn fields(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_fields(&mut names);
        names
    }

    fn collect_fields<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            WeightExpr::Field(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name.as_str());
                }
            }
            WeightExpr::Neg(inner) => inner.collect_fields(names),
            WeightExpr::Binary { left, right, .. } => {
                left.collect_fields(names);
                right.collect_fields(names);
            }
            WeightExpr::Constant(_) => {}
        }
    }
}

impl WeightEvaluator for WeightExpr {
    fn evaluate(&self, feature: &PointFeature) -> f64 {
        self.try_eval(feature).unwrap_or(0.0)
    }
}

impl FromStr for WeightExpr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        WeightExpr::parse(s)
    }
}

impl fmt::Display for WeightExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightExpr::Constant(v) => write!(f, "{}", v),
            WeightExpr::Field(name) => {
                let bare = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                    && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
                if bare {
                    f.write_str(name)
                } else {
                    write!(f, "\"{}\"", name)
                }
            }
            WeightExpr::Neg(inner) => write!(f, "-({})", inner),
            WeightExpr::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
        }
    }
}

/// Configured weighting for a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Weight {
    #[default]
    Unit,
    Expr(WeightExpr),
}

impl Weight {
    /// `None` or a blank formula means unit weights
    pub fn from_formula(formula: Option<&str>) -> Result<Self> {
        match formula.map(str::trim) {
            None | Some("") => Ok(Weight::Unit),
            Some(f) => WeightExpr::parse(f).map(Weight::Expr),
        }
    }
}

impl WeightEvaluator for Weight {
    fn evaluate(&self, feature: &PointFeature) -> f64 {
        match self {
            Weight::Unit => 1.0,
            Weight::Expr(e) => e.evaluate(feature),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Op(ArithOp),
    LParen,
    RParen,
}

fn tokenize(formula: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = formula.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            c if c.is_whitespace() => i += 1,
            '+' => {
                tokens.push(Token::Op(ArithOp::Add));
                i += 1;
            }
            '-' => {
                tokens.push(Token::Op(ArithOp::Subtract));
                i += 1;
            }
            '*' => {
                tokens.push(Token::Op(ArithOp::Multiply));
                i += 1;
            }
            '/' => {
                tokens.push(Token::Op(ArithOp::Divide));
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '"' => {
                let start = i + 1;
                let end = chars[start..]
                    .iter()
                    .position(|&c| c == '"')
                    .map(|p| start + p)
                    .ok_or_else(|| Error::Expression("unterminated quoted field name".into()))?;
                let name: String = chars[start..end].iter().collect();
                if name.is_empty() {
                    return Err(Error::Expression("empty quoted field name".into()));
                }
                tokens.push(Token::Ident(name));
                i = end + 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let num_str: String = chars[start..i].iter().collect();
                let num = num_str
                    .parse::<f64>()
                    .map_err(|_| Error::Expression(format!("invalid number: {}", num_str)))?;
                tokens.push(Token::Number(num));
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            c => {
                return Err(Error::Expression(format!("unexpected character '{}'", c)));
            }
        }
    }

    Ok(tokens)
}

/// Recursive descent parser
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    /// expr = term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<WeightExpr> {
        let mut left = self.parse_term()?;
        while let Some(Token::Op(op @ (ArithOp::Add | ArithOp::Subtract))) = self.peek() {
            let op = *op;
            self.advance();
            let right = self.parse_term()?;
            left = WeightExpr::binary(op, left, right);
        }
        Ok(left)
    }

    /// term = factor (('*' | '/') factor)*
    fn parse_term(&mut self) -> Result<WeightExpr> {
        let mut left = self.parse_factor()?;
        while let Some(Token::Op(op @ (ArithOp::Multiply | ArithOp::Divide))) = self.peek() {
            let op = *op;
            self.advance();
            let right = self.parse_factor()?;
            left = WeightExpr::binary(op, left, right);
        }
        Ok(left)
    }

    /// factor = number | field | '(' expr ')' | ('-' | '+') factor
    fn parse_factor(&mut self) -> Result<WeightExpr> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(WeightExpr::Constant(n)),
            Some(Token::Ident(name)) => Ok(WeightExpr::Field(name)),
            Some(Token::LParen) => {
                let expr = self.parse_expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(expr),
                    _ => Err(Error::Expression("expected closing parenthesis".into())),
                }
            }
            Some(Token::Op(ArithOp::Subtract)) => {
                Ok(WeightExpr::Neg(Box::new(self.parse_factor()?)))
            }
            Some(Token::Op(ArithOp::Add)) => self.parse_factor(),
            other => Err(Error::Expression(format!("unexpected token {:?}", other))),
        }
    }
}
