//! Arithmetic over table columns for placeholder arguments.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := ('-' | '+') unary | power
//! power  := atom (('^' | '**') unary)?
//! atom   := number | '$' column | '(' expr ')'
//! ```
//!
//! A `$` reference runs until the next `+ * - / ^ =`. Trailing `)` and
//! blanks are given back to the lexer until the remaining text names a
//! column, so `($a+$b)` and `$flux)` both resolve.
//!
//! Result precision follows the operands. Integer columns stay integer
//! under `+ - *`. Single-precision columns stay single precision when the
//! other side is another single-precision column or a literal. Any other
//! mix is computed in double precision.

use super::TemplateError;
use crate::numfmt::{format_f32, format_f64, format_i64};
use crate::table::{ColumnData, Table};

/// Scalar result of an expression or aggregate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float32(f32),
    Float(f64),
}

impl Number {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Int(value) => value as f64,
            Self::Float32(value) => f64::from(value),
            Self::Float(value) => value,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub const fn as_f32(self) -> f32 {
        match self {
            Self::Int(value) => value as f32,
            Self::Float32(value) => value,
            Self::Float(value) => value as f32,
        }
    }

    #[must_use]
    pub const fn is_int(self) -> bool {
        matches!(self, Self::Int(_))
    }

    /// Renders the value the way it is substituted into the header.
    #[must_use]
    pub fn format(self) -> String {
        match self {
            Self::Int(value) => format_i64(value),
            Self::Float32(value) => format_f32(value),
            Self::Float(value) => format_f64(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    /// Integer operands stay integer for these operators.
    const fn keeps_int(self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul)
    }

    const fn apply_int(self, lhs: i64, rhs: i64) -> i64 {
        match self {
            Self::Add => lhs.wrapping_add(rhs),
            Self::Sub => lhs.wrapping_sub(rhs),
            _ => lhs.wrapping_mul(rhs),
        }
    }

    fn apply_float(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div => lhs / rhs,
            Self::Pow => lhs.powf(rhs),
        }
    }

    fn apply_single(self, lhs: f32, rhs: f32) -> f32 {
        match self {
            Self::Add => lhs + rhs,
            Self::Sub => lhs - rhs,
            Self::Mul => lhs * rhs,
            Self::Div => lhs / rhs,
            Self::Pow => lhs.powf(rhs),
        }
    }

    fn apply(self, lhs: Number, rhs: Number) -> Number {
        match (lhs, rhs) {
            (Number::Int(a), Number::Int(b)) if self.keeps_int() => {
                Number::Int(self.apply_int(a, b))
            }
            (Number::Float32(a), Number::Float32(b)) => Number::Float32(self.apply_single(a, b)),
            _ => Number::Float(self.apply_float(lhs.as_f64(), rhs.as_f64())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(Number),
    Column(String),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl Expr {
    fn binary(op: BinaryOp, lhs: Self, rhs: Self) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Parses `source`, resolving `$name` references with `is_column`.
    ///
    /// # Errors
    ///
    /// Returns `UndefinedColumn` for references that match no column and
    /// `Syntax` for anything outside the grammar.
    pub fn parse(source: &str, is_column: impl Fn(&str) -> bool) -> Result<Self, TemplateError> {
        let tokens = tokenize(source, &is_column)?;
        if tokens.is_empty() {
            return Err(syntax("empty expression"));
        }
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.expression()?;
        if parser.pos < parser.tokens.len() {
            return Err(syntax(format!(
                "unexpected {} after expression",
                parser.tokens[parser.pos].describe()
            )));
        }
        Ok(expr)
    }

    /// Evaluates element-wise against the table columns.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced column is missing or not numeric.
    pub fn evaluate(&self, table: &Table) -> Result<Operand, TemplateError> {
        match self {
            Self::Number(value) => Ok(Operand::Scalar(*value)),
            Self::Column(name) => column_operand(table, name),
            Self::Neg(inner) => Ok(inner.evaluate(table)?.negate()),
            Self::Binary { op, lhs, rhs } => {
                combine(*op, &lhs.evaluate(table)?, &rhs.evaluate(table)?)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Int(Vec<i64>),
    Float32(Vec<f32>),
    Float(Vec<f64>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Precision {
    Int,
    Single,
    Double,
}

/// Column-shaped intermediate result; `mask` marks cells missing in any input.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray {
    pub values: Values,
    pub mask: Vec<bool>,
}

impl NumericArray {
    #[must_use]
    pub const fn len(&self) -> usize {
        self.mask.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.mask.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Scalar(Number),
    Array(NumericArray),
}

impl Operand {
    const fn len(&self) -> Option<usize> {
        match self {
            Self::Scalar(_) => None,
            Self::Array(array) => Some(array.len()),
        }
    }

    const fn is_int(&self) -> bool {
        match self {
            Self::Scalar(value) => value.is_int(),
            Self::Array(array) => matches!(array.values, Values::Int(_)),
        }
    }

    /// Precision of a column operand; literals adopt the other side's.
    const fn column_precision(&self) -> Option<Precision> {
        match self {
            Self::Scalar(_) => None,
            Self::Array(array) => Some(match array.values {
                Values::Int(_) => Precision::Int,
                Values::Float32(_) => Precision::Single,
                Values::Float(_) => Precision::Double,
            }),
        }
    }

    fn at(&self, index: usize) -> Number {
        match self {
            Self::Scalar(value) => *value,
            Self::Array(array) => match &array.values {
                Values::Int(values) => Number::Int(values[index]),
                Values::Float32(values) => Number::Float32(values[index]),
                Values::Float(values) => Number::Float(values[index]),
            },
        }
    }

    fn missing_at(&self, index: usize) -> bool {
        match self {
            Self::Scalar(_) => false,
            Self::Array(array) => array.mask[index],
        }
    }

    fn negate(self) -> Self {
        match self {
            Self::Scalar(Number::Int(value)) => Self::Scalar(Number::Int(value.wrapping_neg())),
            Self::Scalar(Number::Float32(value)) => Self::Scalar(Number::Float32(-value)),
            Self::Scalar(Number::Float(value)) => Self::Scalar(Number::Float(-value)),
            Self::Array(mut array) => {
                match &mut array.values {
                    Values::Int(values) => {
                        for value in values.iter_mut() {
                            *value = value.wrapping_neg();
                        }
                    }
                    Values::Float32(values) => {
                        for value in values.iter_mut() {
                            *value = -*value;
                        }
                    }
                    Values::Float(values) => {
                        for value in values.iter_mut() {
                            *value = -*value;
                        }
                    }
                }
                Self::Array(array)
            }
        }
    }
}

fn column_operand(table: &Table, name: &str) -> Result<Operand, TemplateError> {
    let column = table
        .column(name)
        .ok_or_else(|| TemplateError::UndefinedColumn {
            name: name.to_owned(),
        })?;
    let values = match column.data() {
        ColumnData::Float64(values) => Values::Float(values.clone()),
        ColumnData::Float32(values) => Values::Float32(values.clone()),
        ColumnData::Int(values) => Values::Int(values.clone()),
        ColumnData::Logical(values) => Values::Int(values.iter().copied().map(i64::from).collect()),
        ColumnData::Text(_) | ColumnData::Bytes(_) => {
            return Err(TemplateError::NonNumericColumn {
                name: name.to_owned(),
            });
        }
    };
    Ok(Operand::Array(NumericArray {
        values,
        mask: column.mask().to_vec(),
    }))
}

fn result_precision(op: BinaryOp, lhs: &Operand, rhs: &Operand) -> Precision {
    if op.keeps_int() && lhs.is_int() && rhs.is_int() {
        return Precision::Int;
    }
    match (lhs.column_precision(), rhs.column_precision()) {
        (Some(Precision::Single), Some(Precision::Single) | None)
        | (None, Some(Precision::Single)) => Precision::Single,
        _ => Precision::Double,
    }
}

fn combine(op: BinaryOp, lhs: &Operand, rhs: &Operand) -> Result<Operand, TemplateError> {
    let len = match (lhs.len(), rhs.len()) {
        (None, None) => {
            return Ok(Operand::Scalar(op.apply(lhs.at(0), rhs.at(0))));
        }
        (Some(a), Some(b)) if a != b => {
            return Err(TemplateError::LengthMismatch { lhs: a, rhs: b });
        }
        (Some(len), _) | (None, Some(len)) => len,
    };

    let mask = (0..len)
        .map(|index| lhs.missing_at(index) || rhs.missing_at(index))
        .collect();
    let values = match result_precision(op, lhs, rhs) {
        Precision::Int => Values::Int(
            (0..len)
                .map(|index| match (lhs.at(index), rhs.at(index)) {
                    (Number::Int(a), Number::Int(b)) => op.apply_int(a, b),
                    _ => 0,
                })
                .collect(),
        ),
        Precision::Single => Values::Float32(
            (0..len)
                .map(|index| op.apply_single(lhs.at(index).as_f32(), rhs.at(index).as_f32()))
                .collect(),
        ),
        Precision::Double => Values::Float(
            (0..len)
                .map(|index| op.apply_float(lhs.at(index).as_f64(), rhs.at(index).as_f64()))
                .collect(),
        ),
    };
    Ok(Operand::Array(NumericArray { values, mask }))
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(Number),
    Column(String),
    Op(BinaryOp),
    LParen,
    RParen,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Self::Number(value) => format!("number {}", value.format()),
            Self::Column(name) => format!("column ${name}"),
            Self::Op(op) => format!("operator {op:?}"),
            Self::LParen => "'('".to_owned(),
            Self::RParen => "')'".to_owned(),
        }
    }
}

const REFERENCE_TERMINATORS: [char; 6] = ['+', '*', '-', '/', '^', '='];

fn tokenize(source: &str, is_column: &dyn Fn(&str) -> bool) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut rest = source;
    while let Some(ch) = rest.chars().next() {
        let (token, consumed) = match ch {
            _ if ch.is_whitespace() => {
                rest = &rest[ch.len_utf8()..];
                continue;
            }
            '$' => {
                let (name, consumed) = column_reference(&rest[1..], is_column)?;
                (Token::Column(name), consumed + 1)
            }
            '+' => (Token::Op(BinaryOp::Add), 1),
            '-' => (Token::Op(BinaryOp::Sub), 1),
            '*' if rest.starts_with("**") => (Token::Op(BinaryOp::Pow), 2),
            '*' => (Token::Op(BinaryOp::Mul), 1),
            '/' => (Token::Op(BinaryOp::Div), 1),
            '^' => (Token::Op(BinaryOp::Pow), 1),
            '(' => (Token::LParen, 1),
            ')' => (Token::RParen, 1),
            '0'..='9' | '.' => number_literal(rest)?,
            other => return Err(syntax(format!("unexpected character '{other}'"))),
        };
        tokens.push(token);
        rest = &rest[consumed..];
    }
    Ok(tokens)
}

/// Resolves the text after a `$`, returning the column name and the bytes consumed.
fn column_reference(
    text: &str,
    is_column: &dyn Fn(&str) -> bool,
) -> Result<(String, usize), TemplateError> {
    let end = text.find(REFERENCE_TERMINATORS).unwrap_or(text.len());
    let raw = &text[..end];
    let lead = raw.len() - raw.trim_start().len();
    let mut candidate = raw.trim();
    if candidate.is_empty() {
        return Err(syntax("'$' is not followed by a column name"));
    }
    loop {
        if is_column(candidate) {
            return Ok((candidate.to_owned(), lead + candidate.len()));
        }
        match candidate.strip_suffix(')').map(str::trim_end) {
            Some(shorter) if !shorter.is_empty() => candidate = shorter,
            _ => {
                let name = raw
                    .trim()
                    .trim_end_matches(|c: char| c == ')' || c.is_whitespace());
                return Err(TemplateError::UndefinedColumn {
                    name: name.to_owned(),
                });
            }
        }
    }
}

fn number_literal(text: &str) -> Result<(Token, usize), TemplateError> {
    let bytes = text.as_bytes();
    let digits = |from: usize| {
        bytes[from..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = digits(0);
    let mut is_float = false;
    if bytes.get(end) == Some(&b'.') {
        is_float = true;
        end += 1 + digits(end + 1);
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exponent = digits(end + 1 + sign);
        if exponent > 0 {
            is_float = true;
            end += 1 + sign + exponent;
        }
    }

    let literal = &text[..end];
    let number = if is_float {
        literal.parse::<f64>().ok().map(Number::Float)
    } else {
        literal
            .parse::<i64>()
            .ok()
            .map(Number::Int)
            .or_else(|| literal.parse::<f64>().ok().map(Number::Float))
    };
    number
        .map(|number| (Token::Number(number), end))
        .ok_or_else(|| syntax(format!("invalid number '{literal}'")))
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek_op(&self) -> Option<BinaryOp> {
        match self.tokens.get(self.pos) {
            Some(Token::Op(op)) => Some(*op),
            _ => None,
        }
    }

    fn expression(&mut self) -> Result<Expr, TemplateError> {
        let mut lhs = self.term()?;
        while let Some(op @ (BinaryOp::Add | BinaryOp::Sub)) = self.peek_op() {
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr, TemplateError> {
        let mut lhs = self.unary()?;
        while let Some(op @ (BinaryOp::Mul | BinaryOp::Div)) = self.peek_op() {
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr, TemplateError> {
        match self.peek_op() {
            Some(BinaryOp::Sub) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(BinaryOp::Add) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, TemplateError> {
        let base = self.atom()?;
        if self.peek_op() == Some(BinaryOp::Pow) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(Expr::binary(BinaryOp::Pow, base, exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Expr, TemplateError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| syntax("unexpected end of expression"))?;
        self.pos += 1;
        match token {
            Token::Number(value) => Ok(Expr::Number(value)),
            Token::Column(name) => Ok(Expr::Column(name)),
            Token::LParen => {
                let inner = self.expression()?;
                if self.tokens.get(self.pos) != Some(&Token::RParen) {
                    return Err(syntax("missing ')'"));
                }
                self.pos += 1;
                Ok(inner)
            }
            other => Err(syntax(format!("unexpected {}", other.describe()))),
        }
    }
}

fn syntax(details: impl Into<String>) -> TemplateError {
    TemplateError::Syntax {
        details: details.into(),
    }
}
