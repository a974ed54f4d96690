// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Boolean condition expressions over agent properties.
//!
//! Used by pools (dynamic membership) and lease requirements. Grammar:
//!
//! ```text
//! or      := and ('||' and)*
//! and     := unary ('&&' unary)*
//! unary   := '!' unary | compare
//! compare := operand (('==' | '!=' | '~=' | '<' | '<=' | '>' | '>=') operand)?
//! operand := identifier | 'text' | "text" | number | true | false | '(' or ')'
//! ```
//!
//! An identifier names a property and stands for all of its values; a
//! comparison holds when any value satisfies it, except `!=` which holds when
//! no value is equal. Text comparison is case-insensitive.

use crate::properties::PropertySet;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors from parsing a condition
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },
    #[error("expected {expected} at offset {offset}")]
    Expected { expected: &'static str, offset: usize },
    #[error("invalid regex at offset {offset}: {message}")]
    InvalidRegex { offset: usize, message: String },
}

/// A parsed condition. Serializes as its source text.
#[derive(Clone)]
pub struct Condition {
    text: String,
    root: Node,
}

impl Condition {
    pub fn parse(text: &str) -> Result<Self, ConditionError> {
        let tokens = tokenize(text)?;
        let mut parser = Parser { tokens, pos: 0, end: text.len() };
        let root = parser.or()?;
        if let Some((_, offset)) = parser.tokens.get(parser.pos) {
            return Err(ConditionError::Expected { expected: "end of expression", offset: *offset });
        }
        Ok(Self { text: text.to_string(), root })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn evaluate(&self, properties: &PropertySet) -> bool {
        self.root.eval(properties)
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Condition").field(&self.text).finish()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Condition {}

impl std::str::FromStr for Condition {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Condition {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Text(String),
    Number(String),
    True,
    False,
    And,
    Or,
    Not,
    Eq,
    Ne,
    Match,
    Lt,
    Le,
    Gt,
    Ge,
    Open,
    Close,
}

fn tokenize(text: &str) -> Result<Vec<(Token, usize)>, ConditionError> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        let start = i;
        let two = text.get(i..i + 2).unwrap_or("");
        let token = match two {
            "&&" => Some(Token::And),
            "||" => Some(Token::Or),
            "==" => Some(Token::Eq),
            "!=" => Some(Token::Ne),
            "~=" => Some(Token::Match),
            "<=" => Some(Token::Le),
            ">=" => Some(Token::Ge),
            _ => None,
        };
        if let Some(token) = token {
            tokens.push((token, start));
            i += 2;
            continue;
        }
        match c {
            ' ' | '\t' | '\r' | '\n' => i += 1,
            '!' => {
                tokens.push((Token::Not, start));
                i += 1;
            }
            '<' => {
                tokens.push((Token::Lt, start));
                i += 1;
            }
            '>' => {
                tokens.push((Token::Gt, start));
                i += 1;
            }
            '(' => {
                tokens.push((Token::Open, start));
                i += 1;
            }
            ')' => {
                tokens.push((Token::Close, start));
                i += 1;
            }
            '\'' | '"' => {
                let rest = &text[i + 1..];
                let len = rest.find(c).ok_or(ConditionError::UnterminatedString { offset: start })?;
                tokens.push((Token::Text(rest[..len].to_string()), start));
                i += len + 2;
            }
            c if c.is_ascii_digit() || (c == '-' && next_is_digit(bytes, i)) => {
                let len = text[i + 1..]
                    .find(|ch: char| !(ch.is_ascii_digit() || ch == '.'))
                    .map_or(text.len() - i, |n| n + 1);
                let literal = &text[i..i + len];
                if literal.parse::<f64>().is_err() {
                    return Err(ConditionError::UnexpectedChar { ch: c, offset: start });
                }
                tokens.push((Token::Number(literal.to_string()), start));
                i += len;
            }
            c if is_ident_char(c) => {
                let len = text[i..].find(|ch: char| !is_ident_char(ch)).unwrap_or(text.len() - i);
                let word = &text[i..i + len];
                let token = if word.eq_ignore_ascii_case("true") {
                    Token::True
                } else if word.eq_ignore_ascii_case("false") {
                    Token::False
                } else {
                    Token::Ident(word.to_string())
                };
                tokens.push((token, start));
                i += len;
            }
            _ => {
                let ch = text[i..].chars().next().unwrap_or(c);
                return Err(ConditionError::UnexpectedChar { ch, offset: start });
            }
        }
    }
    Ok(tokens)
}

fn next_is_digit(bytes: &[u8], i: usize) -> bool {
    bytes.get(i + 1).is_some_and(u8::is_ascii_digit)
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | ':')
}

#[derive(Debug, Clone)]
enum Operand {
    Property(String),
    /// Quoted text or a numeric literal, kept verbatim
    Literal(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compare {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone)]
enum Node {
    Literal(bool),
    Truthy(String),
    Not(Box<Node>),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Compare(Compare, Operand, Operand),
    Match(Operand, Regex),
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(t, _)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(_, o)| *o)
    }

    fn next(&mut self) -> Option<(Token, usize)> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn or(&mut self) -> Result<Node, ConditionError> {
        let mut left = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let right = self.and()?;
            left = Node::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Node, ConditionError> {
        let mut left = self.unary()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let right = self.unary()?;
            left = Node::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Node, ConditionError> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            return Ok(Node::Not(Box::new(self.unary()?)));
        }
        self.compare()
    }

    fn compare(&mut self) -> Result<Node, ConditionError> {
        let offset = self.offset();
        let left = match self.next() {
            Some((Token::Open, _)) => {
                let inner = self.or()?;
                match self.next() {
                    Some((Token::Close, _)) => return Ok(inner),
                    _ => return Err(ConditionError::Expected { expected: "')'", offset: self.offset() }),
                }
            }
            Some((Token::True, _)) => return Ok(Node::Literal(true)),
            Some((Token::False, _)) => return Ok(Node::Literal(false)),
            Some((Token::Ident(name), _)) => Operand::Property(name),
            Some((Token::Text(text), _)) => Operand::Literal(text),
            Some((Token::Number(n), _)) => Operand::Literal(n),
            _ => return Err(ConditionError::Expected { expected: "operand", offset }),
        };

        let op = match self.peek() {
            Some(Token::Eq) => Compare::Eq,
            Some(Token::Ne) => Compare::Ne,
            Some(Token::Lt) => Compare::Lt,
            Some(Token::Le) => Compare::Le,
            Some(Token::Gt) => Compare::Gt,
            Some(Token::Ge) => Compare::Ge,
            Some(Token::Match) => {
                self.pos += 1;
                let offset = self.offset();
                let pattern = match self.next() {
                    Some((Token::Text(text), _)) => text,
                    _ => return Err(ConditionError::Expected { expected: "regex string", offset }),
                };
                let regex = RegexBuilder::new(&pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| ConditionError::InvalidRegex { offset, message: e.to_string() })?;
                return Ok(Node::Match(left, regex));
            }
            _ => {
                return match left {
                    Operand::Property(name) => Ok(Node::Truthy(name)),
                    _ => Err(ConditionError::Expected { expected: "comparison", offset: self.offset() }),
                };
            }
        };
        self.pos += 1;

        let offset = self.offset();
        let right = match self.next() {
            Some((Token::Ident(name), _)) => Operand::Property(name),
            Some((Token::Text(text), _)) => Operand::Literal(text),
            Some((Token::Number(n), _)) => Operand::Literal(n),
            Some((Token::True, _)) => Operand::Literal("true".to_string()),
            Some((Token::False, _)) => Operand::Literal("false".to_string()),
            _ => return Err(ConditionError::Expected { expected: "operand", offset }),
        };
        Ok(Node::Compare(op, left, right))
    }
}

impl Operand {
    fn values(&self, properties: &PropertySet) -> Vec<String> {
        match self {
            Self::Property(name) => properties.values(name).to_vec(),
            Self::Literal(text) => vec![text.clone()],
        }
    }
}

impl Node {
    fn eval(&self, properties: &PropertySet) -> bool {
        match self {
            Self::Literal(value) => *value,
            Self::Truthy(name) => properties.values(name).iter().any(|v| v.eq_ignore_ascii_case("true")),
            Self::Not(inner) => !inner.eval(properties),
            Self::And(a, b) => a.eval(properties) && b.eval(properties),
            Self::Or(a, b) => a.eval(properties) || b.eval(properties),
            Self::Match(operand, regex) => {
                operand.values(properties).iter().any(|v| regex.is_match(v))
            }
            Self::Compare(op, left, right) => {
                let lhs = left.values(properties);
                let rhs = right.values(properties);
                match op {
                    Compare::Eq => any_pair(&lhs, &rhs, |l, r| l.eq_ignore_ascii_case(r)),
                    Compare::Ne => !any_pair(&lhs, &rhs, |l, r| l.eq_ignore_ascii_case(r)),
                    Compare::Lt => any_pair(&lhs, &rhs, |l, r| numeric(l, r, |a, b| a < b)),
                    Compare::Le => any_pair(&lhs, &rhs, |l, r| numeric(l, r, |a, b| a <= b)),
                    Compare::Gt => any_pair(&lhs, &rhs, |l, r| numeric(l, r, |a, b| a > b)),
                    Compare::Ge => any_pair(&lhs, &rhs, |l, r| numeric(l, r, |a, b| a >= b)),
                }
            }
        }
    }
}

fn any_pair(lhs: &[String], rhs: &[String], f: impl Fn(&str, &str) -> bool) -> bool {
    lhs.iter().any(|l| rhs.iter().any(|r| f(l, r)))
}

fn numeric(l: &str, r: &str, cmp: fn(f64, f64) -> bool) -> bool {
    match (l.parse::<f64>(), r.parse::<f64>()) {
        (Ok(a), Ok(b)) => cmp(a, b),
        _ => false,
    }
}

#[cfg(test)]
#[path = "condition_tests.rs"]
mod tests;
