//! Token stream compilation into an evaluable expression tree.
//!
//! Grammar, with AND implicit between adjacent operands:
//!
//! ```text
//! expr    := and ( OR and )*
//! and     := unary+
//! unary   := NOT unary | primary
//! primary := predicate | subquery | GROUP_BEGIN expr? GROUP_END
//! ```
//!
//! An empty stream, and an empty group, compile to [`Expr::True`].

use crate::error::{QueryError, QueryResult};
use crate::predicate::AtomicPredicate;
use tablink_core::TableSource;

/// One element of a query under construction.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Predicate(AtomicPredicate),
    SubQuery(Expr),
    Or,
    Not,
    GroupBegin,
    GroupEnd,
}

impl Token {
    fn starts_operand(&self) -> bool {
        matches!(
            self,
            Self::Predicate(_) | Self::SubQuery(_) | Self::Not | Self::GroupBegin
        )
    }
}

/// A compiled boolean filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Matches every row.
    True,
    /// A single predicate.
    Predicate(AtomicPredicate),
    /// All operands match.
    And(Vec<Expr>),
    /// Any operand matches.
    Or(Vec<Expr>),
    /// Operand does not match.
    Not(Box<Expr>),
}

impl Expr {
    /// Evaluates the expression for one base-table row.
    pub fn evaluate(&self, source: &dyn TableSource, row: usize) -> QueryResult<bool> {
        match self {
            Self::True => Ok(true),
            Self::Predicate(predicate) => predicate.evaluate(source, row),
            Self::And(operands) => {
                for operand in operands {
                    if !operand.evaluate(source, row)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Or(operands) => {
                for operand in operands {
                    if operand.evaluate(source, row)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::Not(operand) => Ok(!operand.evaluate(source, row)?),
        }
    }

    /// Returns the number of atomic predicates in the tree.
    #[must_use]
    pub fn predicate_count(&self) -> usize {
        match self {
            Self::True => 0,
            Self::Predicate(_) => 1,
            Self::And(operands) | Self::Or(operands) => {
                operands.iter().map(Self::predicate_count).sum()
            }
            Self::Not(operand) => operand.predicate_count(),
        }
    }

    fn flatten(mut operands: Vec<Self>, wrap: fn(Vec<Self>) -> Self) -> Self {
        if operands.len() == 1 {
            operands.swap_remove(0)
        } else {
            wrap(operands)
        }
    }
}

pub(crate) fn compile(tokens: &[Token]) -> QueryResult<Expr> {
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.disjunction()?;
    match parser.peek() {
        None => Ok(expr),
        Some(Token::GroupEnd) => Err(QueryError::malformed(format!(
            "group end at token {} has no matching group begin",
            parser.pos
        ))),
        Some(other) => Err(QueryError::malformed(format!(
            "unexpected {other:?} at token {}",
            parser.pos
        ))),
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn disjunction(&mut self) -> QueryResult<Expr> {
        let mut alternatives = Vec::new();
        loop {
            let conjunction = self.conjunction()?;
            if matches!(self.peek(), Some(Token::Or)) {
                let left = conjunction.ok_or_else(|| {
                    QueryError::malformed(format!("OR at token {} has no left operand", self.pos))
                })?;
                alternatives.push(left);
                self.pos += 1;
                continue;
            }
            match conjunction {
                Some(right) => alternatives.push(right),
                None if alternatives.is_empty() => return Ok(Expr::True),
                None => {
                    return Err(QueryError::malformed(format!(
                        "OR before token {} has no right operand",
                        self.pos
                    )))
                }
            }
            return Ok(Expr::flatten(alternatives, Expr::Or));
        }
    }

    fn conjunction(&mut self) -> QueryResult<Option<Expr>> {
        let mut operands = Vec::new();
        while self.peek().is_some_and(Token::starts_operand) {
            operands.push(self.unary()?);
        }
        Ok((!operands.is_empty()).then(|| Expr::flatten(operands, Expr::And)))
    }

    fn unary(&mut self) -> QueryResult<Expr> {
        let Some(token) = self.peek() else {
            return Err(QueryError::malformed("expression ends inside an operand"));
        };
        let at = self.pos;
        self.pos += 1;
        match token {
            Token::Predicate(predicate) => Ok(Expr::Predicate(predicate.clone())),
            Token::SubQuery(expr) => Ok(expr.clone()),
            Token::Not => {
                if !self.peek().is_some_and(Token::starts_operand) {
                    return Err(QueryError::malformed(format!(
                        "NOT at token {at} is not followed by an operand"
                    )));
                }
                Ok(Expr::Not(Box::new(self.unary()?)))
            }
            Token::GroupBegin => {
                let inner = self.disjunction()?;
                if !matches!(self.peek(), Some(Token::GroupEnd)) {
                    return Err(QueryError::malformed(format!(
                        "group begun at token {at} is never closed"
                    )));
                }
                self.pos += 1;
                Ok(inner)
            }
            Token::Or | Token::GroupEnd => Err(QueryError::malformed(format!(
                "{token:?} at token {at} cannot start an operand"
            ))),
        }
    }
}
