//! Composite filters bound to one base table.

use crate::error::{QueryError, QueryResult};
use crate::expr::{compile, Expr, Token};
use crate::link::LinkChain;
use crate::predicate::{AtomicPredicate, CompareOp, PredicateBuilder};
use tablink_core::{TableId, TableSource, Value};
use tracing::debug;

/// Lifecycle of a [`Query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    /// Accepting predicates and connectives.
    Building,
    /// Compiled by a materialization; composition is closed.
    Sealed,
}

/// An ordered stack of predicates and connectives over a base table.
///
/// Adjacent operands are AND'd; [`Query::or`] separates alternatives.
/// The first materialization seals the query.
#[derive(Debug, Clone)]
pub struct Query {
    table: TableId,
    tokens: Vec<Token>,
    state: QueryState,
    compiled: Option<Expr>,
}

impl Query {
    /// Creates an empty query, which matches every row.
    #[must_use]
    pub fn new(table: TableId) -> Self {
        Self {
            table,
            tokens: Vec::new(),
            state: QueryState::Building,
            compiled: None,
        }
    }

    /// Returns the base table.
    #[must_use]
    pub fn table(&self) -> TableId {
        self.table
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> QueryState {
        self.state
    }

    /// Returns the number of predicates and connectives added so far.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Appends a prebuilt predicate.
    pub fn push(&mut self, predicate: AtomicPredicate) -> QueryResult<()> {
        if predicate.base() != self.table {
            return Err(QueryError::malformed(format!(
                "predicate over {} added to query over {}",
                predicate.base(),
                self.table
            )));
        }
        self.append(Token::Predicate(predicate))
    }

    /// Adds a comparison on a base-table column.
    pub fn compare(
        &mut self,
        source: &dyn TableSource,
        column: usize,
        op: CompareOp,
        operand: Value,
        case_sensitive: bool,
    ) -> QueryResult<()> {
        self.ensure_building()?;
        let predicate =
            PredicateBuilder::new(source, self.table).compare(column, op, operand, case_sensitive)?;
        self.push(predicate)
    }

    /// Adds a comparison on a column of the table reached through `chain`.
    pub fn link_compare(
        &mut self,
        source: &dyn TableSource,
        chain: &LinkChain,
        column: usize,
        op: CompareOp,
        operand: Value,
        case_sensitive: bool,
    ) -> QueryResult<()> {
        self.ensure_building()?;
        let predicate = PredicateBuilder::new(source, self.table)
            .through(chain.clone())
            .compare(column, op, operand, case_sensitive)?;
        self.push(predicate)
    }

    /// Adds a null (`is_null`) or not-null test on a base-table column.
    pub fn null(&mut self, source: &dyn TableSource, column: usize, is_null: bool) -> QueryResult<()> {
        self.link_null(source, &LinkChain::local(), column, is_null)
    }

    /// Adds a null or not-null test on a column reached through `chain`.
    pub fn link_null(
        &mut self,
        source: &dyn TableSource,
        chain: &LinkChain,
        column: usize,
        is_null: bool,
    ) -> QueryResult<()> {
        self.ensure_building()?;
        let predicate = PredicateBuilder::new(source, self.table)
            .through(chain.clone())
            .null(column, is_null)?;
        self.push(predicate)
    }

    /// Adds an inclusive range test on an integer column.
    pub fn between(
        &mut self,
        source: &dyn TableSource,
        column: usize,
        low: i64,
        high: i64,
    ) -> QueryResult<()> {
        self.ensure_building()?;
        let predicate = PredicateBuilder::new(source, self.table).between(column, low, high)?;
        self.push(predicate)
    }

    /// Adds a test that a link column points at `row`.
    pub fn links_to(&mut self, source: &dyn TableSource, column: usize, row: usize) -> QueryResult<()> {
        self.ensure_building()?;
        let predicate = PredicateBuilder::new(source, self.table).links_to(column, row)?;
        self.push(predicate)
    }

    /// Separates two alternatives.
    pub fn or(&mut self) -> QueryResult<()> {
        self.append(Token::Or)
    }

    /// Negates the next predicate or group.
    pub fn not(&mut self) -> QueryResult<()> {
        self.append(Token::Not)
    }

    /// Opens a group.
    pub fn group_begin(&mut self) -> QueryResult<()> {
        self.append(Token::GroupBegin)
    }

    /// Closes the innermost open group.
    pub fn group_end(&mut self) -> QueryResult<()> {
        self.append(Token::GroupEnd)
    }

    /// Inlines `other` as a single AND'd clause.
    ///
    /// `other` must be over the same base table. It is sealed by this call.
    pub fn and_query(&mut self, other: &mut Query) -> QueryResult<()> {
        self.ensure_building()?;
        if other.table != self.table {
            return Err(QueryError::malformed(format!(
                "cannot combine query over {} with query over {}",
                other.table, self.table
            )));
        }
        let expr = other.seal()?.clone();
        self.append(Token::SubQuery(expr))
    }

    /// Returns the index of a base-table column by name.
    pub fn column_index(&self, source: &dyn TableSource, name: &str) -> QueryResult<Option<usize>> {
        Ok(source.table(self.table)?.column_index(name))
    }

    /// Compiles the query if needed and closes it to further composition.
    pub fn seal(&mut self) -> QueryResult<&Expr> {
        if self.compiled.is_none() {
            let expr = compile(&self.tokens)?;
            debug!(
                table = %self.table,
                tokens = self.tokens.len(),
                predicates = expr.predicate_count(),
                "sealed query"
            );
            self.state = QueryState::Sealed;
            self.compiled = Some(expr);
        }
        self.compiled
            .as_ref()
            .ok_or_else(|| QueryError::invalid_state("query has no compiled expression"))
    }

    fn append(&mut self, token: Token) -> QueryResult<()> {
        self.ensure_building()?;
        self.tokens.push(token);
        Ok(())
    }

    fn ensure_building(&self) -> QueryResult<()> {
        match self.state {
            QueryState::Building => Ok(()),
            QueryState::Sealed => Err(QueryError::invalid_state(
                "query was materialized and can no longer be composed",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablink_core::{ColumnSpec, DataKind, Group};

    fn people() -> (Group, TableId) {
        let mut group = Group::default();
        let t = group.add_table("class_Person").unwrap();
        group
            .add_column(t, ColumnSpec::new("Name", DataKind::String))
            .unwrap();
        group
            .add_column(t, ColumnSpec::new("Age", DataKind::Integer))
            .unwrap();
        (group, t)
    }

    #[test]
    fn sealing_closes_composition() {
        let (group, t) = people();
        let mut query = Query::new(t);
        query
            .compare(&group, 1, CompareOp::Equal, Value::Int(30), true)
            .unwrap();
        assert_eq!(query.state(), QueryState::Building);
        query.seal().unwrap();
        assert_eq!(query.state(), QueryState::Sealed);
        assert!(matches!(query.or(), Err(QueryError::InvalidState { .. })));
        assert!(matches!(
            query.compare(&group, 1, CompareOp::Equal, Value::Int(1), true),
            Err(QueryError::InvalidState { .. })
        ));
        assert_eq!(query.token_count(), 1);
    }

    #[test]
    fn failed_compile_stays_building() {
        let (_, t) = people();
        let mut query = Query::new(t);
        query.group_begin().unwrap();
        assert!(matches!(
            query.seal(),
            Err(QueryError::MalformedExpression { .. })
        ));
        assert_eq!(query.state(), QueryState::Building);
        query.group_end().unwrap();
        assert_eq!(query.seal().unwrap(), &Expr::True);
    }

    #[test]
    fn rejected_predicate_leaves_query_unchanged() {
        let (group, t) = people();
        let mut query = Query::new(t);
        assert!(query
            .compare(&group, 0, CompareOp::LessThan, Value::String("x".into()), true)
            .is_err());
        assert_eq!(query.token_count(), 0);
    }

    #[test]
    fn and_query_requires_same_table() {
        let (mut group, t) = people();
        let other_table = group.add_table("other").unwrap();
        let mut query = Query::new(t);
        let mut other = Query::new(other_table);
        assert!(matches!(
            query.and_query(&mut other),
            Err(QueryError::MalformedExpression { .. })
        ));
        let mut same = Query::new(t);
        query.and_query(&mut same).unwrap();
        assert_eq!(same.state(), QueryState::Sealed);
    }

    #[test]
    fn column_index_by_name() {
        let (group, t) = people();
        let query = Query::new(t);
        assert_eq!(query.column_index(&group, "Age").unwrap(), Some(1));
        assert_eq!(query.column_index(&group, "Missing").unwrap(), None);
    }
}
