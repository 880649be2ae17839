//! Sort clauses over property paths.

use crate::error::{QueryError, QueryResult};
use crate::link::LinkChain;
use std::cmp::Ordering;
use tablink_core::{DataKind, ObjectStore, TableId, TableSource, Value};

/// One sort key: a column reached through link hops, and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortClause {
    /// Link columns followed from the base table.
    pub chain: LinkChain,
    /// Key column in the table reached.
    pub column: usize,
    /// Ascending when true.
    pub ascending: bool,
}

impl SortClause {
    /// Sorts by a base-table column.
    #[must_use]
    pub fn local(column: usize, ascending: bool) -> Self {
        Self {
            chain: LinkChain::local(),
            column,
            ascending,
        }
    }
}

/// An ordered list of sort clauses; later clauses break ties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortDescriptor {
    clauses: Vec<SortClause>,
}

impl SortDescriptor {
    /// Creates a descriptor from clauses.
    #[must_use]
    pub fn new(clauses: Vec<SortClause>) -> Self {
        Self { clauses }
    }

    /// Returns the clauses.
    #[must_use]
    pub fn clauses(&self) -> &[SortClause] {
        &self.clauses
    }

    /// Resolves a property path such as `TopDog.Name` against `base`.
    pub fn by_path(
        store: &dyn ObjectStore,
        base: TableId,
        path: &str,
        ascending: bool,
    ) -> QueryResult<SortClause> {
        let path = store.resolve_property_path(base, path)?;
        Ok(SortClause {
            chain: LinkChain::new(path.links),
            column: path.column,
            ascending,
        })
    }

    /// Rebuilds clauses sent across the boundary in flattened form.
    ///
    /// `path_lengths[i]` property indices from `flattened` form clause `i`;
    /// each index addresses the persisted property list of the table reached
    /// so far.
    pub fn unflatten(
        store: &dyn ObjectStore,
        base: TableId,
        path_lengths: &[usize],
        ascending: &[bool],
        flattened: &[usize],
    ) -> QueryResult<Self> {
        if path_lengths.len() != ascending.len() {
            return Err(QueryError::malformed(format!(
                "{} sort paths but {} directions",
                path_lengths.len(),
                ascending.len()
            )));
        }
        let total: usize = path_lengths.iter().sum();
        if total != flattened.len() {
            return Err(QueryError::malformed(format!(
                "sort paths cover {total} indices but {} were given",
                flattened.len()
            )));
        }
        let mut clauses = Vec::with_capacity(path_lengths.len());
        let mut offset = 0;
        for (&length, &ascending) in path_lengths.iter().zip(ascending) {
            if length == 0 {
                return Err(QueryError::malformed("empty sort path"));
            }
            let path = store.resolve_property_indices(base, &flattened[offset..offset + length])?;
            offset += length;
            clauses.push(SortClause {
                chain: LinkChain::new(path.links),
                column: path.column,
                ascending,
            });
        }
        Ok(Self { clauses })
    }

    /// Reorders `rows` of `base` stably by the clauses.
    pub fn apply(
        &self,
        source: &dyn TableSource,
        base: TableId,
        rows: &mut Vec<usize>,
    ) -> QueryResult<()> {
        for clause in &self.clauses {
            validate(source, base, clause)?;
        }
        let mut keyed = Vec::with_capacity(rows.len());
        for &row in rows.iter() {
            let keys = self
                .clauses
                .iter()
                .map(|clause| sort_key(source, base, clause, row))
                .collect::<QueryResult<Vec<_>>>()?;
            keyed.push((row, keys));
        }
        keyed.sort_by(|(_, a), (_, b)| {
            self.clauses
                .iter()
                .zip(a.iter().zip(b))
                .map(|(clause, (x, y))| {
                    let ordering = order_values(x, y);
                    if clause.ascending {
                        ordering
                    } else {
                        ordering.reverse()
                    }
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });
        *rows = keyed.into_iter().map(|(row, _)| row).collect();
        Ok(())
    }
}

/// Total order used for sorting: nulls first, incomparable values tie.
pub(crate) fn order_values(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.compare(b).unwrap_or(Ordering::Equal),
    }
}

fn validate(source: &dyn TableSource, base: TableId, clause: &SortClause) -> QueryResult<()> {
    let mut table = base;
    for &column in clause.chain.hops() {
        let current = source.table(table)?;
        let kind = current.column_kind(column)?;
        if kind != DataKind::Link {
            return Err(QueryError::invalid_link(format!(
                "sort path hop '{}' is {kind}, only links can be followed",
                current.column_name(column)?
            )));
        }
        table = current.link_target(column)?;
    }
    let kind = source.table(table)?.column_kind(clause.column)?;
    if matches!(kind, DataKind::LinkList | DataKind::Table) {
        return Err(QueryError::type_mismatch(format!(
            "cannot sort by {kind} column {}",
            clause.column
        )));
    }
    Ok(())
}

fn sort_key(
    source: &dyn TableSource,
    base: TableId,
    clause: &SortClause,
    row: usize,
) -> QueryResult<Value> {
    let mut table = source.table(base)?;
    let mut row = row;
    for &column in clause.chain.hops() {
        match table.get_link(column, row)? {
            Some(next) => {
                let target = table.link_target(column)?;
                table = source.table(target)?;
                row = next;
            }
            None => return Ok(Value::Null),
        }
    }
    Ok(table.get(clause.column, row)?.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablink_core::{ColumnSpec, Group};

    fn owners() -> (Group, TableId) {
        let mut group = Group::default();
        let dogs = group.add_table("class_Dog").unwrap();
        group
            .add_column(dogs, ColumnSpec::new("Name", DataKind::String))
            .unwrap();
        let owners = group.add_table("class_Owner").unwrap();
        group
            .add_column(owners, ColumnSpec::new("Name", DataKind::String))
            .unwrap();
        group
            .add_link_column(owners, "TopDog", DataKind::Link, dogs)
            .unwrap();
        group
            .add_link_column(owners, "Dogs", DataKind::LinkList, dogs)
            .unwrap();
        for name in ["Rex", "Ace"] {
            group
                .add_row(dogs, vec![Value::String(name.into())])
                .unwrap();
        }
        for (name, top) in [("Tim", Value::Link(0)), ("Al", Value::Null), ("Bea", Value::Link(1))] {
            group
                .add_row(
                    owners,
                    vec![Value::String(name.into()), top, Value::LinkList(vec![])],
                )
                .unwrap();
        }
        (group, owners)
    }

    #[test]
    fn sorts_through_links_with_nulls_first() {
        let (group, owners) = owners();
        let clause = SortDescriptor::by_path(&group, owners, "TopDog.Name", true).unwrap();
        let mut rows = vec![0, 1, 2];
        SortDescriptor::new(vec![clause])
            .apply(&group, owners, &mut rows)
            .unwrap();
        assert_eq!(rows, vec![1, 2, 0]);
    }

    #[test]
    fn descending_and_tie_breaks() {
        let (group, owners) = owners();
        let mut rows = vec![0, 1, 2];
        SortDescriptor::new(vec![SortClause::local(0, false)])
            .apply(&group, owners, &mut rows)
            .unwrap();
        assert_eq!(rows, vec![0, 2, 1]);
    }

    #[test]
    fn unflatten_resolves_property_indices() {
        let (group, owners) = owners();
        let descriptor =
            SortDescriptor::unflatten(&group, owners, &[2, 1], &[true, false], &[1, 0, 0]).unwrap();
        assert_eq!(descriptor.clauses()[0].chain.hops(), &[1]);
        assert_eq!(descriptor.clauses()[0].column, 0);
        assert_eq!(descriptor.clauses()[1], SortClause::local(0, false));
    }

    #[test]
    fn unflatten_rejects_inconsistent_lengths() {
        let (group, owners) = owners();
        assert!(SortDescriptor::unflatten(&group, owners, &[2], &[true], &[1]).is_err());
        assert!(SortDescriptor::unflatten(&group, owners, &[1], &[], &[1]).is_err());
        assert!(SortDescriptor::unflatten(&group, owners, &[0], &[true], &[]).is_err());
    }

    #[test]
    fn link_list_hops_are_rejected() {
        let (group, owners) = owners();
        let clause = SortDescriptor::by_path(&group, owners, "Dogs.Name", true).unwrap();
        let mut rows = vec![0];
        assert!(matches!(
            SortDescriptor::new(vec![clause]).apply(&group, owners, &mut rows),
            Err(QueryError::InvalidLink { .. })
        ));
    }
}
