//! Link-chain resolution.
//!
//! A chain is a list of link or link-list column indices followed from a
//! base table. Predicates and sort clauses address a column of the table at
//! the end of the chain.

use crate::error::{QueryError, QueryResult};
use tablink_core::{DataKind, Table, TableId, TableSource};

/// An ordered path of relationship columns rooted at a base table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkChain {
    hops: Vec<usize>,
}

impl LinkChain {
    /// Creates a chain from column indices.
    pub fn new(hops: impl Into<Vec<usize>>) -> Self {
        Self { hops: hops.into() }
    }

    /// The empty chain, addressing the base table itself.
    #[must_use]
    pub fn local() -> Self {
        Self::default()
    }

    /// Returns the hop column indices.
    #[must_use]
    pub fn hops(&self) -> &[usize] {
        &self.hops
    }

    /// Returns true if the chain has no hops.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    /// Resolves the table reached after following every hop from `base`.
    pub fn resolve(&self, source: &dyn TableSource, base: TableId) -> QueryResult<TableId> {
        let mut table = base;
        for (depth, &column) in self.hops.iter().enumerate() {
            let current = source.table(table)?;
            table = hop_target(current, column, depth)?;
        }
        Ok(table)
    }

    /// Returns true if `visit` accepts some row reachable from `row`.
    ///
    /// Link hops follow the single target (a null link reaches nothing);
    /// link-list hops fan out to every listed row.
    pub fn any_reachable(
        &self,
        source: &dyn TableSource,
        base: TableId,
        row: usize,
        visit: &mut dyn FnMut(&Table, usize) -> QueryResult<bool>,
    ) -> QueryResult<bool> {
        reach(source, base, row, &self.hops, 0, visit)
    }
}

fn hop_target(table: &Table, column: usize, depth: usize) -> QueryResult<TableId> {
    let spec = table.column_spec(column).map_err(|_| {
        QueryError::invalid_link(format!(
            "hop {depth}: column {column} out of range for '{}' ({} columns)",
            table.name(),
            table.column_count()
        ))
    })?;
    if !matches!(spec.kind, DataKind::Link | DataKind::LinkList) {
        return Err(QueryError::invalid_link(format!(
            "hop {depth}: column '{}' of '{}' is {}, not a link",
            spec.name,
            table.name(),
            spec.kind
        )));
    }
    spec.link_target.ok_or_else(|| {
        QueryError::invalid_link(format!("hop {depth}: column '{}' has no target", spec.name))
    })
}

fn reach(
    source: &dyn TableSource,
    table_id: TableId,
    row: usize,
    hops: &[usize],
    depth: usize,
    visit: &mut dyn FnMut(&Table, usize) -> QueryResult<bool>,
) -> QueryResult<bool> {
    let table = source.table(table_id)?;
    let Some((&column, rest)) = hops.split_first() else {
        return visit(table, row);
    };
    let target = hop_target(table, column, depth)?;
    for next in table.follow(column, row)? {
        if reach(source, target, next, rest, depth + 1, visit)? {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablink_core::{ColumnSpec, Group, Value};

    fn chain_fixture() -> (Group, TableId, TableId, TableId) {
        let mut group = Group::default();
        let categories = group.add_table("class_ItemCategory").unwrap();
        group
            .add_column(categories, ColumnSpec::new("Id", DataKind::String))
            .unwrap();
        let models = group.add_table("class_ItemModel").unwrap();
        group
            .add_column(models, ColumnSpec::new("Id", DataKind::String))
            .unwrap();
        group
            .add_link_column(models, "ItemCategory", DataKind::Link, categories)
            .unwrap();
        let items = group.add_table("class_Item").unwrap();
        group
            .add_column(items, ColumnSpec::new("Id", DataKind::String))
            .unwrap();
        group
            .add_link_column(items, "ItemModel", DataKind::Link, models)
            .unwrap();
        group
            .add_link_column(items, "Models", DataKind::LinkList, models)
            .unwrap();

        for id in ["1", "2"] {
            group
                .add_row(categories, vec![Value::String(id.into())])
                .unwrap();
        }
        group
            .add_row(models, vec![Value::String("11".into()), Value::Link(0)])
            .unwrap();
        group
            .add_row(models, vec![Value::String("12".into()), Value::Link(1)])
            .unwrap();
        group
            .add_row(
                items,
                vec![
                    Value::String("21".into()),
                    Value::Link(0),
                    Value::LinkList(vec![0, 1]),
                ],
            )
            .unwrap();
        (group, items, models, categories)
    }

    #[test]
    fn empty_chain_is_identity() {
        let (group, items, _, _) = chain_fixture();
        assert_eq!(LinkChain::local().resolve(&group, items).unwrap(), items);
    }

    #[test]
    fn resolves_two_hops() {
        let (group, items, models, categories) = chain_fixture();
        assert_eq!(LinkChain::new([1]).resolve(&group, items).unwrap(), models);
        assert_eq!(
            LinkChain::new([1, 1]).resolve(&group, items).unwrap(),
            categories
        );
    }

    #[test]
    fn non_link_hop_is_invalid() {
        let (group, items, _, _) = chain_fixture();
        assert!(matches!(
            LinkChain::new([0]).resolve(&group, items),
            Err(QueryError::InvalidLink { .. })
        ));
        assert!(matches!(
            LinkChain::new([1, 7]).resolve(&group, items),
            Err(QueryError::InvalidLink { .. })
        ));
    }

    #[test]
    fn link_lists_fan_out() {
        let (group, items, _, _) = chain_fixture();
        let chain = LinkChain::new([2, 1]);
        let mut seen = Vec::new();
        let found = chain
            .any_reachable(&group, items, 0, &mut |table, row| {
                seen.push(table.get_string(0, row)?.unwrap_or_default().to_owned());
                Ok(false)
            })
            .unwrap();
        assert!(!found);
        assert_eq!(seen, vec!["1", "2"]);
    }
}
