//! Object-store view of the tables in a group.
//!
//! Tables backing object types are named `class_<ObjectType>`. Properties are
//! the table's columns in declaration order.

use crate::error::{CoreError, CoreResult};
use crate::table::TableSource;
use crate::types::{DataKind, TableId};

const CLASS_PREFIX: &str = "class_";

/// Returns the object type stored in a table, if the table backs one.
#[must_use]
pub fn object_type_for_table_name(table_name: &str) -> Option<&str> {
    table_name
        .strip_prefix(CLASS_PREFIX)
        .filter(|object_type| !object_type.is_empty())
}

/// Returns the table name backing an object type.
#[must_use]
pub fn table_name_for_object_type(object_type: &str) -> String {
    format!("{CLASS_PREFIX}{object_type}")
}

/// A persisted property of an object type.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Declared data kind.
    pub kind: DataKind,
    /// Backing column index.
    pub column: usize,
    /// Whether the property is optional.
    pub nullable: bool,
    /// Object type a link property points to.
    pub object_type: Option<String>,
}

/// A property reached from a base table by following zero or more links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    /// Link columns followed from the base table, in order.
    pub links: Vec<usize>,
    /// Column of the final property in the table reached.
    pub column: usize,
    /// Table reached after following `links`.
    pub table: TableId,
}

/// Schema lookup over a group's tables.
pub trait ObjectStore: TableSource {
    /// Finds a table by physical name.
    fn find_table(&self, name: &str) -> Option<TableId>;

    /// Finds the table backing an object type.
    fn table_for_object_type(&self, object_type: &str) -> Option<TableId> {
        self.find_table(&table_name_for_object_type(object_type))
    }

    /// Returns the ordered persisted properties of a table.
    fn persisted_properties(&self, table: TableId) -> CoreResult<Vec<Property>> {
        let table = self.table(table)?;
        let mut properties = Vec::with_capacity(table.column_count());
        for column in 0..table.column_count() {
            let spec = table.column_spec(column)?;
            let object_type = match spec.link_target {
                Some(target) => object_type_for_table_name(self.table(target)?.name())
                    .map(str::to_owned),
                None => None,
            };
            properties.push(Property {
                name: spec.name.clone(),
                kind: spec.kind,
                column,
                nullable: spec.nullable,
                object_type,
            });
        }
        Ok(properties)
    }

    /// Resolves a dotted property path such as `Dogs.Color`.
    fn resolve_property_path(&self, base: TableId, path: &str) -> CoreResult<PropertyPath> {
        let mut table = base;
        let mut links = Vec::new();
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            let current = self.table(table)?;
            let column =
                current
                    .column_index(segment)
                    .ok_or_else(|| CoreError::PropertyNotFound {
                        object_type: object_type_for_table_name(current.name())
                            .unwrap_or(current.name())
                            .to_owned(),
                        name: segment.to_owned(),
                    })?;
            if segments.peek().is_none() {
                return Ok(PropertyPath {
                    links,
                    column,
                    table,
                });
            }
            table = current.link_target(column)?;
            links.push(column);
        }
        Err(CoreError::PropertyNotFound {
            object_type: String::new(),
            name: path.to_owned(),
        })
    }

    /// Resolves a path given as property indices into each hop's property list.
    fn resolve_property_indices(
        &self,
        base: TableId,
        indices: &[usize],
    ) -> CoreResult<PropertyPath> {
        let (last, hops) = indices
            .split_last()
            .ok_or_else(|| CoreError::invalid_operation("empty property path"))?;
        let mut table = base;
        let mut links = Vec::with_capacity(hops.len());
        for &index in hops {
            let property = self.property_at(table, index)?;
            table = self.table(table)?.link_target(property.column)?;
            links.push(property.column);
        }
        let column = self.property_at(table, *last)?.column;
        Ok(PropertyPath {
            links,
            column,
            table,
        })
    }

    /// Returns the property at `index` in a table's property list.
    fn property_at(&self, table: TableId, index: usize) -> CoreResult<Property> {
        let mut properties = self.persisted_properties(table)?;
        if index >= properties.len() {
            return Err(CoreError::ColumnOutOfRange {
                column: index,
                count: properties.len(),
            });
        }
        Ok(properties.swap_remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_prefix_mapping() {
        assert_eq!(object_type_for_table_name("class_Dog"), Some("Dog"));
        assert_eq!(object_type_for_table_name("metadata"), None);
        assert_eq!(object_type_for_table_name("class_"), None);
        assert_eq!(table_name_for_object_type("Owner"), "class_Owner");
    }
}
