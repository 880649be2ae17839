//! Fixture groups shared by query, boundary and bench tests.
//!
//! Every fixture is built in a plain [`Group`]; [`commit_into`] publishes one
//! through a [`SharedGroup`] when a test needs transactions.

use tablink_core::{ColumnSpec, DataKind, Group, SharedGroup, TableId, Value};

/// The people table: `Name: String`, `Age: Integer`.
///
/// Rows: `("Ann", 30)`, `("Bo", 25)`, `("Cy", 30)`.
pub struct People {
    /// The group holding the table.
    pub group: Group,
    /// The `class_Person` table.
    pub table: TableId,
}

impl People {
    /// `Name` column.
    pub const NAME: usize = 0;
    /// `Age` column.
    pub const AGE: usize = 1;

    /// Builds the three-row table.
    pub fn new() -> Self {
        Self::with_rows(&[("Ann", 30), ("Bo", 25), ("Cy", 30)])
    }

    /// Builds the table with custom rows.
    pub fn with_rows(rows: &[(&str, i64)]) -> Self {
        let mut group = Group::default();
        let table = group.add_table("class_Person").expect("add table");
        group
            .add_column(table, ColumnSpec::new("Name", DataKind::String))
            .expect("add Name");
        group
            .add_column(table, ColumnSpec::new("Age", DataKind::Integer))
            .expect("add Age");
        for (name, age) in rows {
            group
                .add_row(table, vec![Value::String((*name).into()), Value::Int(*age)])
                .expect("add person");
        }
        Self { group, table }
    }
}

impl Default for People {
    fn default() -> Self {
        Self::new()
    }
}

/// Owners and their dogs.
///
/// `Owner(Name, TopDog: Link<Dog>, Dogs: LinkList<Dog>)` and
/// `Dog(Name, Color)`. Tim's top dog is the black Bilbo and he also owns the
/// white Earl; Dani owns nothing; the grey Maggie is unassigned.
pub struct OwnersAndDogs {
    /// The group holding both tables.
    pub group: Group,
    /// The `class_Owner` table.
    pub owners: TableId,
    /// The `class_Dog` table.
    pub dogs: TableId,
}

impl OwnersAndDogs {
    /// `Owner.Name` column.
    pub const OWNER_NAME: usize = 0;
    /// `Owner.TopDog` column.
    pub const TOP_DOG: usize = 1;
    /// `Owner.Dogs` column.
    pub const DOGS: usize = 2;
    /// `Dog.Name` column.
    pub const DOG_NAME: usize = 0;
    /// `Dog.Color` column.
    pub const COLOR: usize = 1;

    /// Row of Tim in `owners`.
    pub const TIM: usize = 0;
    /// Row of Dani in `owners`.
    pub const DANI: usize = 1;

    /// Builds the fixture.
    pub fn new() -> Self {
        let mut group = Group::default();
        let dogs = group.add_table("class_Dog").expect("add Dog");
        group
            .add_column(dogs, ColumnSpec::new("Name", DataKind::String))
            .expect("add Dog.Name");
        group
            .add_column(dogs, ColumnSpec::new("Color", DataKind::String))
            .expect("add Dog.Color");
        let owners = group.add_table("class_Owner").expect("add Owner");
        group
            .add_column(owners, ColumnSpec::new("Name", DataKind::String))
            .expect("add Owner.Name");
        group
            .add_link_column(owners, "TopDog", DataKind::Link, dogs)
            .expect("add Owner.TopDog");
        group
            .add_link_column(owners, "Dogs", DataKind::LinkList, dogs)
            .expect("add Owner.Dogs");

        let dog = |group: &mut Group, name: &str, color: &str| {
            group
                .add_row(
                    dogs,
                    vec![Value::String(name.into()), Value::String(color.into())],
                )
                .expect("add dog")
        };
        let bilbo = dog(&mut group, "Bilbo Fleabaggins", "Black");
        let earl = dog(&mut group, "Earl Yippington III", "White");
        dog(&mut group, "Maggie Mongrel", "Grey");

        group
            .add_row(
                owners,
                vec![
                    Value::String("Tim".into()),
                    Value::Link(bilbo),
                    Value::LinkList(vec![bilbo, earl]),
                ],
            )
            .expect("add Tim");
        group
            .add_row(
                owners,
                vec![
                    Value::String("Dani".into()),
                    Value::Null,
                    Value::LinkList(Vec::new()),
                ],
            )
            .expect("add Dani");

        Self {
            group,
            owners,
            dogs,
        }
    }
}

impl Default for OwnersAndDogs {
    fn default() -> Self {
        Self::new()
    }
}

/// A two-level link chain: `Item.ItemModel -> ItemModel.ItemCategory`.
///
/// Categories "1" and "2", models "11" (category 1) and "12" (category 2),
/// and item "21" using model "11".
pub struct ItemChain {
    /// The group holding the tables.
    pub group: Group,
    /// The `class_Item` table.
    pub items: TableId,
    /// The `class_ItemModel` table.
    pub models: TableId,
    /// The `class_ItemCategory` table.
    pub categories: TableId,
}

impl ItemChain {
    /// `Id` column, shared by all three tables.
    pub const ID: usize = 0;
    /// `Item.ItemModel` column.
    pub const ITEM_MODEL: usize = 1;
    /// `ItemModel.ItemCategory` column.
    pub const ITEM_CATEGORY: usize = 1;

    /// Builds the fixture.
    pub fn new() -> Self {
        let mut group = Group::default();
        let categories = group.add_table("class_ItemCategory").expect("add category");
        group
            .add_column(categories, ColumnSpec::new("Id", DataKind::String))
            .expect("add ItemCategory.Id");
        let models = group.add_table("class_ItemModel").expect("add model");
        group
            .add_column(models, ColumnSpec::new("Id", DataKind::String))
            .expect("add ItemModel.Id");
        group
            .add_link_column(models, "ItemCategory", DataKind::Link, categories)
            .expect("add ItemModel.ItemCategory");
        let items = group.add_table("class_Item").expect("add item");
        group
            .add_column(items, ColumnSpec::new("Id", DataKind::String))
            .expect("add Item.Id");
        group
            .add_link_column(items, "ItemModel", DataKind::Link, models)
            .expect("add Item.ItemModel");

        for id in ["1", "2"] {
            group
                .add_row(categories, vec![Value::String(id.into())])
                .expect("add category row");
        }
        for (id, category) in [("11", 0), ("12", 1)] {
            group
                .add_row(models, vec![Value::String(id.into()), Value::Link(category)])
                .expect("add model row");
        }
        group
            .add_row(items, vec![Value::String("21".into()), Value::Link(0)])
            .expect("add item row");

        Self {
            group,
            items,
            models,
            categories,
        }
    }
}

impl Default for ItemChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Publishes a fixture group as the committed state of a fresh shared group.
pub fn commit_into(group: Group) -> SharedGroup {
    let shared = SharedGroup::in_memory();
    let mut txn = shared.begin_write().expect("begin write");
    *txn.group_mut().expect("writable group") = group;
    txn.commit().expect("commit fixture");
    shared
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablink_core::{ObjectStore, TableSource};

    #[test]
    fn test_people_rows() {
        let people = People::new();
        let table = people.group.table(people.table).unwrap();
        assert_eq!(table.size(), 3);
        assert_eq!(table.get_string(People::NAME, 1).unwrap(), Some("Bo"));
        assert_eq!(table.get_int(People::AGE, 2).unwrap(), Some(30));
    }

    #[test]
    fn test_owner_links() {
        let fixture = OwnersAndDogs::new();
        let owners = fixture.group.table(fixture.owners).unwrap();
        assert_eq!(owners.get_link(OwnersAndDogs::TOP_DOG, OwnersAndDogs::TIM).unwrap(), Some(0));
        assert_eq!(owners.get_link(OwnersAndDogs::TOP_DOG, OwnersAndDogs::DANI).unwrap(), None);
        assert_eq!(
            owners.get_link_list(OwnersAndDogs::DOGS, OwnersAndDogs::TIM).unwrap(),
            &[0, 1]
        );
        assert_eq!(
            fixture.group.table_for_object_type("Dog"),
            Some(fixture.dogs)
        );
    }

    #[test]
    fn test_item_chain_paths() {
        let fixture = ItemChain::new();
        let path = fixture
            .group
            .resolve_property_path(fixture.items, "ItemModel.ItemCategory.Id")
            .unwrap();
        assert_eq!(path.links, vec![ItemChain::ITEM_MODEL, ItemChain::ITEM_CATEGORY]);
        assert_eq!(path.table, fixture.categories);
    }

    #[test]
    fn test_commit_into() {
        let shared = commit_into(People::new().group);
        let read = shared.begin_read();
        assert_eq!(read.group().table_count(), 1);
        assert_eq!(shared.version(), 1);
    }
}
