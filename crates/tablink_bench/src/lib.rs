//! Benchmark utilities.

use rand::Rng;
use tablink_core::{ColumnSpec, DataKind, Group, TableId, Value};

/// Generate a random ASCII or BMP string of `len` characters.
pub fn random_text(len: usize, ascii: bool) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| {
            if ascii {
                char::from(rng.gen_range(b'a'..=b'z'))
            } else {
                char::from_u32(rng.gen_range(0x00c0..0x0500)).unwrap_or('x')
            }
        })
        .collect()
}

/// Build a `class_Person(Name, Age)` table with `rows` random rows.
pub fn people(rows: usize) -> (Group, TableId) {
    let mut rng = rand::thread_rng();
    let mut group = Group::default();
    let table = group.add_table("class_Person").unwrap();
    group
        .add_column(table, ColumnSpec::new("Name", DataKind::String))
        .unwrap();
    group
        .add_column(table, ColumnSpec::new("Age", DataKind::Integer))
        .unwrap();
    for _ in 0..rows {
        let name = random_text(rng.gen_range(3..12), true);
        let age = rng.gen_range(0..100);
        group
            .add_row(table, vec![Value::String(name), Value::Int(age)])
            .unwrap();
    }
    (group, table)
}

/// Build owners linking to dogs; every owner has a top dog and three dogs.
pub fn owners_and_dogs(owners: usize, dogs: usize) -> (Group, TableId) {
    let mut rng = rand::thread_rng();
    let mut group = Group::default();
    let dog_table = group.add_table("class_Dog").unwrap();
    group
        .add_column(dog_table, ColumnSpec::new("Name", DataKind::String))
        .unwrap();
    let owner_table = group.add_table("class_Owner").unwrap();
    group
        .add_link_column(owner_table, "TopDog", DataKind::Link, dog_table)
        .unwrap();
    group
        .add_link_column(owner_table, "Dogs", DataKind::LinkList, dog_table)
        .unwrap();
    for i in 0..dogs {
        group
            .add_row(dog_table, vec![Value::String(format!("dog{i}"))])
            .unwrap();
    }
    for _ in 0..owners {
        let row = group.add_empty_row(owner_table).unwrap();
        group
            .set_link(owner_table, 0, row, Some(rng.gen_range(0..dogs)))
            .unwrap();
        for _ in 0..3 {
            group
                .link_list_add(owner_table, 1, row, rng.gen_range(0..dogs))
                .unwrap();
        }
    }
    (group, owner_table)
}
