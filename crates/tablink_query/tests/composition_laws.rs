//! Property tests for AND/OR/NOT composition.

use proptest::prelude::*;
use tablink_core::Value;
use tablink_query::{CompareOp, Query, Range};
use tablink_testkit::{people_strategy, People};

fn people_of(rows: &[(String, i64)]) -> People {
    let borrowed: Vec<(&str, i64)> = rows.iter().map(|(n, a)| (n.as_str(), *a)).collect();
    People::with_rows(&borrowed)
}

fn add_age_predicate(query: &mut Query, people: &People, op: CompareOp, age: i64) {
    query
        .compare(&people.group, People::AGE, op, Value::Int(age), true)
        .unwrap();
}

fn matching(people: &People, op: CompareOp, age: i64) -> Vec<usize> {
    let mut query = Query::new(people.table);
    add_age_predicate(&mut query, people, op, age);
    query.find_all(&people.group, Range::ALL).unwrap().rows().to_vec()
}

proptest! {
    #[test]
    fn and_is_intersection(rows in people_strategy(24), a in 0i64..100, b in 0i64..100) {
        let people = people_of(&rows);
        let mut query = Query::new(people.table);
        add_age_predicate(&mut query, &people, CompareOp::GreaterOrEqual, a);
        add_age_predicate(&mut query, &people, CompareOp::LessThan, b);
        let both = query.find_all(&people.group, Range::ALL).unwrap();

        let left = matching(&people, CompareOp::GreaterOrEqual, a);
        let right = matching(&people, CompareOp::LessThan, b);
        let expected: Vec<usize> = left.into_iter().filter(|r| right.contains(r)).collect();
        prop_assert_eq!(both.rows(), expected.as_slice());
    }

    #[test]
    fn or_is_union(rows in people_strategy(24), a in 0i64..100, b in 0i64..100) {
        let people = people_of(&rows);
        let mut query = Query::new(people.table);
        add_age_predicate(&mut query, &people, CompareOp::Equal, a);
        query.or().unwrap();
        add_age_predicate(&mut query, &people, CompareOp::GreaterThan, b);
        let either = query.find_all(&people.group, Range::ALL).unwrap();

        let left = matching(&people, CompareOp::Equal, a);
        let right = matching(&people, CompareOp::GreaterThan, b);
        let expected: Vec<usize> = (0..rows.len())
            .filter(|r| left.contains(r) || right.contains(r))
            .collect();
        prop_assert_eq!(either.rows(), expected.as_slice());
    }

    #[test]
    fn not_is_complement(rows in people_strategy(24), a in 0i64..100) {
        let people = people_of(&rows);
        let mut query = Query::new(people.table);
        query.not().unwrap();
        add_age_predicate(&mut query, &people, CompareOp::LessOrEqual, a);
        let negated = query.count(&people.group, Range::ALL).unwrap();
        let positive = matching(&people, CompareOp::LessOrEqual, a).len();
        prop_assert_eq!(negated + positive, rows.len());
    }

    #[test]
    fn count_agrees_with_find_all(rows in people_strategy(24), a in 0i64..100, limit in 0usize..8) {
        let people = people_of(&rows);
        let mut query = Query::new(people.table);
        add_age_predicate(&mut query, &people, CompareOp::NotEqual, a);
        let range = Range::new(0, usize::MAX, limit);
        let count = query.count(&people.group, range).unwrap();
        let view = query.find_all(&people.group, range).unwrap();
        prop_assert_eq!(count, view.size());
        prop_assert!(count <= limit);
    }
}
