//! Property-based test generators using proptest.

use proptest::prelude::*;
use tablink_core::{Timestamp, Value};

/// Strategy for printable text, including astral-plane characters.
pub fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            4 => prop::char::range(' ', '~'),
            2 => prop::char::range('\u{a0}', '\u{7ff}'),
            2 => prop::char::range('\u{800}', '\u{d7ff}'),
            1 => prop::char::range('\u{e000}', '\u{fffd}'),
            2 => prop::char::range('\u{1f300}', '\u{1faff}'),
            1 => prop::char::range('\u{20000}', '\u{2a6df}'),
        ],
        0..96,
    )
    .prop_map(|chars| chars.into_iter().collect())
}

/// Strategy for well-formed UTF-16 unit sequences.
pub fn utf16_strategy() -> impl Strategy<Value = Vec<u16>> {
    text_strategy().prop_map(|s| s.encode_utf16().collect())
}

/// Strategy for UTF-16 sequences containing at least one unpaired surrogate.
pub fn broken_utf16_strategy() -> impl Strategy<Value = Vec<u16>> {
    (utf16_strategy(), 0xd800u16..=0xdfff, any::<prop::sample::Index>()).prop_map(
        |(mut units, surrogate, at)| {
            let position = at.index(units.len() + 1);
            units.insert(position, surrogate);
            // A high surrogate followed by a low one would pair up.
            if (0xd800..0xdc00).contains(&surrogate) {
                if let Some(next) = units.get_mut(position + 1) {
                    if (0xdc00..0xe000).contains(next) {
                        *next = u16::from(b'x');
                    }
                }
            }
            if (0xdc00..0xe000).contains(&surrogate) && position > 0 {
                if let Some(prev) = units.get_mut(position - 1) {
                    if (0xd800..0xdc00).contains(prev) {
                        *prev = u16::from(b'x');
                    }
                }
            }
            units
        },
    )
}

/// Strategy for (name, age) rows of the people table.
pub fn person_strategy() -> impl Strategy<Value = (String, i64)> {
    (
        prop::string::string_regex("[A-Z][a-z]{0,7}").expect("Invalid regex"),
        0i64..100,
    )
}

/// Strategy for tables of people.
pub fn people_strategy(max_rows: usize) -> impl Strategy<Value = Vec<(String, i64)>> {
    prop::collection::vec(person_strategy(), 0..=max_rows)
}

/// Strategy for non-null scalar cell values.
pub fn scalar_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
        (-1.0e6f64..1.0e6).prop_map(Value::Double),
        text_strategy().prop_map(Value::String),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(Value::Binary),
        (-62_135_596_800i64..253_402_300_799, 0i32..1_000_000_000)
            .prop_map(|(s, n)| Value::Timestamp(Timestamp::new(s, n))),
    ]
}
