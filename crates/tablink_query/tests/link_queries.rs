//! Integration tests for predicates across link columns.

use tablink_core::{TableSource, Value, NOT_FOUND};
use tablink_query::{CompareOp, LinkChain, Query, QueryError, Range, SortDescriptor};
use tablink_testkit::{ItemChain, OwnersAndDogs};

fn owner_with_top_dog_color(fixture: &OwnersAndDogs, color: &str) -> usize {
    let mut query = Query::new(fixture.owners);
    query
        .link_compare(
            &fixture.group,
            &LinkChain::new([OwnersAndDogs::TOP_DOG]),
            OwnersAndDogs::COLOR,
            CompareOp::Equal,
            Value::String(color.into()),
            true,
        )
        .unwrap();
    query.find(&fixture.group, 0).unwrap()
}

#[test]
fn tim_has_a_black_top_dog() {
    let fixture = OwnersAndDogs::new();
    assert_eq!(owner_with_top_dog_color(&fixture, "Black"), OwnersAndDogs::TIM);
}

#[test]
fn tim_has_no_white_top_dog() {
    let fixture = OwnersAndDogs::new();
    assert_eq!(owner_with_top_dog_color(&fixture, "White"), NOT_FOUND);
}

#[test]
fn tim_has_a_white_dog() {
    let fixture = OwnersAndDogs::new();
    let mut query = Query::new(fixture.owners);
    query
        .link_compare(
            &fixture.group,
            &LinkChain::new([OwnersAndDogs::DOGS]),
            OwnersAndDogs::COLOR,
            CompareOp::Equal,
            Value::String("White".into()),
            true,
        )
        .unwrap();
    let view = query.find_all(&fixture.group, Range::ALL).unwrap();
    assert_eq!(view.rows(), &[OwnersAndDogs::TIM]);
}

#[test]
fn link_null_predicates() {
    let fixture = OwnersAndDogs::new();
    let mut query = Query::new(fixture.owners);
    query
        .null(&fixture.group, OwnersAndDogs::TOP_DOG, true)
        .unwrap();
    assert_eq!(query.find(&fixture.group, 0).unwrap(), OwnersAndDogs::DANI);

    let mut query = Query::new(fixture.owners);
    query
        .null(&fixture.group, OwnersAndDogs::TOP_DOG, false)
        .unwrap();
    assert_eq!(query.find(&fixture.group, 0).unwrap(), OwnersAndDogs::TIM);
}

#[test]
fn links_to_a_row() {
    let fixture = OwnersAndDogs::new();
    let mut query = Query::new(fixture.owners);
    query
        .links_to(&fixture.group, OwnersAndDogs::TOP_DOG, 0)
        .unwrap();
    assert_eq!(query.count(&fixture.group, Range::ALL).unwrap(), 1);

    let mut query = Query::new(fixture.owners);
    assert!(matches!(
        query.links_to(&fixture.group, OwnersAndDogs::TOP_DOG, 7),
        Err(QueryError::OutOfRange { .. })
    ));
}

#[test]
fn non_link_hop_is_invalid() {
    let fixture = OwnersAndDogs::new();
    let chain = LinkChain::new([OwnersAndDogs::OWNER_NAME]);
    assert!(matches!(
        chain.resolve(&fixture.group, fixture.owners),
        Err(QueryError::InvalidLink { .. })
    ));
    let mut query = Query::new(fixture.owners);
    assert!(matches!(
        query.link_compare(
            &fixture.group,
            &chain,
            0,
            CompareOp::Equal,
            Value::String("x".into()),
            true,
        ),
        Err(QueryError::InvalidLink { .. })
    ));
    assert_eq!(
        LinkChain::local().resolve(&fixture.group, fixture.owners).unwrap(),
        fixture.owners
    );
}

#[test]
fn link_predicates_mix_with_local_ones() {
    let fixture = OwnersAndDogs::new();
    let mut query = Query::new(fixture.owners);
    query
        .compare(
            &fixture.group,
            OwnersAndDogs::OWNER_NAME,
            CompareOp::Equal,
            Value::String("Dani".into()),
            true,
        )
        .unwrap();
    query.or().unwrap();
    query.group_begin().unwrap();
    query
        .link_compare(
            &fixture.group,
            &LinkChain::new([OwnersAndDogs::DOGS]),
            OwnersAndDogs::COLOR,
            CompareOp::Equal,
            Value::String("grey".into()),
            false,
        )
        .unwrap();
    query.group_end().unwrap();
    assert_eq!(query.find_all(&fixture.group, Range::ALL).unwrap().rows(), &[1]);
}

#[test]
fn two_levels_deep() {
    let fixture = ItemChain::new();
    let mut query = Query::new(fixture.items);
    query
        .link_compare(
            &fixture.group,
            &LinkChain::new([ItemChain::ITEM_MODEL, ItemChain::ITEM_CATEGORY]),
            ItemChain::ID,
            CompareOp::Equal,
            Value::String("1".into()),
            true,
        )
        .unwrap();
    let view = query.find_all(&fixture.group, Range::ALL).unwrap();
    assert_eq!(view.size(), 1);
    assert_eq!(
        view.get(&fixture.group, ItemChain::ID, 0).unwrap(),
        &Value::String("21".into())
    );
}

#[test]
fn removing_a_dog_unlinks_owners() {
    let mut fixture = OwnersAndDogs::new();
    fixture.group.remove_row(fixture.dogs, 0).unwrap();
    assert_eq!(owner_with_top_dog_color(&fixture, "Black"), NOT_FOUND);
    let owners = fixture.group.table(fixture.owners).unwrap();
    assert_eq!(
        owners
            .get_link_list(OwnersAndDogs::DOGS, OwnersAndDogs::TIM)
            .unwrap(),
        &[0]
    );
}

#[test]
fn sort_owners_by_top_dog_name() {
    let fixture = OwnersAndDogs::new();
    let clause =
        SortDescriptor::by_path(&fixture.group, fixture.owners, "TopDog.Name", false).unwrap();
    let mut query = Query::new(fixture.owners);
    let view = query
        .find_all_sorted(&fixture.group, &SortDescriptor::new(vec![clause]))
        .unwrap();
    assert_eq!(view.rows(), &[OwnersAndDogs::TIM, OwnersAndDogs::DANI]);
}
