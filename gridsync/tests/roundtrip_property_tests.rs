use gridsync::build::build_object;
use gridsync::extract::{extract_catalog, extract_markup, extract_object};
use gridsync::formats::{Catalog, CatalogEntry, Element};
use proptest::prelude::*;
use serde_json::{Map, Value, json};
use std::collections::HashSet;

fn segment_strategy() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-z][a-z0-9_]{0,5}").expect("valid segment regex")
}

fn leaf_strategy() -> impl Strategy<Value = Value> {
    proptest::string::string_regex("[A-Za-z0-9 _\\-\\.,!\\?]{0,20}")
        .expect("valid value regex")
        .prop_map(Value::String)
}

fn object_tree_strategy() -> impl Strategy<Value = Value> {
    let node = leaf_strategy().prop_recursive(3, 48, 4, |inner| {
        prop::collection::btree_map(segment_strategy(), inner, 1..4)
            .prop_map(|map| Value::Object(map.into_iter().collect()))
    });
    prop::collection::btree_map(segment_strategy(), node, 1..6)
        .prop_map(|map| Value::Object(map.into_iter().collect()))
}

fn catalog_key_strategy() -> impl Strategy<Value = String> {
    // Small alphabet so duplicates and literal "(n)" suffixes collide often.
    proptest::string::string_regex("[ab](/[ab])?(\\([12]\\))?").expect("valid key regex")
}

fn records_as_page(records: &[gridsync::Record]) -> Vec<Value> {
    match serde_json::to_value(records).unwrap() {
        Value::Array(items) => items,
        other => panic!("expected array, got {other}"),
    }
}

proptest! {
    #[test]
    fn prop_object_tree_roundtrips(tree in object_tree_strategy()) {
        let records = extract_object("col", &tree);
        let rebuilt = build_object(Map::new(), &records_as_page(&records));
        prop_assert_eq!(Value::Object(rebuilt), tree);
    }

    #[test]
    fn prop_catalog_ids_are_unique(keys in prop::collection::vec(catalog_key_strategy(), 0..40)) {
        let catalog = Catalog::new(
            keys.iter().enumerate().map(|(i, k)| CatalogEntry::new(k.clone(), i.to_string())).collect(),
        );
        let records = extract_catalog("col", &catalog);
        prop_assert_eq!(records.len(), keys.len());
        let unique: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
        prop_assert_eq!(unique.len(), records.len());
        // Values stay in source order.
        for (i, record) in records.iter().enumerate() {
            prop_assert_eq!(&record.cells[0].value, &json!(i.to_string()));
        }
    }

    #[test]
    fn prop_markup_ids_are_unique(names in prop::collection::vec("[ab]", 0..30)) {
        let mut root = Element::root();
        for name in &names {
            root.children.push(
                Element::new("phrase").with_attr("name", name.as_str()).with_attr("text", "v"),
            );
        }
        let records = extract_markup("col", &root);
        prop_assert_eq!(records.len(), names.len());
        let unique: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
        prop_assert_eq!(unique.len(), records.len());
    }

    #[test]
    fn prop_second_build_never_overwrites(
        tree in object_tree_strategy(),
        replacement in "[A-Z]{1,8}",
    ) {
        let records = extract_object("col", &tree);
        let page = records_as_page(&records);
        let first = build_object(Map::new(), &page);

        let overwrite: Vec<Value> = records
            .iter()
            .map(|r| json!({"id": r.id, "cells": [{"columnId": "col", "value": replacement}]}))
            .collect();
        let second = build_object(first.clone(), &overwrite);
        prop_assert_eq!(second, first);
    }
}

#[test]
fn duplicate_catalog_keys_are_numbered_in_encounter_order() {
    let catalog = Catalog::new(vec![
        CatalogEntry::new("x", "v1"),
        CatalogEntry::new("y", "w"),
        CatalogEntry::new("x", "v2"),
        CatalogEntry::new("x", "v3"),
    ]);
    let ids: Vec<String> = extract_catalog("col", &catalog)
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["x", "y", "x(1)", "x(2)"]);
}

#[test]
fn null_leaves_roundtrip_as_empty_strings() {
    let tree = json!({"a": {"b": null, "c": "x"}});
    let records = extract_object("col", &tree);
    let rebuilt = build_object(Map::new(), &records_as_page(&records));
    assert_eq!(Value::Object(rebuilt), json!({"a": {"b": "", "c": "x"}}));
}
