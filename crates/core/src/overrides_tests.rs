// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

fn ov(value: Value) -> Overrides {
    into_overrides(value).unwrap()
}

#[test]
fn single_object_is_one_job() {
    let all = expand_overrides(r#"{"test": [1, 2, 3], "a": 1}"#, None).unwrap();
    assert_eq!(all, vec![ov(json!({"test": [1, 2, 3], "a": 1}))]);
}

#[test]
fn iterate_key_explodes_list() {
    let all = expand_overrides(r#"{"test": [1, 2, 3], "a": 1}"#, Some("test")).unwrap();
    assert_eq!(
        all,
        vec![
            ov(json!({"test": 1, "a": 1})),
            ov(json!({"test": 2, "a": 1})),
            ov(json!({"test": 3, "a": 1})),
        ]
    );
}

#[test]
fn list_ignores_iterate_key() {
    let all = expand_overrides(r#"[{"test": 1}, {"test": 2}]"#, Some("blah")).unwrap();
    assert_eq!(all, vec![ov(json!({"test": 1})), ov(json!({"test": 2}))]);
}

#[test]
fn empty_input_is_one_empty_job() {
    assert_eq!(expand_overrides("", None).unwrap(), vec![Overrides::new()]);
}

#[test]
fn iterate_key_must_exist_and_be_a_list() {
    assert!(matches!(
        expand_overrides(r#"{"a": 1}"#, Some("b")),
        Err(OverridesError::MissingIterateKey { .. })
    ));
    assert!(matches!(
        expand_overrides(r#"{"a": 1}"#, Some("a")),
        Err(OverridesError::NotAList { .. })
    ));
}

#[test]
fn scalar_document_is_rejected() {
    assert!(matches!(expand_overrides("5", None), Err(OverridesError::NotAnObject(_))));
}

#[test]
fn filter_matches_subset_regardless_of_order() {
    let stored = ov(json!({"n": 5, "region": "eu"}));
    assert!(matches(&stored, &ov(json!({"region": "eu", "n": 5}))));
    assert!(matches(&stored, &ov(json!({"n": 5}))));
    assert!(matches(&stored, &Overrides::new()));
    assert!(!matches(&stored, &ov(json!({"n": 6}))));
    assert!(!matches(&stored, &ov(json!({"missing": 1}))));
}
