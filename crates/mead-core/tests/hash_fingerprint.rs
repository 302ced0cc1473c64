use std::fs;
use std::path::PathBuf;

use mead_core::{
    hash_config, order_json, remove_extra_keys, to_dumps_string, ExclusionKeys, KeyPath,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use sha1::{Digest, Sha1};

fn fixture(name: &str) -> Value {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    serde_json::from_str(&fs::read_to_string(path).expect("fixture")).expect("fixture json")
}

fn object(entries: &[(String, Value)]) -> Value {
    let map: Map<String, Value> = entries.iter().cloned().collect();
    Value::Object(map)
}

fn no_exclusions() -> ExclusionKeys {
    ExclusionKeys::new(Vec::new())
}

#[test]
fn sorted_hash_matches_reference_digest() {
    let hash = hash_config(&json!({"b": 14, "a": 12}), &no_exclusions()).expect("hash");
    assert_eq!(hash, "647aa7508f72ece3f8b9df986a206d95fd9a2caf");
}

#[test]
fn unsorted_layout_would_hash_differently() {
    let text = to_dumps_string(&json!({"b": 14, "a": 12})).expect("dumps");
    assert_eq!(text, "{\"b\": 14, \"a\": 12}");
    assert_eq!(
        hex::encode(Sha1::digest(text.as_bytes())),
        "a22215982dc0e53617be08de7ba9f1a80d232b23"
    );
}

#[test]
fn delete_and_non_ascii_characters_are_escaped() {
    let text = to_dumps_string(&json!({"a": "x\u{7f}y", "b": "tab\there", "c": "naïve"}))
        .expect("dumps");
    assert_eq!(
        text,
        "{\"a\": \"x\\u007fy\", \"b\": \"tab\\there\", \"c\": \"na\\u00efve\"}"
    );
}

#[test]
fn excluded_keys_do_not_change_the_fingerprint() {
    let base = fixture("sst2.json");
    let mut noisy = base.clone();
    noisy["basedir"] = json!("/somewhere/else");
    noisy["visdom"] = json!(true);
    noisy["train"]["verbose"] = json!({"console": false});
    noisy["train"]["nsteps"] = json!(250);
    noisy["model"]["gpus"] = json!(4);
    noisy["test_batchsz"] = json!(1);

    let keys = ExclusionKeys::default();
    assert_eq!(
        hash_config(&base, &keys).expect("base"),
        hash_config(&noisy, &keys).expect("noisy")
    );

    let mut changed = base.clone();
    changed["train"]["epochs"] = json!(3);
    assert_ne!(
        hash_config(&base, &keys).expect("base"),
        hash_config(&changed, &keys).expect("changed")
    );
}

#[test]
fn remove_extra_keys_skips_missing_and_non_object_parents() {
    let config = json!({"train": 5, "reporting": {"visdom": true}, "keep": 1});
    let keys = ExclusionKeys::from_dotted(["train.verbose", "model.gpus", "reporting"]);
    let stripped = remove_extra_keys(&config, &keys);
    assert_eq!(stripped, json!({"train": 5, "keep": 1}));
    // the input is untouched
    assert!(config.get("reporting").is_some());
}

#[test]
fn single_segment_entries_are_removed() {
    let config = json!({"test_batchsz": 10, "basedir": "x", "batchsz": 50});
    let stripped = remove_extra_keys(&config, &ExclusionKeys::default());
    assert_eq!(stripped, json!({"batchsz": 50}));
}

#[test]
fn custom_paths_extend_the_defaults() {
    let config = json!({"train": {"epochs": 2, "seed": 7}});
    let keys = ExclusionKeys::default().with(KeyPath::new(["train", "seed"]));
    assert_eq!(
        remove_extra_keys(&config, &keys),
        json!({"train": {"epochs": 2}})
    );
}

#[test]
fn order_json_sorts_nested_objects_inside_arrays() {
    let data = json!({"z": [{"y": 1, "b": 2}], "a": {"d": 1, "c": 2}});
    let ordered = order_json(&data);
    let text = to_dumps_string(&ordered).expect("dumps");
    assert_eq!(
        text,
        "{\"a\": {\"c\": 2, \"d\": 1}, \"z\": [{\"b\": 2, \"y\": 1}]}"
    );
}

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        (-1.0e6f64..1.0e6).prop_map(Value::from),
        "[a-z ]{0,8}".prop_map(Value::from),
    ]
}

fn entries() -> impl Strategy<Value = Vec<(String, Value)>> {
    prop::collection::btree_map("[a-z_]{1,8}", leaf(), 1..8)
        .prop_map(|map| map.into_iter().collect::<Vec<_>>())
}

fn shuffled_pair() -> impl Strategy<Value = (Vec<(String, Value)>, Vec<(String, Value)>)> {
    entries().prop_flat_map(|entries| (Just(entries.clone()), Just(entries).prop_shuffle()))
}

proptest! {
    #[test]
    fn hash_ignores_insertion_order(
        (outer, shuffled_outer) in shuffled_pair(),
        (inner, shuffled_inner) in shuffled_pair(),
    ) {
        let mut first = outer;
        first.push(("~nested".to_string(), object(&inner)));
        let mut second = vec![("~nested".to_string(), object(&shuffled_inner))];
        second.extend(shuffled_outer);

        let keys = ExclusionKeys::default();
        prop_assert_eq!(
            hash_config(&object(&first), &keys).unwrap(),
            hash_config(&object(&second), &keys).unwrap()
        );
    }

    #[test]
    fn order_json_is_idempotent(outer in entries(), inner in entries()) {
        let mut entries = outer;
        entries.push(("~inner".to_string(), object(&inner)));
        let value = object(&entries);
        let once = order_json(&value);
        let twice = order_json(&once);
        prop_assert_eq!(
            to_dumps_string(&once).unwrap(),
            to_dumps_string(&twice).unwrap()
        );
    }
}
