//! Tests for grouping and folding duplicate records.

use super::*;
use crate::normalize::NormalizeOptions;
use chrono::DateTime;
use serde_json::{json, Value};
use std::collections::BTreeSet;

fn login(id: &str, name: &str, password: &str, urls: &[&str], modified: i64) -> Record {
    login_with_passkeys(id, name, password, urls, &[], modified)
}

fn login_with_passkeys(
    id: &str,
    name: &str,
    password: &str,
    urls: &[&str],
    key_ids: &[&str],
    modified: i64,
) -> Record {
    let passkeys: Vec<Value> = key_ids
        .iter()
        .map(|key_id| json!({"keyId": key_id, "rpId": "example.com", "content": format!("{}-{}", key_id, id)}))
        .collect();
    Record::from_external(json!({
        "itemId": id,
        "data": {
            "metadata": {"name": name, "note": ""},
            "extraFields": [],
            "type": "login",
            "content": {
                "username": "bob",
                "password": password,
                "urls": urls,
                "totpUri": "",
                "passkeys": passkeys
            }
        },
        "createTime": 1_600_000_000,
        "modifyTime": modified,
        "pinned": false
    }))
    .unwrap()
}

fn card(id: &str, expiry: &str, modified: i64) -> Record {
    Record::from_external(json!({
        "itemId": id,
        "data": {
            "metadata": {"name": "Card", "note": ""},
            "type": "creditCard",
            "content": {
                "cardholderName": "Jane Doe",
                "number": "4111111111111111",
                "expirationDate": expiry
            }
        },
        "createTime": 1_600_000_000,
        "modifyTime": modified
    }))
    .unwrap()
}

fn alias(id: &str) -> Record {
    Record::from_external(json!({"itemId": id, "data": {"type": "alias"}})).unwrap()
}

fn ids(records: &[Record]) -> Vec<String> {
    records.iter().map(|r| r.header.id.clone()).collect()
}

fn dedup(records: Vec<Record>) -> (Vec<Record>, DedupStats) {
    deduplicate_records("Personal", records, &mut |_: &DuplicateEvent<'_>| {}).unwrap()
}

#[test]
fn test_grouping_partitions_records() {
    let records = vec![
        login("a", "Example", "pw1", &[], 1),
        alias("x"),
        login("b", "Other", "pw1", &[], 1),
        login("c", "Example", "pw1", &[], 2),
        alias("y"),
        card("d", "2027-01", 1),
    ];
    let groups = group_records(records);

    let grouped: Vec<Vec<String>> = groups.iter().map(|g| ids(g)).collect();
    assert_eq!(
        grouped,
        vec![
            vec!["a".to_string(), "c".to_string()],
            vec!["x".to_string()],
            vec!["b".to_string()],
            vec!["y".to_string()],
            vec!["d".to_string()],
        ]
    );

    let all: BTreeSet<String> = groups.iter().flat_map(|g| ids(g)).collect();
    assert_eq!(all.len(), 6);
}

#[test]
fn test_different_variants_never_group() {
    // A note and a login sharing a name never collide: the key carries the variant.
    let note = Record::from_external(json!({
        "itemId": "n",
        "data": {"metadata": {"name": "Example", "note": ""}, "type": "note"}
    }))
    .unwrap();
    let groups = group_records(vec![note, login("a", "Example", "", &[], 1)]);
    assert_eq!(groups.len(), 2);
}

#[test]
fn test_login_scenario_merges_normalized_urls() {
    let t1 = 1_700_000_000;
    let t2 = 1_700_000_500;
    let mut records = vec![
        login("first", "Example", "pw1", &["https://Example.com/login"], t1),
        login("second", "Example", "pw1", &["http://example.com"], t2),
    ];
    for record in &mut records {
        record.normalize(&NormalizeOptions::default());
    }
    assert_eq!(records[0].login().unwrap().urls, vec!["https://example.com/"]);
    assert_eq!(records[1].login().unwrap().urls, vec!["http://example.com/"]);

    let (out, stats) = dedup(records);
    assert_eq!(out.len(), 1);
    assert_eq!(stats.duplicate_groups, 1);
    assert_eq!(stats.records_removed, 1);

    let merged = &out[0];
    assert_eq!(merged.header.modified_at, DateTime::from_timestamp(t2, 0).unwrap());
    let urls: BTreeSet<&str> = merged.login().unwrap().urls.iter().map(|u| u.as_str()).collect();
    assert_eq!(urls, BTreeSet::from(["https://example.com/", "http://example.com/"]));
    // The newer record is authoritative, so its URLs lead.
    assert_eq!(merged.login().unwrap().urls[0], "http://example.com/");
    assert_eq!(merged.header.id, "second");
}

#[test]
fn test_card_scenario_later_expiry_wins() {
    let (out, _) = dedup(vec![
        card("new", "2030-06", 1_700_000_000),
        card("old", "2026-06", 1_600_000_000),
    ]);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].credit_card().unwrap().expiry, "2030-06");

    let (out, _) = dedup(vec![
        card("old", "2026-06", 1_600_000_000),
        card("new", "2030-06", 1_700_000_000),
    ]);
    assert_eq!(out[0].credit_card().unwrap().expiry, "2030-06");
}

#[test]
fn test_fold_orders_each_step_by_modified_time() {
    let (out, stats) = dedup(vec![
        card("mid", "2028-01", 200),
        card("oldest", "2026-01", 100),
        card("newest", "2030-01", 300),
    ]);
    assert_eq!(stats.records_removed, 2);
    assert_eq!(out[0].credit_card().unwrap().expiry, "2030-01");
    assert_eq!(out[0].header.id, "newest");
    assert_eq!(out[0].header.created_at.timestamp(), 1_600_000_000);
}

#[test]
fn test_tie_keeps_accumulator_authoritative() {
    let (out, _) = dedup(vec![card("first", "2028-01", 100), card("second", "2030-01", 100)]);
    assert_eq!(out[0].header.id, "first");
    assert_eq!(out[0].credit_card().unwrap().expiry, "2028-01");
}

#[test]
fn test_merge_union_is_order_independent() {
    let a = || {
        let urls = ["https://a.com/", "https://shared.com/"];
        login_with_passkeys("a", "Example", "pw1", &urls, &["k1", "k2"], 10)
    };
    let b = || {
        let urls = ["https://shared.com/", "https://b.com/"];
        login_with_passkeys("b", "Example", "pw1", &urls, &["k2", "k3"], 20)
    };

    let (ab, _) = dedup(vec![a(), b()]);
    let (ba, _) = dedup(vec![b(), a()]);

    let set = |r: &Record| -> BTreeSet<String> { r.login().unwrap().urls.iter().cloned().collect() };
    assert_eq!(set(&ab[0]), set(&ba[0]));
    assert_eq!(set(&ab[0]).len(), 3);

    let key_ids = |r: &Record| -> BTreeSet<String> {
        r.login().unwrap().passkeys.iter().filter_map(|p| p.key_id.clone()).collect()
    };
    assert_eq!(key_ids(&ab[0]), key_ids(&ba[0]));
    assert_eq!(key_ids(&ab[0]), BTreeSet::from(["k1".to_string(), "k2".to_string(), "k3".to_string()]));

    for merged in [&ab[0], &ba[0]] {
        let external = merged.to_external();
        let written: Vec<&str> = external["data"]["content"]["passkeys"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["keyId"].as_str().unwrap())
            .collect();
        let unique: BTreeSet<&str> = written.iter().copied().collect();
        assert_eq!(written.len(), unique.len());
        assert_eq!(written.len(), 3);
        // The shared key comes from the newer record.
        let shared = external["data"]["content"]["passkeys"]
            .as_array()
            .unwrap()
            .iter()
            .find(|p| p["keyId"] == json!("k2"))
            .cloned()
            .unwrap();
        assert_eq!(shared["content"], json!("k2-b"));
    }
    // The newer operand is self in both orders, so scalar fields agree too.
    assert_eq!(ab[0].header.id, "b");
    assert_eq!(ba[0].header.id, "b");
}

#[test]
fn test_scalar_tie_break_depends_on_self() {
    let mut newer = login("newer", "Example", "pw1", &[], 20);
    let mut older = login("older", "Example", "pw1", &[], 10);
    if let crate::record::RecordKind::Login(fields) = &mut newer.kind {
        fields.totp_uri = "otpauth://totp/newer".to_string();
    }
    if let crate::record::RecordKind::Login(fields) = &mut older.kind {
        fields.totp_uri = "otpauth://totp/older".to_string();
    }

    let merged = newer.clone().merge_with(older.clone()).unwrap();
    assert_eq!(merged.login().unwrap().totp_uri, "otpauth://totp/newer");

    // Called the other way round, the older operand is self and wins.
    let merged = older.merge_with(newer).unwrap();
    assert_eq!(merged.login().unwrap().totp_uri, "otpauth://totp/older");
}

#[test]
fn test_password_change_is_not_merged() {
    let (out, stats) = dedup(vec![
        login("a", "Example", "old-password", &[], 1),
        login("b", "Example", "new-password", &[], 2),
    ]);
    assert_eq!(out.len(), 2);
    assert_eq!(stats.duplicate_groups, 0);
}

#[test]
fn test_deduplicate_is_idempotent() {
    let records = vec![
        login("a", "Example", "pw1", &["https://a.com/"], 1),
        login("b", "Example", "pw1", &["https://b.com/"], 2),
        card("c", "2027-01", 1),
        alias("x"),
    ];
    let (once, _) = dedup(records);
    let (twice, stats) = dedup(once.clone());
    assert_eq!(once, twice);
    assert_eq!(stats.duplicate_groups, 0);
    assert_eq!(stats.records_in, stats.records_out);
}

#[test]
fn test_observer_sees_each_group() {
    let mut events: Vec<(String, usize)> = Vec::new();
    let mut observer = |event: &DuplicateEvent<'_>| {
        events.push((event.key.to_string(), event.count));
    };
    let records = vec![
        login("a", "Example", "pw1", &[], 1),
        login("b", "Example", "pw1", &[], 2),
        login("c", "Example", "pw1", &[], 3),
        card("d", "2027-01", 1),
    ];
    deduplicate_records("Personal", records, &mut observer).unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].1, 3);
    assert!(events[0].0.contains("Example"));
}

#[test]
fn test_merged_output_serializes_union() {
    let (out, _) = dedup(vec![
        login("a", "Example", "pw1", &["https://a.com/"], 1),
        login("b", "Example", "pw1", &["https://b.com/"], 2),
    ]);
    let external = out[0].to_external();
    assert_eq!(
        external["data"]["content"]["urls"],
        json!(["https://b.com/", "https://a.com/"])
    );
    assert_eq!(external["modifyTime"], Value::from(2));
}
