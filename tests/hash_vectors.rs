//! Canonical Hash Conformance Vectors
//!
//! The canonical serialization (sorted keys, no whitespace, arrays in
//! given order, UTF-8 bytes) is the compatibility surface every remote
//! store and reimplementation must reproduce bit-exactly. These vectors
//! pin it. Do not regenerate them to make a failing build pass.

use serde_json::{json, Value};
use uuid::Uuid;

use strata_schemas::{
    canonical_json, Column, ContentHash, Engine, SchemaSnapshot, Table,
};
use strata_schemas::table::{ColumnConstraints, Constraint, PrimaryKey};

fn users_table() -> Table {
    Table {
        id: 1,
        name: "users".to_string(),
        description: None,
        columns: vec![
            Column {
                id: 1,
                name: "id".to_string(),
                column_type: "serial".to_string(),
                constraints: Some(ColumnConstraints {
                    nullable: Some(false),
                }),
            },
            Column {
                id: 2,
                name: "email".to_string(),
                column_type: "text".to_string(),
                constraints: None,
            },
        ],
        constraints: vec![Constraint::PrimaryKey(PrimaryKey {
            id: 1,
            name: "pk_users".to_string(),
            columns: vec!["id".to_string()],
        })],
    }
}

// =============================================================================
// Canonical Serialization Vectors
// =============================================================================

#[test]
fn vector_sorted_keys_no_whitespace() {
    let value: Value = serde_json::from_str(
        r#"{ "b": -7, "a": [true, null, 3.5] }"#,
    )
    .unwrap();
    assert_eq!(canonical_json(&value).unwrap(), r#"{"a":[true,null,3.5],"b":-7}"#);
    assert_eq!(
        ContentHash::compute(&value).unwrap().as_str(),
        "sha256:aafec5e30d81ae8e74011bc4ac786aa027dbd3ace38a87199a840559a1ad3175"
    );
}

#[test]
fn vector_string_escaping_and_unicode() {
    let value = json!({"unicode": "é", "note": "line\nbreak"});
    // Control characters escape, non-ASCII stays raw UTF-8.
    assert_eq!(
        canonical_json(&value).unwrap(),
        "{\"note\":\"line\\nbreak\",\"unicode\":\"é\"}"
    );
    assert_eq!(
        ContentHash::compute(&value).unwrap().as_str(),
        "sha256:8e843cefa866bbba767a753e05df3ccbc1127bf91712e034f291c45d43ff19b3"
    );
}

#[test]
fn vector_array_order_is_semantic() {
    let ab = json!({"tables": ["a", "b"]});
    let ba = json!({"tables": ["b", "a"]});
    assert_ne!(
        ContentHash::compute(&ab).unwrap(),
        ContentHash::compute(&ba).unwrap()
    );
}

// =============================================================================
// Snapshot Projection Vectors
// =============================================================================

#[test]
fn vector_empty_snapshot() {
    let snapshot = SchemaSnapshot::draft(Uuid::new_v4(), "empty", Engine::Postgresql, "v15.0");
    assert_eq!(
        snapshot.compute_hash().unwrap().as_str(),
        "sha256:a32d7527928f1bffa95d2500056c2930829264adb97367da46696656ed340464"
    );
}

#[test]
fn vector_described_snapshot() {
    let snapshot = SchemaSnapshot::draft(Uuid::new_v4(), "core", Engine::Postgresql, "v15.0")
        .with_description("core banking schema")
        .unwrap();
    assert_eq!(
        snapshot.compute_hash().unwrap().as_str(),
        "sha256:b06d41c08bde59242544b65db5ea9862f5deea4c89f44657b7c4f73ed0be3a2d"
    );
}

#[test]
fn vector_populated_snapshot() {
    let snapshot = SchemaSnapshot::draft(Uuid::new_v4(), "users", Engine::Postgresql, "v15.0")
        .with_tables(vec![users_table()])
        .unwrap();
    assert_eq!(
        snapshot.compute_hash().unwrap().as_str(),
        "sha256:6b44450ab84ca3e09567cc8d3ca0f91f073a5d3f1802ee505fbe9e814c46de90"
    );

    // Finalize computes the same identity and pins it on the snapshot.
    let done = snapshot.finalize().unwrap();
    assert_eq!(
        done.content_hash.as_ref().unwrap().as_str(),
        "sha256:6b44450ab84ca3e09567cc8d3ca0f91f073a5d3f1802ee505fbe9e814c46de90"
    );
    assert!(done.verify_hash().unwrap());
}

// =============================================================================
// Hash Properties
// =============================================================================

#[test]
fn hash_is_repeatable() {
    let snapshot = SchemaSnapshot::draft(Uuid::new_v4(), "s", Engine::Postgresql, "v16.0")
        .with_tables(vec![users_table()])
        .unwrap();
    assert_eq!(snapshot.compute_hash().unwrap(), snapshot.compute_hash().unwrap());
}

#[test]
fn hash_survives_key_permutation() {
    // Same logical object, keys deliberately scrambled.
    let a: Value = serde_json::from_str(
        r#"{"engineKey":"postgresql:v15.0","tables":[{"id":1,"name":"users","columns":[]}]}"#,
    )
    .unwrap();
    let b: Value = serde_json::from_str(
        r#"{"tables":[{"columns":[],"name":"users","id":1}],"engineKey":"postgresql:v15.0"}"#,
    )
    .unwrap();
    assert_eq!(canonical_json(&a).unwrap(), canonical_json(&b).unwrap());
    assert_eq!(
        ContentHash::compute(&a).unwrap(),
        ContentHash::compute(&b).unwrap()
    );
}

#[test]
fn projected_fields_never_serialize_as_null() {
    // description: None and data: None must vanish from the projection
    // rather than appear as null, so presence/absence can never collide.
    let empty = SchemaSnapshot::draft(Uuid::new_v4(), "s", Engine::Postgresql, "v15.0");
    let described = empty.clone().with_description("x").unwrap();
    let populated = empty.clone().with_tables(vec![]).unwrap();

    let hashes: std::collections::HashSet<_> = [
        empty.compute_hash().unwrap(),
        described.compute_hash().unwrap(),
        populated.compute_hash().unwrap(),
    ]
    .into_iter()
    .collect();
    assert_eq!(hashes.len(), 3, "all three projection shapes must hash apart");
}
