use serde_json::json;

use weft_core::{Namespace, SchemaError, Value};
use weft_generate::{
    CompileOptions, GenerateOptions, GenerationEngine, GenerationError, SamplingError, Sampler,
    compile,
};

fn namespace(documents: Vec<(&str, serde_json::Value)>) -> Namespace {
    Namespace::from_documents(documents).expect("namespace")
}

fn compile_error(documents: Vec<(&str, serde_json::Value)>) -> SchemaError {
    compile(&namespace(documents), &CompileOptions::default()).expect_err("compile should fail")
}

fn users_and_orders(orders: u64) -> Namespace {
    namespace(vec![
        (
            "users",
            json!({
                "type": "array",
                "length": 2,
                "content": {
                    "type": "object",
                    "user_id": {"type": "number", "id": {"start_at": 0}},
                    "name": {"type": "string", "faker": {"generator": "name"}}
                }
            }),
        ),
        (
            "orders",
            json!({
                "type": "array",
                "length": orders,
                "content": {
                    "type": "object",
                    "order_id": {"type": "number", "id": {}},
                    "user_id": "@users.user_id"
                }
            }),
        ),
    ])
}

#[test]
fn foreign_keys_point_at_generated_rows() {
    let engine = GenerationEngine::new(GenerateOptions {
        size: 1,
        seed: Some(0),
        ..GenerateOptions::default()
    });
    let namespace = namespace(vec![
        (
            "users",
            json!({
                "type": "array",
                "length": 1,
                "content": {
                    "type": "object",
                    "user_id": {"type": "number", "id": {"start_at": 0}}
                }
            }),
        ),
        (
            "orders",
            json!({
                "type": "array",
                "length": 1,
                "content": {"type": "object", "user_id": "@users.user_id"}
            }),
        ),
    ]);
    let result = engine.run(&namespace).expect("run");
    let users = result.samples.rows("users").expect("users");
    let orders = result.samples.rows("orders").expect("orders");
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].get("user_id").and_then(Value::as_i128), Some(0));
    assert_eq!(orders, users);
}

#[test]
fn cross_collection_copies_replay_the_target_rows() {
    let compiled = compile(&users_and_orders(5), &CompileOptions::default()).expect("compile");
    let mut sampler = Sampler::new(compiled, 4);
    for _ in 0..10 {
        let pass = sampler.next_pass().expect("pass");
        let lookup = |name: &str| {
            pass.iter()
                .find(|(collection, _)| collection == name)
                .map(|(_, value)| value.clone())
                .expect("collection")
        };
        let user_ids: Vec<Value> = lookup("users")
            .as_array()
            .expect("users array")
            .iter()
            .map(|user| user.get("user_id").cloned().expect("user_id"))
            .collect();
        let order_user_ids: Vec<Value> = lookup("orders")
            .as_array()
            .expect("orders array")
            .iter()
            .map(|order| order.get("user_id").cloned().expect("user_id"))
            .collect();
        let expected: Vec<Value> = user_ids.iter().cycle().take(5).cloned().collect();
        assert_eq!(order_user_ids, expected);
    }
}

#[test]
fn insertion_order_puts_targets_first() {
    let namespace = namespace(vec![
        ("a_orders", json!({"type": "object", "owner": "@z_users.id"})),
        (
            "z_users",
            json!({"type": "object", "id": {"type": "number", "id": {}}}),
        ),
    ]);
    let compiled = compile(&namespace, &CompileOptions::default()).expect("compile");
    assert_eq!(compiled.insertion_order(), ["z_users", "a_orders"]);
    assert_eq!(
        compiled.collections().collect::<Vec<_>>(),
        ["a_orders", "z_users"]
    );
}

#[test]
fn mutual_references_are_cycles() {
    let err = compile_error(vec![
        ("a", json!({"type": "object", "ref": "@b.ref"})),
        ("b", json!({"type": "object", "ref": "@a.ref"})),
    ]);
    assert!(err.is_cyclic(), "{err}");
}

#[test]
fn collections_depending_on_each_other_are_cycles() {
    let err = compile_error(vec![
        ("a", json!({"type": "object", "x": 1, "from_b": "@b.y"})),
        ("b", json!({"type": "object", "y": 2, "from_a": "@a.x"})),
    ]);
    assert!(err.is_cyclic(), "{err}");
}

#[test]
fn copying_an_ancestor_is_a_cycle() {
    let err = compile_error(vec![(
        "nested",
        json!({"type": "object", "inner": {"type": "object", "me": "@nested.inner"}}),
    )]);
    assert!(err.is_cyclic(), "{err}");
}

#[test]
fn unknown_targets_are_reported() {
    let err = compile_error(vec![(
        "orders",
        json!({"type": "object", "user_id": "@users.user_id"}),
    )]);
    assert!(matches!(
        err,
        SchemaError::UnresolvedReference { ref target, .. } if target == "users.user_id"
    ));
}

#[test]
fn references_cannot_cross_variants() {
    let err = compile_error(vec![(
        "choice",
        json!({
            "type": "object",
            "pick": {
                "type": "one_of",
                "variants": [{"type": "number", "constant": 1}, "@choice.pick.0"]
            }
        }),
    )]);
    assert!(matches!(err, SchemaError::Invalid { .. }), "{err}");
}

#[test]
fn array_lengths_can_follow_sibling_fields() {
    let namespace = namespace(vec![(
        "baskets",
        json!({
            "type": "object",
            "count": {"type": "number", "range": {"low": 0, "high": 4}},
            "items": {"type": "array", "length": "@baskets.count", "content": "apple"}
        }),
    )]);
    let compiled = compile(&namespace, &CompileOptions::default()).expect("compile");
    let mut sampler = Sampler::new(compiled, 11);
    for _ in 0..50 {
        let basket = sampler
            .next_value("baskets")
            .expect("pass")
            .expect("baskets");
        let count = basket.get("count").and_then(Value::as_i128).expect("count");
        let items = basket.get("items").and_then(Value::as_array).expect("items");
        assert_eq!(items.len() as i128, count);
    }
}

#[test]
fn lengths_cannot_copy_their_own_content() {
    let err = compile_error(vec![(
        "loop",
        json!({"type": "array", "length": "@loop.content", "content": 1}),
    )]);
    assert!(matches!(err, SchemaError::Invalid { .. }), "{err}");
}

#[test]
fn skipped_optional_targets_copy_null() {
    let namespace = namespace(vec![(
        "profile",
        json!({
            "type": "object",
            "address": {
                "type": "object",
                "null_rate": 1.0,
                "city": "Lisbon"
            },
            "city": "@profile.address.city"
        }),
    )]);
    let compiled = compile(&namespace, &CompileOptions::default()).expect("compile");
    let mut sampler = Sampler::new(compiled, 0);
    let profile = sampler.next_value("profile").expect("pass").expect("profile");
    assert_eq!(profile.get("address"), Some(&Value::Null));
    assert_eq!(profile.get("city"), Some(&Value::Null));
}

#[test]
fn empty_target_arrays_fail_the_pass() {
    let namespace = namespace(vec![
        (
            "users",
            json!({
                "type": "array",
                "length": 0,
                "content": {"type": "object", "user_id": {"type": "number", "id": {}}}
            }),
        ),
        (
            "orders",
            json!({
                "type": "array",
                "length": 1,
                "content": {"type": "object", "user_id": "@users.user_id"}
            }),
        ),
    ]);
    let engine = GenerationEngine::new(GenerateOptions {
        seed: Some(1),
        ..GenerateOptions::default()
    });
    let err = engine.run(&namespace).expect_err("empty target");
    assert!(matches!(
        err,
        GenerationError::Sampling(SamplingError::EmptyReference { .. })
    ));
}

#[test]
fn reference_report_lists_copy_edges() {
    let compiled = compile(&users_and_orders(1), &CompileOptions::default()).expect("compile");
    let report = compiled.reference_report();
    assert!(report.cycle.is_none());
    assert_eq!(
        report.topo_order.as_deref(),
        Some(
            [
                "users.content.user_id".to_string(),
                "orders.content.user_id".to_string()
            ]
            .as_slice()
        )
    );
}

#[test]
fn rejected_unique_values_are_not_copied() {
    let namespace = namespace(vec![
        (
            "users",
            json!({
                "type": "array",
                "length": 2,
                "content": {
                    "type": "object",
                    "unique": true,
                    "code": {"type": "string", "categorical": {"a": 1, "b": 1}}
                }
            }),
        ),
        (
            "orders",
            json!({
                "type": "array",
                "length": 2,
                "content": {"type": "object", "code": "@users.code"}
            }),
        ),
    ]);
    for seed in 0..20 {
        let compiled = compile(&namespace, &CompileOptions::default()).expect("compile");
        let mut sampler = Sampler::new(compiled, seed);
        let pass = sampler.next_pass().expect("pass");
        let codes = |name: &str| -> Vec<Value> {
            pass.iter()
                .find(|(collection, _)| collection == name)
                .and_then(|(_, value)| value.as_array())
                .expect("collection array")
                .iter()
                .map(|row| row.get("code").cloned().expect("code"))
                .collect()
        };
        assert_eq!(codes("orders"), codes("users"), "seed {seed}");
    }
}
