use std::fs;
use std::path::{Path, PathBuf};

use weft_core::{ContentKind, Error, Namespace, SchemaError};

fn demo_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("demos")
        .join("shop")
}

fn temp_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "weft_core_{label}_{}_{}",
        std::process::id(),
        line!()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

#[test]
fn loads_demo_namespace() {
    let namespace = Namespace::from_dir(&demo_dir()).expect("load demo namespace");
    assert_eq!(
        namespace.names().collect::<Vec<_>>(),
        ["orders", "reviews", "users"]
    );
    let users = namespace.get("users").expect("users");
    let ContentKind::Array(array) = &users.kind else {
        panic!("users should be an array");
    };
    assert!(matches!(array.content.kind, ContentKind::Object(_)));
}

#[test]
fn ignores_non_json_files() {
    let dir = temp_dir("ignore");
    fs::write(dir.join("notes.txt"), "not a collection").expect("write");
    fs::write(dir.join("items.json"), r#"{"type": "object", "n": 1}"#).expect("write");
    let namespace = Namespace::from_dir(&dir).expect("load");
    assert_eq!(namespace.len(), 1);
    fs::remove_dir_all(&dir).expect("cleanup");
}

#[test]
fn reports_the_failing_collection() {
    let dir = temp_dir("broken");
    fs::write(dir.join("broken.json"), "{\"type\": ").expect("write");
    let err = Namespace::from_dir(&dir).expect_err("malformed json");
    assert!(matches!(err, Error::Json { ref collection, .. } if collection == "broken"));
    fs::remove_dir_all(&dir).expect("cleanup");
}

#[test]
fn rejects_scalar_roots() {
    let dir = temp_dir("scalar");
    fs::write(dir.join("flag.json"), r#"{"type": "bool", "constant": true}"#).expect("write");
    let err = Namespace::from_dir(&dir).expect_err("scalar root");
    assert!(matches!(err, Error::Schema(SchemaError::Invalid { .. })));
    fs::remove_dir_all(&dir).expect("cleanup");
}

#[test]
fn missing_directories_are_io_errors() {
    let err = Namespace::from_dir(Path::new("/definitely/not/a/weft/namespace"))
        .expect_err("missing dir");
    assert!(matches!(err, Error::Io { .. }));
}
