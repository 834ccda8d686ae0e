//! Tests for configuration files, the registry and JSON operations.

mod common;
use common::*;

use std::io::Write;

use oxide_dialect::ast::{Index, Operation};
use oxide_dialect::dialect::dialect_name_from_url;
use oxide_dialect::{DialectConfig, DialectError, DialectKind, DialectRegistry, SqlValue};

fn write_temp(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn config_file_drives_resolved_dialect() {
    let file = write_temp(r#"{"prepared": false, "identifier_length_limit": 10}"#);
    let config = DialectConfig::from_path(file.path()).unwrap();
    let d = DialectRegistry::new().resolve("pg", config).unwrap();
    assert_eq!(d.kind(), DialectKind::PostgreSql);

    let index = Index::new("orders", &["user_id"]);
    assert_eq!(
        compile_sql(&d, Operation::CreateIndex(index)),
        "CREATE INDEX orders_use ON orders (user_id)"
    );
}

#[test]
fn zero_length_limit_is_rejected() {
    let config = DialectConfig::from_json_str(r#"{"identifier_length_limit": 0}"#).unwrap();
    let err = DialectRegistry::new().resolve("h2", config).unwrap_err();
    assert!(matches!(err, DialectError::InvalidConfiguration(_)));
}

#[test]
fn missing_config_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = DialectConfig::from_path(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, DialectError::Io(_)));
}

#[test]
fn operations_deserialize_from_json() {
    let file = write_temp(
        r#"{"delete": {"table": "t", "filter": {"binary": {"op": "eq",
            "left": {"column": {"name": "id"}}, "right": {"param": {"int": 4}}}}}}"#,
    );
    let json = std::fs::read_to_string(file.path()).unwrap();
    let op: Operation = serde_json::from_str(&json).unwrap();
    let stmt = compile_one(&dialect(DialectKind::Oracle), op);
    assert_eq!(stmt.sql, "DELETE FROM t WHERE id=?");
    assert_eq!(stmt.params, vec![SqlValue::Int(4)]);
}

#[test]
fn registry_and_urls_agree() {
    let registry = DialectRegistry::new();
    for url in [
        "jdbc:postgresql://db/app",
        "mysql://root@localhost/app",
        "jdbc:sqlserver://db;databaseName=app",
        "jdbc:h2:mem:test",
    ] {
        let name = dialect_name_from_url(url).unwrap();
        let kind = registry.kind(name).unwrap();
        assert_eq!(kind.name(), name);
    }
    assert!(matches!(
        registry.kind("informix"),
        Err(DialectError::UnknownDialect(_))
    ));
}
