//! Tests for INSERT, UPDATE, DELETE, REPLACE and EXPLAIN.

mod common;
use common::*;

use oxide_dialect::ast::{
    col, lit, param, qualified, DeleteOp, ExplainOp, InsertOp, InsertSource, Operation, ReplaceOp,
    TableDef, UpdateOp,
};
use oxide_dialect::{DialectError, DialectKind, SqlValue};

fn explain(statement: impl Into<Operation>, analyze: bool) -> ExplainOp {
    ExplainOp {
        analyze,
        options: None,
        statement: Box::new(statement.into()),
    }
}

// ===================================================================
// DELETE
// ===================================================================

#[test]
fn generic_delete_with_parameter() {
    let d = dialect(DialectKind::Generic);
    let stmt = compile_one(&d, DeleteOp::new("t").filter(col("id").eq(param(1))));
    assert_eq!(stmt.sql, "DELETE FROM t WHERE id=?");
    assert_eq!(stmt.params, vec![SqlValue::Int(1)]);
}

#[test]
fn generic_delete_rejects_limit() {
    let d = dialect(DialectKind::Generic);
    let err = compile_err(&d, DeleteOp::new("t").limit(5));
    assert_eq!(err.unsupported_feature(), Some("DELETE LIMIT"));
    assert!(matches!(
        err,
        DialectError::UnsupportedByDialect {
            dialect: "generic",
            ..
        }
    ));
}

#[test]
fn delete_limit_per_vendor() {
    let op = DeleteOp::new("t")
        .filter(col("a").eq(lit(1)).or(col("b").eq(lit(2))))
        .limit(10);
    assert_eq!(
        compile_sql(&dialect(DialectKind::MySql), op.clone()),
        "DELETE FROM t WHERE a=1 OR b=2 LIMIT 10"
    );
    assert_eq!(
        compile_sql(&dialect(DialectKind::SqlServer), op.clone()),
        "DELETE TOP(10) FROM t WHERE a=1 OR b=2"
    );
    assert_eq!(
        compile_sql(&dialect(DialectKind::Oracle), op.clone()),
        "DELETE FROM t WHERE (a=1 OR b=2) AND ROWNUM <= 10"
    );
    assert!(dialect(DialectKind::PostgreSql).compile(&op.into()).is_err());
}

// ===================================================================
// INSERT
// ===================================================================

#[test]
fn insert_mixes_parameters_and_literals() {
    let d = dialect(DialectKind::Generic);
    let op = InsertOp::values(
        TableDef::new("t"),
        vec![("a", param(1)), ("b", lit("it's"))],
    );
    let stmt = compile_one(&d, op);
    assert_eq!(stmt.sql, "INSERT INTO t (a,b) VALUES (?,'it''s')");
    assert_eq!(stmt.params.len(), 1);
}

#[test]
fn insert_ignore_per_vendor() {
    let op = InsertOp::values(TableDef::new("t"), vec![("a", param(1))]).ignore();
    assert_eq!(
        compile_sql(&dialect(DialectKind::MySql), op.clone()),
        "INSERT IGNORE INTO t (a) VALUES (?)"
    );
    assert_eq!(
        compile_sql(&dialect(DialectKind::Sqlite), op.clone()),
        "INSERT OR IGNORE INTO t (a) VALUES (?)"
    );
    assert_eq!(
        compile_sql(&dialect(DialectKind::PostgreSql), op.clone()),
        "INSERT INTO t (a) VALUES ($1) ON CONFLICT DO NOTHING"
    );
    let err = compile_err(&dialect(DialectKind::Generic), op);
    assert_eq!(err.unsupported_feature(), Some("INSERT IGNORE"));
}

#[test]
fn insert_without_columns() {
    let op = InsertOp::values(TableDef::new("t"), Vec::new());
    assert_eq!(
        compile_sql(&dialect(DialectKind::Generic), op.clone()),
        "INSERT INTO t DEFAULT VALUES"
    );
    assert_eq!(
        compile_sql(&dialect(DialectKind::MySql), op),
        "INSERT INTO t () VALUES ()"
    );
}

#[test]
fn insert_from_select() {
    let d = dialect(DialectKind::PostgreSql);
    let op = InsertOp::select(TableDef::new("archive"), &["id", "name"], "SELECT id,name FROM t");
    assert_eq!(
        compile_sql(&d, op),
        "INSERT INTO archive (id,name) SELECT id,name FROM t"
    );
}

// ===================================================================
// UPDATE
// ===================================================================

fn joined_update() -> UpdateOp {
    UpdateOp::new("t")
        .set("a", qualified("s", "a"))
        .join("s", qualified("t", "id").eq(qualified("s", "id")))
}

#[test]
fn joined_update_per_vendor() {
    assert_eq!(
        compile_sql(&dialect(DialectKind::PostgreSql), joined_update()),
        "UPDATE t SET a=s.a FROM s WHERE t.id=s.id"
    );
    assert_eq!(
        compile_sql(&dialect(DialectKind::MySql), joined_update()),
        "UPDATE t INNER JOIN s ON t.id=s.id SET t.a=s.a"
    );
    assert_eq!(
        compile_sql(&dialect(DialectKind::Generic), joined_update()),
        "MERGE INTO t USING s ON (t.id=s.id) WHEN MATCHED THEN UPDATE SET a=s.a"
    );
}

#[test]
fn joined_update_rejects_limit_where_unsupported() {
    let err = compile_err(&dialect(DialectKind::PostgreSql), joined_update().limit(1));
    assert_eq!(err.unsupported_feature(), Some("UPDATE with a join and LIMIT"));
}

#[test]
fn update_without_assignments_is_invalid() {
    let err = compile_err(&dialect(DialectKind::Sqlite), UpdateOp::new("t"));
    assert!(matches!(err, DialectError::InvalidConfiguration(_)));
}

#[test]
fn update_limit_per_vendor() {
    let op = UpdateOp::new("t").set("a", lit(1)).limit(3);
    assert_eq!(
        compile_sql(&dialect(DialectKind::Oracle), op.clone()),
        "UPDATE t SET a=1 WHERE ROWNUM <= 3"
    );
    assert_eq!(
        compile_sql(&dialect(DialectKind::H2), op.clone()),
        "UPDATE t SET a=1 LIMIT 3"
    );
    let err = compile_err(&dialect(DialectKind::Sqlite), op);
    assert_eq!(err.unsupported_feature(), Some("UPDATE LIMIT"));
}

// ===================================================================
// REPLACE
// ===================================================================

#[test]
fn replace_only_where_supported() {
    let op = ReplaceOp {
        table: String::from("t"),
        source: InsertSource::Values(vec![(String::from("id"), param(1))]),
    };
    assert_eq!(
        compile_sql(&dialect(DialectKind::Sqlite), op.clone()),
        "REPLACE INTO t (id) VALUES (?)"
    );
    let err = compile_err(&dialect(DialectKind::PostgreSql), op);
    assert_eq!(err.unsupported_feature(), Some("REPLACE"));
}

// ===================================================================
// EXPLAIN
// ===================================================================

#[test]
fn explain_prefixes() {
    let delete = || DeleteOp::new("t");
    assert_eq!(
        compile_sql(&dialect(DialectKind::PostgreSql), explain(delete(), false)),
        "EXPLAIN DELETE FROM t"
    );
    assert_eq!(
        compile_sql(&dialect(DialectKind::Sqlite), explain(delete(), false)),
        "EXPLAIN QUERY PLAN DELETE FROM t"
    );
    assert_eq!(
        compile_sql(&dialect(DialectKind::Oracle), explain(delete(), false)),
        "EXPLAIN PLAN FOR DELETE FROM t"
    );
    let err = compile_err(&dialect(DialectKind::Oracle), explain(delete(), true));
    assert_eq!(err.unsupported_feature(), Some("EXPLAIN ANALYZE"));
    let err = compile_err(&dialect(DialectKind::SqlServer), explain(delete(), false));
    assert_eq!(err.unsupported_feature(), Some("EXPLAIN"));
}

#[test]
fn explain_keeps_inner_parameters() {
    let d = dialect(DialectKind::PostgreSql);
    let inner = DeleteOp::new("t").filter(col("id").eq(param(7)));
    let stmt = compile_one(&d, explain(inner, true));
    assert_eq!(stmt.sql, "EXPLAIN (ANALYZE TRUE) DELETE FROM t WHERE id=$1");
    assert_eq!(stmt.params, vec![SqlValue::Int(7)]);
}
