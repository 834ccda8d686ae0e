//! Tests for insert-or-update across dialects.

mod common;
use common::*;

use oxide_dialect::ast::{
    col, excluded, lit, param, qualified, raw, ColumnDef, DataType, InsertOp, TableDef, UpsertOp,
};
use oxide_dialect::{DatabaseVersion, Dialect, DialectConfig, DialectError, DialectKind, SqlValue};
use uuid::Uuid;

fn users_upsert() -> UpsertOp {
    UpsertOp::new(
        users_by_email(),
        vec![("email", param("a@x.io")), ("name", param("Ann"))],
    )
}

fn keyed_table() -> TableDef {
    TableDef::new("t")
        .column(ColumnDef::new("id", DataType::Integer))
        .column(ColumnDef::new("name", DataType::Varchar(20)))
        .primary_key(&["id"])
}

// ===================================================================
// ON CONFLICT
// ===================================================================

#[test]
fn postgres_inline_upsert() {
    let d = inline(DialectKind::PostgreSql);
    let op = UpsertOp::new(keyed_table(), vec![("id", param(1)), ("name", param("a"))]);
    let stmt = compile_one(&d, op);
    assert_eq!(
        stmt.sql,
        "INSERT INTO t (id,name) VALUES (1,'a') ON CONFLICT (id) DO UPDATE SET name=EXCLUDED.name"
    );
    assert!(stmt.params.is_empty());
}

#[test]
fn postgres_prepared_upsert_numbers_placeholders() {
    let d = dialect(DialectKind::PostgreSql);
    let stmt = compile_one(&d, users_upsert());
    assert_eq!(
        stmt.sql,
        "INSERT INTO users (email,name) VALUES ($1,$2) ON CONFLICT (email) DO UPDATE SET name=EXCLUDED.name"
    );
    assert_eq!(
        stmt.params,
        vec![
            SqlValue::Text(String::from("a@x.io")),
            SqlValue::Text(String::from("Ann"))
        ]
    );
}

#[test]
fn sqlite_upsert_with_filter() {
    let d = dialect(DialectKind::Sqlite);
    let op = users_upsert().filter(qualified("users", "name").is_null());
    assert_eq!(
        compile_sql(&d, op),
        "INSERT INTO users (email,name) VALUES (?,?) ON CONFLICT (email) \
         DO UPDATE SET name=EXCLUDED.name WHERE users.name IS NULL"
    );
}

// ===================================================================
// MERGE
// ===================================================================

#[test]
fn sqlserver_upsert_on_unique_index_only_table() {
    let d = dialect(DialectKind::SqlServer);
    let stmt = compile_one(&d, users_upsert());
    assert_eq!(
        stmt.sql,
        "MERGE INTO users T USING (VALUES (?,?)) S(email,name) ON (T.email=S.email) \
         WHEN MATCHED THEN UPDATE SET name=S.name \
         WHEN NOT MATCHED THEN INSERT (email,name) VALUES (S.email,S.name);"
    );
    assert_eq!(stmt.params.len(), 2);
}

#[test]
fn generic_upsert_is_unterminated_merge() {
    let d = dialect(DialectKind::Generic);
    let sql = compile_sql(&d, users_upsert());
    assert!(sql.starts_with("MERGE INTO users T USING (VALUES (?,?)) S(email,name)"));
    assert!(sql.ends_with("VALUES (S.email,S.name)"));
}

#[test]
fn oracle_upsert_selects_from_dual() {
    let d = dialect(DialectKind::Oracle);
    assert_eq!(
        compile_sql(&d, users_upsert()),
        "MERGE INTO users T USING (SELECT ? email,? name FROM DUAL) S ON (T.email=S.email) \
         WHEN MATCHED THEN UPDATE SET name=S.name \
         WHEN NOT MATCHED THEN INSERT (email,name) VALUES (S.email,S.name)"
    );
}

fn counters() -> TableDef {
    TableDef::new("counters")
        .column(ColumnDef::new("name", DataType::Varchar(50)))
        .column(ColumnDef::new("hits", DataType::Integer))
        .primary_key(&["name"])
}

fn counter_upsert() -> UpsertOp {
    UpsertOp::new(counters(), vec![("name", param("home")), ("hits", param(1))])
        .on_update(vec![("hits", qualified("counters", "hits").plus(excluded("hits")))])
}

#[test]
fn merge_update_reads_the_target_through_its_alias() {
    let d = dialect(DialectKind::SqlServer);
    assert_eq!(
        compile_sql(&d, counter_upsert()),
        "MERGE INTO counters T USING (VALUES (?,?)) S(name,hits) ON (T.name=S.name) \
         WHEN MATCHED THEN UPDATE SET hits=T.hits+S.hits \
         WHEN NOT MATCHED THEN INSERT (name,hits) VALUES (S.name,S.hits);"
    );

    let d = dialect(DialectKind::Oracle);
    assert_eq!(
        compile_sql(&d, counter_upsert()),
        "MERGE INTO counters T USING (SELECT ? name,? hits FROM DUAL) S ON (T.name=S.name) \
         WHEN MATCHED THEN UPDATE SET hits=T.hits+S.hits \
         WHEN NOT MATCHED THEN INSERT (name,hits) VALUES (S.name,S.hits)"
    );
}

#[test]
fn merge_filter_reads_the_target_through_its_alias() {
    let d = dialect(DialectKind::Generic);
    let op = UpsertOp::new(counters(), vec![("name", param("home")), ("hits", param(1))])
        .on_update(vec![("hits", col("hits").plus(excluded("hits")))])
        .filter(col("hits").lt(lit(100)));
    assert_eq!(
        compile_sql(&d, op),
        "MERGE INTO counters T USING (VALUES (?,?)) S(name,hits) ON (T.name=S.name) \
         WHEN MATCHED AND T.hits<100 THEN UPDATE SET hits=T.hits+S.hits \
         WHEN NOT MATCHED THEN INSERT (name,hits) VALUES (S.name,S.hits)"
    );

    let d = dialect(DialectKind::Oracle);
    let op = counter_upsert().filter(qualified("counters", "hits").lt(lit(100)));
    assert!(compile_sql(&d, op).contains("UPDATE SET hits=T.hits+S.hits WHERE T.hits<100 "));
}

#[test]
fn merge_requires_keys_among_data_columns() {
    let d = dialect(DialectKind::SqlServer);
    let op = UpsertOp::new(users_by_email(), vec![("name", param("Ann"))]);
    let err = compile_err(&d, op);
    assert!(matches!(err, DialectError::InvalidConfiguration(_)));
}

// ===================================================================
// ON DUPLICATE KEY
// ===================================================================

#[test]
fn mysql_row_alias_depends_on_version() {
    let old = Dialect::with_config(
        DialectKind::MySql,
        DialectConfig::default().with_version(DatabaseVersion::new(5, 7, 44)),
    )
    .unwrap();
    assert_eq!(
        compile_sql(&old, users_upsert()),
        "INSERT INTO users (email,name) VALUES (?,?) ON DUPLICATE KEY UPDATE name=VALUES(name)"
    );

    let new = dialect(DialectKind::MySql);
    assert_eq!(
        compile_sql(&new, users_upsert()),
        "INSERT INTO users (email,name) VALUES (?,?) AS NEW ON DUPLICATE KEY UPDATE name=NEW.name"
    );
}

#[test]
fn mysql_rejects_filtered_upsert() {
    let d = dialect(DialectKind::MySql);
    let err = compile_err(&d, users_upsert().filter(col("name").eq(lit("x"))));
    assert_eq!(err.unsupported_feature(), Some("upsert with a WHERE clause"));
}

// ===================================================================
// Plan resolution
// ===================================================================

#[test]
fn explicit_updates_and_exclusions() {
    let d = dialect(DialectKind::PostgreSql);
    let table = keyed_table().column(ColumnDef::new("created", DataType::DateTime));
    let op = UpsertOp::new(
        table.clone(),
        vec![("id", param(1)), ("name", param("a")), ("created", raw("NOW()"))],
    )
    .exclude(&["created"]);
    assert_eq!(
        compile_sql(&d, op),
        "INSERT INTO t (id,name,created) VALUES ($1,$2,NOW()) \
         ON CONFLICT (id) DO UPDATE SET name=EXCLUDED.name"
    );

    let op = UpsertOp::new(table, vec![("id", param(1)), ("name", param("a"))])
        .on_update(vec![("name", lit("fixed"))]);
    assert_eq!(
        compile_sql(&d, op),
        "INSERT INTO t (id,name) VALUES ($1,$2) ON CONFLICT (id) DO UPDATE SET name='fixed'"
    );
}

#[test]
fn upsert_without_conflict_target_is_unsupported() {
    let table = TableDef::new("log").column(ColumnDef::new("line", DataType::Text));
    let op = UpsertOp::new(table, vec![("line", param("x"))]);
    for kind in [DialectKind::PostgreSql, DialectKind::SqlServer, DialectKind::Oracle] {
        let err = compile_err(&dialect(kind), op.clone());
        assert_eq!(
            err.unsupported_feature(),
            Some("upsert without a conflict target"),
            "{kind}: {err}"
        );
    }
}

#[test]
fn filter_without_update_columns_is_invalid() {
    let op = UpsertOp::new(keyed_table(), vec![("id", param(1)), ("name", param("a"))])
        .exclude(&["name"])
        .filter(col("name").is_null());
    for kind in [DialectKind::PostgreSql, DialectKind::Sqlite, DialectKind::SqlServer] {
        let err = compile_err(&dialect(kind), op.clone());
        assert!(
            matches!(err, DialectError::InvalidConfiguration(_)),
            "{kind}: {err}"
        );
    }
}

#[test]
fn upsert_without_data_is_invalid() {
    let op = UpsertOp::new(keyed_table(), Vec::new());
    let err = compile_err(&dialect(DialectKind::Sqlite), op);
    assert!(matches!(err, DialectError::InvalidConfiguration(_)));
}

// ===================================================================
// Bound values
// ===================================================================

fn flags() -> TableDef {
    TableDef::new("flags")
        .column(ColumnDef::new("id", DataType::Uuid))
        .column(ColumnDef::new("active", DataType::Boolean))
        .primary_key(&["id"])
}

#[test]
fn upsert_parameters_use_the_column_encoding() {
    let op = UpsertOp::new(flags(), vec![("id", param(Uuid::nil())), ("active", param(true))]);
    for kind in [DialectKind::Oracle, DialectKind::Sqlite] {
        let stmt = compile_one(&dialect(kind), op.clone());
        assert_eq!(
            stmt.params,
            vec![SqlValue::Blob(vec![0; 16]), SqlValue::Int(1)],
            "{kind}"
        );
    }

    let sql = compile_sql(&inline(DialectKind::Oracle), op);
    assert!(sql.contains("SELECT HEXTORAW('00000000000000000000000000000000') id,1 active FROM DUAL"));
}

#[test]
fn insert_parameters_use_the_column_encoding() {
    let op = InsertOp::values(flags(), vec![("id", param(Uuid::nil())), ("active", param(false))]);
    let stmt = compile_one(&dialect(DialectKind::Oracle), op.clone());
    assert_eq!(stmt.params, vec![SqlValue::Blob(vec![0; 16]), SqlValue::Int(0)]);

    let stmt = compile_one(&dialect(DialectKind::SqlServer), op);
    assert_eq!(
        stmt.params,
        vec![
            SqlValue::Text(Uuid::nil().hyphenated().to_string()),
            SqlValue::Bool(false)
        ]
    );
}
