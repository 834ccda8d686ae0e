//! Tests for table, index, constraint, sequence and schema DDL.

mod common;
use common::*;

use oxide_dialect::ast::{
    col, lit, qualified, ColumnDef, DataType, ForeignKeyConstraint, Function, Index, Operation,
    ReferenceOption, Sequence, TableDef,
};
use oxide_dialect::{DialectError, DialectKind};

fn orders() -> TableDef {
    TableDef::new("orders")
        .column(ColumnDef::new("id", DataType::Long).auto_increment())
        .column(ColumnDef::new("user_id", DataType::Integer))
        .column(
            ColumnDef::new(
                "total",
                DataType::Decimal {
                    precision: 10,
                    scale: 2,
                },
            )
            .default_value(lit(0)),
        )
        .primary_key(&["id"])
        .foreign_key(
            ForeignKeyConstraint::new("orders", "user_id", "users", "id")
                .on_delete(ReferenceOption::Cascade),
        )
        .index(Index::new("orders", &["user_id"]))
}

fn create(table: TableDef) -> Operation {
    Operation::CreateTable {
        table,
        if_not_exists: false,
    }
}

fn sql_of(kind: DialectKind, op: Operation) -> Vec<String> {
    compile_all(&dialect(kind), op)
        .into_iter()
        .map(|s| s.sql)
        .collect()
}

// ===================================================================
// CREATE TABLE
// ===================================================================

#[test]
fn postgres_table_with_serial_key_and_index() {
    assert_eq!(
        sql_of(DialectKind::PostgreSql, create(orders())),
        vec![
            String::from(
                "CREATE TABLE orders (id BIGSERIAL NOT NULL, user_id INT NOT NULL, \
                 total DECIMAL(10,2) DEFAULT 0 NOT NULL, CONSTRAINT pk_orders PRIMARY KEY (id), \
                 CONSTRAINT fk_orders_user_id__id FOREIGN KEY (user_id) REFERENCES users(id) \
                 ON DELETE CASCADE)"
            ),
            String::from("CREATE INDEX orders_user_id ON orders (user_id)"),
        ]
    );
}

#[test]
fn oracle_table_is_preceded_by_its_sequence() {
    let statements = sql_of(DialectKind::Oracle, create(orders()));
    assert_eq!(statements.len(), 3);
    assert_eq!(statements[0], "CREATE SEQUENCE orders_id_seq");
    assert!(statements[1].starts_with("CREATE TABLE orders (id NUMBER(19) NOT NULL,"));
    assert!(statements[1].contains("ON DELETE CASCADE"));
}

#[test]
fn if_not_exists_where_supported() {
    let table = TableDef::new("t").column(ColumnDef::new("a", DataType::Integer));
    let op = Operation::CreateTable {
        table,
        if_not_exists: true,
    };
    assert_eq!(
        sql_of(DialectKind::Sqlite, op.clone()),
        vec![String::from("CREATE TABLE IF NOT EXISTS t (a INTEGER NOT NULL)")]
    );
    let err = compile_err(&dialect(DialectKind::SqlServer), op);
    assert_eq!(err.unsupported_feature(), Some("CREATE TABLE IF NOT EXISTS"));
}

// ===================================================================
// Indices
// ===================================================================

#[test]
fn unique_index_as_constraint_or_index() {
    let index = Index::new("users", &["email"]).unique();
    assert_eq!(
        sql_of(DialectKind::PostgreSql, Operation::CreateIndex(index.clone())),
        vec![String::from(
            "ALTER TABLE users ADD CONSTRAINT users_email_unique UNIQUE (email)"
        )]
    );
    assert_eq!(
        sql_of(DialectKind::Sqlite, Operation::CreateIndex(index.clone())),
        vec![String::from(
            "CREATE UNIQUE INDEX users_email_unique ON users (email)"
        )]
    );
    assert_eq!(
        sql_of(DialectKind::PostgreSql, Operation::DropIndex(index)),
        vec![String::from(
            "ALTER TABLE users DROP CONSTRAINT users_email_unique"
        )]
    );
}

#[test]
fn unsupported_partial_index_is_skipped() {
    let index = Index::new("users", &["email"]).with_filter(col("active").eq(lit(true)));
    assert!(sql_of(DialectKind::Generic, Operation::CreateIndex(index.clone())).is_empty());
    assert_eq!(
        sql_of(DialectKind::PostgreSql, Operation::CreateIndex(index)),
        vec![String::from(
            "CREATE INDEX users_email ON users (email) WHERE active=TRUE"
        )]
    );
}

#[test]
fn typed_index_names_its_method() {
    let index = Index::new("docs", &["body"]).with_type("GIN");
    assert_eq!(
        sql_of(DialectKind::PostgreSql, Operation::CreateIndex(index.clone())),
        vec![String::from("CREATE INDEX docs_body ON docs USING GIN (body)")]
    );
    assert_eq!(
        sql_of(DialectKind::Oracle, Operation::CreateIndex(index.with_type("bitmap"))),
        vec![String::from("CREATE BITMAP INDEX docs_body ON docs (body)")]
    );
}

#[test]
fn unique_typed_index_is_invalid() {
    let index = Index::new("docs", &["body"]).unique().with_type("GIN");
    let err = compile_err(&dialect(DialectKind::PostgreSql), Operation::CreateIndex(index));
    assert!(matches!(err, DialectError::InvalidConfiguration(_)), "{err}");
}

#[test]
fn functional_index_drops_table_qualifiers() {
    let index = Index::new("users", &[])
        .with_function(Function::Lower(qualified("users", "email")).into());
    let name = index.index_name();
    assert_ne!(name, "users");
    for kind in [DialectKind::PostgreSql, DialectKind::Sqlite, DialectKind::Oracle] {
        assert_eq!(
            sql_of(kind, Operation::CreateIndex(index.clone())),
            vec![format!("CREATE INDEX {name} ON users (LOWER(email))")],
            "{kind}"
        );
    }
}

#[test]
fn functional_indices_on_one_table_get_distinct_names() {
    let lower = Index::new("users", &[]).with_function(Function::Lower(col("email")).into());
    let upper = Index::new("users", &[]).with_function(Function::Upper(col("email")).into());
    assert_ne!(lower.index_name(), upper.index_name());

    let d = dialect(DialectKind::PostgreSql);
    let first = compile_sql(&d, Operation::CreateIndex(lower));
    let second = compile_sql(&d, Operation::CreateIndex(upper));
    assert_ne!(first, second);
}

#[test]
fn partial_index_drops_table_qualifiers() {
    let index =
        Index::new("users", &["email"]).with_filter(qualified("users", "active").eq(lit(true)));
    assert_eq!(
        sql_of(DialectKind::PostgreSql, Operation::CreateIndex(index.clone())),
        vec![String::from(
            "CREATE INDEX users_email ON users (email) WHERE active=TRUE"
        )]
    );
    assert_eq!(
        sql_of(DialectKind::Sqlite, Operation::CreateIndex(index.clone())),
        vec![String::from(
            "CREATE INDEX users_email ON users (email) WHERE active=1"
        )]
    );
    assert!(sql_of(DialectKind::Oracle, Operation::CreateIndex(index)).is_empty());
}

#[test]
fn index_without_keys_is_invalid() {
    let index = Index::new("users", &[]);
    let err = compile_err(&dialect(DialectKind::PostgreSql), Operation::CreateIndex(index));
    assert!(err.unsupported_feature().is_none());
}

// ===================================================================
// Constraints
// ===================================================================

#[test]
fn foreign_key_options_are_substituted() {
    let fk = ForeignKeyConstraint::new("orders", "user_id", "users", "id")
        .named("fk_user")
        .on_delete(ReferenceOption::SetDefault)
        .on_update(ReferenceOption::Cascade);
    assert_eq!(
        sql_of(DialectKind::MySql, Operation::AddForeignKey(fk.clone())),
        vec![String::from(
            "ALTER TABLE orders ADD CONSTRAINT fk_user FOREIGN KEY (user_id) REFERENCES users(id) \
             ON DELETE RESTRICT ON UPDATE CASCADE"
        )]
    );
    assert_eq!(
        sql_of(DialectKind::PostgreSql, Operation::DropForeignKey(fk)),
        vec![String::from("ALTER TABLE orders DROP CONSTRAINT fk_user")]
    );
}

// ===================================================================
// Sequences, schemas, databases
// ===================================================================

#[test]
fn sequences() {
    let sequence = Sequence::new("s").start_with(5).increment_by(2);
    assert_eq!(
        sql_of(DialectKind::PostgreSql, Operation::CreateSequence(sequence.clone())),
        vec![String::from("CREATE SEQUENCE s START WITH 5 INCREMENT BY 2")]
    );
    let err = compile_err(&dialect(DialectKind::MySql), Operation::CreateSequence(sequence));
    assert_eq!(err.unsupported_feature(), Some("CREATE SEQUENCE"));
}

#[test]
fn drop_table_flags() {
    let op = Operation::DropTable {
        name: String::from("t"),
        if_exists: true,
        cascade: true,
    };
    assert_eq!(
        sql_of(DialectKind::PostgreSql, op.clone()),
        vec![String::from("DROP TABLE IF EXISTS t CASCADE")]
    );
    let err = compile_err(&dialect(DialectKind::Sqlite), op);
    assert_eq!(err.unsupported_feature(), Some("DROP TABLE CASCADE"));
}

#[test]
fn schema_and_database_ddl() {
    let set = Operation::SetSchema {
        name: String::from("app"),
    };
    assert_eq!(
        sql_of(DialectKind::PostgreSql, set.clone()),
        vec![String::from("SET search_path TO app")]
    );
    assert_eq!(
        sql_of(DialectKind::H2, set),
        vec![String::from("SET SCHEMA app")]
    );

    let create_db = Operation::CreateDatabase {
        name: String::from("shop"),
    };
    assert_eq!(
        sql_of(DialectKind::MySql, create_db.clone()),
        vec![String::from("CREATE DATABASE shop")]
    );
    let err = compile_err(&dialect(DialectKind::Sqlite), create_db);
    assert_eq!(err.unsupported_feature(), Some("CREATE DATABASE"));
}
