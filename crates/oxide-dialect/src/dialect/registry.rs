//! Name-based dialect lookup.

use std::collections::HashMap;

use super::{Dialect, DialectKind};
use crate::config::DialectConfig;
use crate::error::{DialectError, Result};

/// Maps dialect names and aliases to [`DialectKind`]s.
///
/// There is no process-wide current dialect: callers resolve a dialect here
/// and pass it explicitly to every compilation.
#[derive(Debug, Clone)]
pub struct DialectRegistry {
    names: HashMap<String, DialectKind>,
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DialectRegistry {
    /// Creates a registry holding the built-in names and their common aliases.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            names: HashMap::new(),
        };
        for kind in DialectKind::ALL {
            registry.register(kind.name(), kind);
        }
        for (alias, kind) in [
            ("ansi", DialectKind::Generic),
            ("standard", DialectKind::Generic),
            ("postgres", DialectKind::PostgreSql),
            ("pg", DialectKind::PostgreSql),
            ("pgsql", DialectKind::PostgreSql),
            ("sqlite3", DialectKind::Sqlite),
            ("mssql", DialectKind::SqlServer),
        ] {
            registry.register(alias, kind);
        }
        registry
    }

    /// Registers `name` as an alias of `kind`. Names are case-insensitive.
    pub fn register(&mut self, name: &str, kind: DialectKind) {
        self.names.insert(name.trim().to_ascii_lowercase(), kind);
    }

    /// Looks up the kind registered under `name`.
    ///
    /// # Errors
    ///
    /// [`DialectError::UnknownDialect`] if nothing is registered under `name`.
    pub fn kind(&self, name: &str) -> Result<DialectKind> {
        self.names
            .get(&name.trim().to_ascii_lowercase())
            .copied()
            .ok_or_else(|| DialectError::UnknownDialect(name.to_owned()))
    }

    /// Builds the dialect registered under `name` with `config` applied.
    ///
    /// # Errors
    ///
    /// Fails for unknown names and invalid configurations.
    pub fn resolve(&self, name: &str, config: DialectConfig) -> Result<Dialect> {
        Dialect::with_config(self.kind(name)?, config)
    }

    /// Every registered name, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Guesses the dialect name from a connection URL.
///
/// Accepts both JDBC (`jdbc:postgresql://...`, `jdbc:oracle:thin:@...`) and
/// plain URL schemes (`postgres://`, `mysql://`, `sqlite:`).
#[must_use]
pub fn dialect_name_from_url(url: &str) -> Option<&'static str> {
    let url = url.trim();
    let rest = url
        .get(..5)
        .filter(|prefix| prefix.eq_ignore_ascii_case("jdbc:"))
        .map_or(url, |_| &url[5..]);
    let scheme = rest.split(':').next()?.to_ascii_lowercase();
    let kind = match scheme.as_str() {
        "postgresql" | "postgres" | "pgsql" => DialectKind::PostgreSql,
        "mysql" => DialectKind::MySql,
        "mariadb" => DialectKind::MariaDb,
        "sqlite" | "sqlite3" => DialectKind::Sqlite,
        "oracle" => DialectKind::Oracle,
        "sqlserver" | "mssql" => DialectKind::SqlServer,
        "h2" => DialectKind::H2,
        _ => return None,
    };
    Some(kind.name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_names_and_aliases() {
        let registry = DialectRegistry::new();
        assert_eq!(registry.kind("PG").unwrap(), DialectKind::PostgreSql);
        assert_eq!(registry.kind("mssql").unwrap(), DialectKind::SqlServer);
        let d = registry
            .resolve("mariadb", DialectConfig::default())
            .unwrap();
        assert_eq!(d.name(), "mariadb");
    }

    #[test]
    fn unknown_name_is_an_error() {
        let registry = DialectRegistry::new();
        let err = registry.kind("db2").unwrap_err();
        assert!(matches!(err, DialectError::UnknownDialect(name) if name == "db2"));
    }

    #[test]
    fn custom_aliases() {
        let mut registry = DialectRegistry::new();
        registry.register("cockroach", DialectKind::PostgreSql);
        assert_eq!(registry.kind("Cockroach").unwrap(), DialectKind::PostgreSql);
        assert!(registry.names().contains(&"cockroach"));
    }

    #[test]
    fn names_from_urls() {
        assert_eq!(
            dialect_name_from_url("jdbc:postgresql://localhost/app"),
            Some("postgresql")
        );
        assert_eq!(dialect_name_from_url("postgres://u@h/db"), Some("postgresql"));
        assert_eq!(dialect_name_from_url("mysql://root@localhost"), Some("mysql"));
        assert_eq!(dialect_name_from_url("sqlite:db.sqlite3"), Some("sqlite"));
        assert_eq!(
            dialect_name_from_url("jdbc:oracle:thin:@host:1521/XE"),
            Some("oracle")
        );
        assert_eq!(
            dialect_name_from_url("jdbc:sqlserver://host;databaseName=app"),
            Some("sqlserver")
        );
        assert_eq!(dialect_name_from_url("redis://localhost"), None);
    }
}
