//! Identifier quoting, case folding and length limits.

use std::collections::HashSet;

/// The case a dialect folds unquoted identifiers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierCase {
    Upper,
    Lower,
    /// Unquoted identifiers keep their case.
    Mixed,
}

/// Reserved words common to every dialect.
const SQL_KEYWORDS: &[&str] = &[
    "ABSOLUTE", "ACTION", "ADD", "ALL", "ALLOCATE", "ALTER", "AND", "ANY", "ARE", "AS", "ASC",
    "ASSERTION", "AT", "AUTHORIZATION", "AVG", "BEGIN", "BETWEEN", "BIT", "BIT_LENGTH", "BOTH",
    "BY", "CASCADE", "CASCADED", "CASE", "CAST", "CATALOG", "CHAR", "CHARACTER", "CHECK",
    "CLOSE", "COALESCE", "COLLATE", "COLLATION", "COLUMN", "COMMIT", "CONNECT", "CONNECTION",
    "CONSTRAINT", "CONSTRAINTS", "CONTINUE", "CONVERT", "CORRESPONDING", "COUNT", "CREATE",
    "CROSS", "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "CURRENT_USER",
    "CURSOR", "DATE", "DAY", "DEALLOCATE", "DEC", "DECIMAL", "DECLARE", "DEFAULT", "DEFERRABLE",
    "DEFERRED", "DELETE", "DESC", "DESCRIBE", "DISCONNECT", "DISTINCT", "DOMAIN", "DOUBLE",
    "DROP", "ELSE", "END", "ESCAPE", "EXCEPT", "EXCEPTION", "EXEC", "EXECUTE", "EXISTS",
    "EXTERNAL", "EXTRACT", "FALSE", "FETCH", "FIRST", "FLOAT", "FOR", "FOREIGN", "FOUND",
    "FROM", "FULL", "GET", "GLOBAL", "GO", "GOTO", "GRANT", "GROUP", "HAVING", "HOUR",
    "IDENTITY", "IMMEDIATE", "IN", "INDICATOR", "INITIALLY", "INNER", "INPUT", "INSENSITIVE",
    "INSERT", "INT", "INTEGER", "INTERSECT", "INTERVAL", "INTO", "IS", "ISOLATION", "JOIN",
    "KEY", "LANGUAGE", "LAST", "LEADING", "LEFT", "LEVEL", "LIKE", "LOCAL", "LOWER", "MATCH",
    "MAX", "MIN", "MINUTE", "MODULE", "MONTH", "NAMES", "NATIONAL", "NATURAL", "NCHAR", "NEXT",
    "NO", "NOT", "NULL", "NULLIF", "NUMERIC", "OCTET_LENGTH", "OF", "ON", "ONLY", "OPEN",
    "OPTION", "OR", "ORDER", "OUTER", "OUTPUT", "OVERLAPS", "PAD", "PARTIAL", "POSITION",
    "PRECISION", "PREPARE", "PRESERVE", "PRIMARY", "PRIOR", "PRIVILEGES", "PROCEDURE", "PUBLIC",
    "READ", "REAL", "REFERENCES", "RELATIVE", "RESTRICT", "REVOKE", "RIGHT", "ROLLBACK", "ROWS",
    "SCHEMA", "SCROLL", "SECOND", "SECTION", "SELECT", "SESSION", "SESSION_USER", "SET", "SIZE",
    "SMALLINT", "SOME", "SPACE", "SQL", "SQLCODE", "SQLERROR", "SQLSTATE", "SUBSTRING", "SUM",
    "SYSTEM_USER", "TABLE", "TEMPORARY", "THEN", "TIME", "TIMESTAMP", "TIMEZONE_HOUR",
    "TIMEZONE_MINUTE", "TO", "TRAILING", "TRANSACTION", "TRANSLATE", "TRANSLATION", "TRIM",
    "TRUE", "UNION", "UNIQUE", "UNKNOWN", "UPDATE", "UPPER", "USAGE", "USER", "USING", "VALUE",
    "VALUES", "VARCHAR", "VARYING", "VIEW", "WHEN", "WHENEVER", "WHERE", "WITH", "WORK",
    "WRITE", "YEAR", "ZONE",
];

/// Quoting and case rules for identifiers of one dialect.
#[derive(Debug, Clone)]
pub struct IdentifierManager {
    quote_open: char,
    quote_close: char,
    case: IdentifierCase,
    keywords: HashSet<String>,
    length_limit: Option<usize>,
    preserve_keyword_casing: bool,
    quote_symbols: bool,
}

impl IdentifierManager {
    /// Creates a manager quoting with `quote` on both sides.
    #[must_use]
    pub fn new(quote: char, case: IdentifierCase, extra_keywords: &[&str]) -> Self {
        let keywords = SQL_KEYWORDS
            .iter()
            .chain(extra_keywords)
            .map(|k| k.to_ascii_uppercase())
            .collect();
        Self {
            quote_open: quote,
            quote_close: quote,
            case,
            keywords,
            length_limit: None,
            preserve_keyword_casing: true,
            quote_symbols: true,
        }
    }

    /// Uses distinct opening and closing quotes, e.g. `[` and `]`.
    #[must_use]
    pub const fn with_brackets(mut self, open: char, close: char) -> Self {
        self.quote_open = open;
        self.quote_close = close;
        self
    }

    #[must_use]
    pub const fn with_length_limit(mut self, limit: Option<usize>) -> Self {
        self.length_limit = limit;
        self
    }

    #[must_use]
    pub const fn with_keyword_casing(mut self, preserve: bool) -> Self {
        self.preserve_keyword_casing = preserve;
        self
    }

    #[must_use]
    pub const fn with_symbol_quoting(mut self, quote_symbols: bool) -> Self {
        self.quote_symbols = quote_symbols;
        self
    }

    #[must_use]
    pub const fn case(&self) -> IdentifierCase {
        self.case
    }

    #[must_use]
    pub const fn length_limit(&self) -> Option<usize> {
        self.length_limit
    }

    #[must_use]
    pub fn is_keyword(&self, name: &str) -> bool {
        self.keywords.contains(&name.to_ascii_uppercase())
    }

    /// Wraps `name` in quotes, doubling any embedded closing quote.
    #[must_use]
    pub fn quote(&self, name: &str) -> String {
        let close = self.quote_close.to_string();
        let escaped = name.replace(self.quote_close, &close.repeat(2));
        format!("{}{escaped}{}", self.quote_open, self.quote_close)
    }

    #[must_use]
    pub fn is_already_quoted(&self, name: &str) -> bool {
        name.len() >= 2 && name.starts_with(self.quote_open) && name.ends_with(self.quote_close)
    }

    /// Returns true if a single identifier token must be quoted to be valid.
    #[must_use]
    pub fn needs_quotes(&self, name: &str) -> bool {
        if self.is_already_quoted(name) {
            return false;
        }
        if self.is_keyword(name) {
            return true;
        }
        let mut chars = name.chars();
        let starts_ok = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
        let symbols = !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
        !starts_ok || (self.quote_symbols && symbols)
    }

    /// Quotes each dot-separated part of `name` that needs it.
    #[must_use]
    pub fn quote_if_necessary(&self, name: &str) -> String {
        if self.is_already_quoted(name) || !name.contains('.') {
            return self.quote_token_if_necessary(name);
        }
        name.split('.')
            .map(|part| self.quote_token_if_necessary(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    fn quote_token_if_necessary(&self, token: &str) -> String {
        if !self.needs_quotes(token) {
            return String::from(token);
        }
        if self.is_keyword(token) && !self.preserve_keyword_casing {
            self.quote(&self.in_proper_case(token))
        } else {
            self.quote(token)
        }
    }

    /// Folds an unquoted identifier to the case the database stores it in.
    #[must_use]
    pub fn in_proper_case(&self, name: &str) -> String {
        if self.is_already_quoted(name) {
            return String::from(name);
        }
        match self.case {
            IdentifierCase::Upper => name.to_uppercase(),
            IdentifierCase::Lower => name.to_lowercase(),
            IdentifierCase::Mixed => String::from(name),
        }
    }

    fn is_mixed_case(name: &str) -> bool {
        name.chars().any(char::is_uppercase) && name.chars().any(char::is_lowercase)
    }

    /// Quotes identifiers the database would otherwise fold to a different
    /// name, in addition to those that need quotes anyway.
    #[must_use]
    pub fn quote_when_wrong_case_or_necessary(&self, name: &str) -> String {
        if self.is_already_quoted(name) {
            return String::from(name);
        }
        name.split('.')
            .map(|part| {
                if self.case != IdentifierCase::Mixed && Self::is_mixed_case(part) {
                    self.quote(part)
                } else {
                    self.quote_token_if_necessary(part)
                }
            })
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Truncates `name` to the length limit.
    #[must_use]
    pub fn cut_if_necessary(&self, name: &str) -> String {
        match self.length_limit {
            Some(limit) if name.chars().count() > limit => name.chars().take(limit).collect(),
            _ => String::from(name),
        }
    }

    #[must_use]
    pub fn cut_if_necessary_and_quote(&self, name: &str) -> String {
        self.quote_if_necessary(&self.cut_if_necessary(name))
    }

    /// Normalizes a name for comparison against introspected metadata.
    ///
    /// Quoted and mixed-case names keep their exact spelling, other names
    /// are folded to the database case.
    #[must_use]
    pub fn in_database_case(&self, name: &str) -> String {
        if self.is_already_quoted(name) {
            let inner = &name[self.quote_open.len_utf8()..name.len() - self.quote_close.len_utf8()];
            return String::from(inner);
        }
        if Self::is_mixed_case(name) {
            return String::from(name);
        }
        self.in_proper_case(name)
    }
}
