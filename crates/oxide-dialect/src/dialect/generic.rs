//! SQL-standard dialect.

use super::capability::CapabilityFlags;
use super::functions::ExpressionCompiler;
use super::identifier::{IdentifierCase, IdentifierManager};
use super::statements::StatementCompiler;
use super::types::TypeMapper;
use super::Dialect;
use crate::config::DialectConfig;

/// Standard SQL with every trait default.
///
/// Pagination uses `OFFSET ... FETCH FIRST`, upserts compile to `MERGE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDialect;

pub(super) fn profile(_config: &DialectConfig) -> (CapabilityFlags, IdentifierManager) {
    (
        CapabilityFlags::STANDARD,
        IdentifierManager::new('"', IdentifierCase::Upper, &[]),
    )
}

/// `OFFSET m ROWS FETCH FIRST n ROWS ONLY`, shared by the standard and Oracle.
pub(super) fn fetch_first(limit: Option<u64>, offset: u64) -> String {
    let mut parts = Vec::with_capacity(2);
    if offset > 0 {
        parts.push(format!("OFFSET {offset} ROWS"));
    }
    if let Some(n) = limit {
        parts.push(format!("FETCH FIRST {n} ROWS ONLY"));
    }
    parts.join(" ")
}

impl TypeMapper for GenericDialect {}

impl ExpressionCompiler for GenericDialect {}

impl StatementCompiler for GenericDialect {
    fn query_limit(
        &self,
        _d: &Dialect,
        limit: Option<u64>,
        offset: u64,
        _already_ordered: bool,
    ) -> String {
        fetch_first(limit, offset)
    }
}
