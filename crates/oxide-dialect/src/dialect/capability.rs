//! Per-dialect capability flags.

use crate::ast::ReferenceOption;

/// Placeholder syntax for bound arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterStyle {
    /// `?`
    QuestionMark,
    /// `$1`, `$2`, ...
    Numbered,
}

/// How a row limit is attached to `UPDATE` or `DELETE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLimitStyle {
    /// Trailing `LIMIT n`.
    Limit,
    /// `TOP(n)` after the verb.
    Top,
    /// `ROWNUM <= n` folded into the predicate.
    RowNum,
    Unsupported,
}

/// Immutable record of what a dialect can express.
///
/// [`CapabilityFlags::STANDARD`] describes a fully SQL-standard database.
/// Vendors start from it and override their deviations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct CapabilityFlags {
    pub supports_if_not_exists: bool,
    pub supports_drop_if_exists: bool,
    pub supports_create_sequence: bool,
    /// Autoincrement columns are backed by an explicit sequence.
    pub needs_sequence_for_autoincrement: bool,
    pub supports_create_schema: bool,
    pub supports_database_ddl: bool,
    /// Substituted for reference options the vendor rejects.
    pub default_reference_option: ReferenceOption,
    pub supports_restrict_reference_option: bool,
    pub supports_set_default_reference_option: bool,
    pub supports_on_update_reference: bool,
    pub supports_select_for_update: bool,
    pub supports_select_for_share: bool,
    pub supports_ternary_affected_rows: bool,
    pub supports_subquery_unions: bool,
    pub supports_nulls_ordering: bool,
    pub supports_multiple_generated_keys: bool,
    pub supports_only_identifiers_in_generated_keys: bool,
    pub supports_window_frame_groups_mode: bool,
    pub supports_dual_table: bool,
    pub supports_column_type_change: bool,
    pub supports_partial_index: bool,
    pub supports_functional_index: bool,
    pub supports_drop_table_cascade: bool,
    /// Unique column-only indices are created as table constraints.
    pub unique_index_as_constraint: bool,
    pub auto_increment_implies_primary_key: bool,
    pub requires_auto_commit_on_create_drop: bool,
    pub needs_quotes_when_symbols_in_names: bool,
    pub supports_returning: bool,
    /// `INSERT ... AS NEW ON DUPLICATE KEY UPDATE c=NEW.c`.
    pub supports_upsert_row_alias: bool,
    pub supports_explain_analyze: bool,
    pub parameter_style: ParameterStyle,
    pub update_limit: RowLimitStyle,
    pub delete_limit: RowLimitStyle,
}

impl CapabilityFlags {
    pub const STANDARD: Self = Self {
        supports_if_not_exists: true,
        supports_drop_if_exists: true,
        supports_create_sequence: true,
        needs_sequence_for_autoincrement: false,
        supports_create_schema: true,
        supports_database_ddl: true,
        default_reference_option: ReferenceOption::NoAction,
        supports_restrict_reference_option: true,
        supports_set_default_reference_option: true,
        supports_on_update_reference: true,
        supports_select_for_update: true,
        supports_select_for_share: false,
        supports_ternary_affected_rows: false,
        supports_subquery_unions: true,
        supports_nulls_ordering: true,
        supports_multiple_generated_keys: true,
        supports_only_identifiers_in_generated_keys: false,
        supports_window_frame_groups_mode: false,
        supports_dual_table: false,
        supports_column_type_change: true,
        supports_partial_index: false,
        supports_functional_index: false,
        supports_drop_table_cascade: true,
        unique_index_as_constraint: true,
        auto_increment_implies_primary_key: false,
        requires_auto_commit_on_create_drop: false,
        needs_quotes_when_symbols_in_names: true,
        supports_returning: false,
        supports_upsert_row_alias: false,
        supports_explain_analyze: true,
        parameter_style: ParameterStyle::QuestionMark,
        update_limit: RowLimitStyle::Unsupported,
        delete_limit: RowLimitStyle::Unsupported,
    };

    #[must_use]
    pub const fn supports_limit_in_update(&self) -> bool {
        !matches!(self.update_limit, RowLimitStyle::Unsupported)
    }

    #[must_use]
    pub const fn supports_limit_in_delete(&self) -> bool {
        !matches!(self.delete_limit, RowLimitStyle::Unsupported)
    }

    /// Returns true if the vendor accepts `option` in a foreign key clause.
    #[must_use]
    pub const fn supports_reference_option(&self, option: ReferenceOption) -> bool {
        match option {
            ReferenceOption::Restrict => self.supports_restrict_reference_option,
            ReferenceOption::SetDefault => self.supports_set_default_reference_option,
            ReferenceOption::Cascade | ReferenceOption::SetNull | ReferenceOption::NoAction => {
                true
            }
        }
    }
}

impl Default for CapabilityFlags {
    fn default() -> Self {
        Self::STANDARD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_rejects_row_limits() {
        let caps = CapabilityFlags::default();
        assert!(!caps.supports_limit_in_update());
        assert!(!caps.supports_limit_in_delete());
        assert!(caps.supports_reference_option(ReferenceOption::SetDefault));
    }

    #[test]
    fn overrides_via_struct_update() {
        let caps = CapabilityFlags {
            delete_limit: RowLimitStyle::Limit,
            supports_restrict_reference_option: false,
            ..CapabilityFlags::STANDARD
        };
        assert!(caps.supports_limit_in_delete());
        assert!(!caps.supports_reference_option(ReferenceOption::Restrict));
    }
}
