//! SQL values and the statement buffer.

mod buffer;
mod value;

pub use buffer::{CompiledStatement, InsertValueRef, StatementBuffer};
pub use value::{SqlValue, ToSqlValue};

pub(crate) use value::{hex_upper, quote_text};
