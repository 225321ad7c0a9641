//! Safe filter expressions.
//!
//! Filter text typed by the user is compiled into a [`CompiledFilter`] by a
//! small tokenizer and recursive-descent parser. Nothing in the text is ever
//! executed: the only things an expression can do are read record columns,
//! compare values and combine booleans.
//!
//! Supported syntax:
//!
//! - literals: `42`, `-1.5`, `'good'`, `"noise"`, `true`, `false`, `null`
//! - identifiers: any configured column, plus the reserved `group`
//! - comparisons: `==` (also `=`), `!=`, `<`, `<=`, `>`, `>=`
//! - connectives: `&&`/`and`, `||`/`or`, `!`/`not`, parentheses
//!
//! Parentheses, `!` and unary minus nest at most [`MAX_NESTING`] deep;
//! deeper text is a parse error.
//!
//! A bare identifier is tested for truthiness. Identifiers that are not
//! columns parse fine but fail evaluation with
//! [`EvalError::UnknownName`](crate::EvalError::UnknownName).
//!
//! # Example
//!
//! ```
//! use tablekit::{Record, filter};
//!
//! let columns = ["id".to_string(), "n_spikes".to_string()];
//! let compiled = filter::compile("n_spikes > 20 && group != 'noise'", &columns)
//!     .unwrap()
//!     .unwrap();
//!
//! let record = Record::new(1).with("n_spikes", 30).with("group", "good");
//! assert_eq!(compiled.matches(&record), Ok(true));
//! ```

mod eval;
mod lexer;
mod parser;

use std::fmt;

use tablekit_core::logging::targets;

use crate::error::{EvalError, FilterError};
use crate::record::Record;

pub use parser::{CompareOp, Expr, MAX_NESTING};

/// Identifier that always resolves, whether or not it is a column.
pub const GROUP_FIELD: &str = "group";

/// A parsed filter, ready to evaluate against records.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    source: String,
    expr: Expr,
}

impl CompiledFilter {
    /// The text this filter was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed expression.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Whether `record` passes the filter.
    pub fn matches(&self, record: &Record) -> Result<bool, EvalError> {
        eval::evaluate(&self.expr, record).map(|value| value.is_truthy())
    }
}

impl fmt::Display for CompiledFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Compile filter text against the given column names.
///
/// Blank text compiles to `None`, meaning "no filter".
pub fn compile(text: &str, columns: &[String]) -> Result<Option<CompiledFilter>, FilterError> {
    let source = text.trim();
    if source.is_empty() {
        return Ok(None);
    }

    // Offsets are reported against the untrimmed text.
    let lead = text.len() - text.trim_start().len();
    let shift = |err: FilterError| FilterError::new(err.offset + lead, err.message);

    let tokens = lexer::tokenize(source).map_err(shift)?;
    let expr = parser::parse(&tokens, |name| {
        name == GROUP_FIELD || columns.iter().any(|column| column == name)
    })
    .map_err(shift)?;
    tracing::debug!(target: targets::FILTER, filter = source, "compiled filter");

    Ok(Some(CompiledFilter {
        source: source.to_owned(),
        expr,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<String> {
        vec!["id".into(), "n_spikes".into()]
    }

    #[test]
    fn test_blank_is_no_filter() {
        assert_eq!(compile("", &columns()), Ok(None));
        assert_eq!(compile("   \t", &columns()), Ok(None));
    }

    #[test]
    fn test_group_always_resolves() {
        let filter = compile("group == 'good'", &[]).unwrap().unwrap();
        assert_eq!(filter.matches(&Record::new(1).with("group", "good")), Ok(true));
        assert_eq!(filter.matches(&Record::new(1)), Ok(false));
    }

    #[test]
    fn test_non_column_identifier() {
        let filter = compile("quality > 0.5", &columns()).unwrap().unwrap();
        let record = Record::new(1).with("quality", 0.9);
        assert_eq!(
            filter.matches(&record),
            Err(EvalError::UnknownName("quality".into()))
        );
    }

    #[test]
    fn test_source_is_trimmed() {
        let filter = compile("  n_spikes  ", &columns()).unwrap().unwrap();
        assert_eq!(filter.source(), "n_spikes");
        assert_eq!(filter.to_string(), "n_spikes");
    }

    #[test]
    fn test_error_offset_counts_leading_space() {
        let err = compile("  n_spikes >", &columns()).unwrap_err();
        assert_eq!(err.offset, 12);
    }

    #[test]
    fn test_no_code_execution_syntax() {
        assert!(compile("alert('x')", &columns()).is_err());
        assert!(compile("n_spikes; rm", &columns()).is_err());
        assert!(compile("n_spikes.constructor", &columns()).is_err());
    }
}
