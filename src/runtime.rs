//! Runtime support referenced by generated node code.
//!
//! Generated artifacts name this module through a configurable path
//! (`::nodegen::runtime` by default), so a consumer crate depends on
//! `nodegen` both at build time and at run time.
use thiserror::Error;

/// An owned-reference field was constructed without its child.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{family}.{variant}: owned reference `{field}`{} is absent", .index.map(|i| format!("[{i}]")).unwrap_or_default())]
pub struct InvariantViolation {
    pub family: &'static str,
    pub variant: &'static str,
    pub field: &'static str,
    /// position inside a plural field
    pub index: Option<usize>,
}

/// Checked downcast to a variant the node does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{family}: expected variant `{expected}`, found `{found}`")]
pub struct VariantMismatch {
    pub family: &'static str,
    pub expected: &'static str,
    pub found: &'static str,
}

/// A raw tag value outside the declared variants. Generated code and schema
/// are out of sync; there is no sensible recovery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{family}: unhandled variant tag {raw}")]
pub struct UnhandledVariant {
    pub family: &'static str,
    pub raw: u32,
}

impl VariantMismatch {
    pub fn new(family: &'static str, expected: &'static str, found: &'static str) -> Self {
        Self { family, expected, found }
    }
}

impl UnhandledVariant {
    pub fn new(family: &'static str, raw: u32) -> Self {
        Self { family, raw }
    }
}

/// Single owned reference: must be present.
pub fn require<T>(
    value: Option<T>,
    family: &'static str,
    variant: &'static str,
    field: &'static str,
) -> Result<T, InvariantViolation> {
    value.ok_or(InvariantViolation { family, variant, field, index: None })
}

/// Plural owned reference: may be empty, but no element may be absent.
pub fn require_all<T>(
    values: impl IntoIterator<Item = Option<T>>,
    family: &'static str,
    variant: &'static str,
    field: &'static str,
) -> Result<Vec<T>, InvariantViolation> {
    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| value.ok_or(InvariantViolation { family, variant, field, index: Some(i) }))
        .collect()
}

/// Fatal path for [`UnhandledVariant`].
#[track_caller]
pub fn unhandled(err: UnhandledVariant) -> ! {
    panic!("{err}")
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn require_reports_the_field() {
        let err = require::<u8>(None, "Expr", "add", "a").unwrap_err();
        assert_eq!(err.to_string(), "Expr.add: owned reference `a` is absent");
        assert_eq!(require(Some(3), "Expr", "add", "a"), Ok(3));
    }

    #[test]
    fn require_all_allows_empty_but_not_holes() {
        assert_eq!(require_all::<u8>(Vec::new(), "Type", "struct", "members"), Ok(vec![]));
        let err = require_all(vec![Some(1), None, Some(3)], "Type", "struct", "members").unwrap_err();
        assert_eq!(err.index, Some(1));
        assert_eq!(err.to_string(), "Type.struct: owned reference `members`[1] is absent");
    }

    #[test]
    #[should_panic(expected = "Stmt: unhandled variant tag 99")]
    fn unhandled_is_fatal() {
        unhandled(UnhandledVariant::new("Stmt", 99));
    }
}
