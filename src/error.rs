//! Domain errors.
//!
//! Public API returns `anyhow::Result` everywhere; the variants below are carried
//! inside `anyhow::Error` so callers can tell them apart with
//! `err.downcast_ref::<TxrmError>()`. I/O and codec errors from the storage
//! backend are not wrapped and propagate as-is (with context).

use std::fmt;

/// One array/stack whose length (or frame shape) disagrees with the image count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthViolation {
    pub field: String,
    pub expected: usize,
    pub actual: usize,
}

impl fmt::Display for LengthViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected {}, got {}",
            self.field, self.expected, self.actual
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TxrmError {
    #[error("session is read-only: {0}")]
    ReadOnly(&'static str),

    #[error("{} field(s) do not match number_of_images: {}", .0.len(), join_violations(.0))]
    Validation(Vec<LengthViolation>),

    #[error("type mismatch for '{what}': {reason}")]
    Type { what: String, reason: String },

    #[error("unsupported {what} type code {code} (expected 5=uint16 or 10=float32)")]
    UnsupportedFormat { what: &'static str, code: u32 },

    #[error("no snapshot was captured at load (enable capture_snapshot)")]
    SnapshotUnavailable,

    #[error("meta key set differs from the current mapping; use add_meta to introduce '{0}'")]
    MetaKeys(String),

    #[error("add_meta('{0}'): at least one of data and shape has to be specified")]
    MissingArgument(String),

    #[error("stream not found: {0}")]
    StreamNotFound(String),
}

fn join_violations(v: &[LengthViolation]) -> String {
    v.iter()
        .map(|x| x.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl TxrmError {
    pub(crate) fn type_mismatch(what: impl Into<String>, reason: impl Into<String>) -> Self {
        TxrmError::Type {
            what: what.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_every_field() {
        let e = TxrmError::Validation(vec![
            LengthViolation {
                field: "angles".into(),
                expected: 10,
                actual: 9,
            },
            LengthViolation {
                field: "x_shifts".into(),
                expected: 10,
                actual: 12,
            },
        ]);
        let s = e.to_string();
        assert!(s.starts_with("2 field(s)"), "{s}");
        assert!(s.contains("angles: expected 10, got 9"), "{s}");
        assert!(s.contains("x_shifts: expected 10, got 12"), "{s}");
    }
}
