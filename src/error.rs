use std::io;
use thiserror::Error;

/// Errors produced while reading, editing or writing a resource.
#[derive(Debug, Error)]
pub enum StructError {
    /// The buffer does not match the schema: too short, a section lies outside the buffer or a
    /// discriminant has no matching layout. The whole document is rejected.
    #[error("malformed record `{node}`: {reason}")]
    MalformedRecord { node: String, reason: String },

    /// The caller tried to remove a record the schema marks as permanent.
    #[error("`{node}` cannot be removed")]
    NotRemovable { node: String },

    /// An offset, count or index could not be resolved or repaired. Mutations that hit this are
    /// rolled back.
    #[error("inconsistent reference `{field}` in `{node}`: {reason}")]
    InconsistentReference {
        node: String,
        field: String,
        reason: String,
    },

    /// The field selects the record layout or is maintained by the mutation engine.
    #[error("unsupported mutation of `{field}` in `{node}`: {reason}")]
    UnsupportedMutation {
        node: String,
        field: String,
        reason: String,
    },

    #[error("no field named `{field}` in `{node}`")]
    UnknownField { node: String, field: String },

    #[error("value {value} does not fit in `{field}` ({len} bytes)")]
    ValueOutOfRange { field: String, value: i64, len: usize },

    #[error("index {index} out of range for `{node}` ({len} elements)")]
    IndexOutOfRange {
        node: String,
        index: usize,
        len: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StructError {
    pub(crate) fn malformed<N: Into<String>, R: Into<String>>(node: N, reason: R) -> Self {
        StructError::MalformedRecord {
            node: node.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn inconsistent<N: Into<String>, F: Into<String>, R: Into<String>>(
        node: N,
        field: F,
        reason: R,
    ) -> Self {
        StructError::InconsistentReference {
            node: node.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported<N: Into<String>, F: Into<String>, R: Into<String>>(
        node: N,
        field: F,
        reason: R,
    ) -> Self {
        StructError::UnsupportedMutation {
            node: node.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// While parsing, every broken reference means the input is malformed.
    pub(crate) fn into_malformed(self) -> Self {
        match self {
            StructError::InconsistentReference {
                node,
                field,
                reason,
            } => StructError::MalformedRecord {
                node,
                reason: format!("{}: {}", field, reason),
            },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, StructError>;
