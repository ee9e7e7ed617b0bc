pub mod header;
pub mod ids;
pub mod primitive;

use crate::error::StructError;
use nom::{
    error::{ErrorKind, ParseError},
    Err, IResult,
};

pub(crate) type Result<'a, T> = IResult<&'a [u8], T, RecordParseError>;

/// Errors that can happen while matching a record header.
/// Most errors are simply `NomError` but a few of them are specific for better error reporting.
#[derive(Debug)]
pub enum RecordParseError {
    NomError {
        kind: ErrorKind,
        other: Option<Box<RecordParseError>>,
    },
    /// The first four bytes are not a known resource signature.
    UnknownSignature([u8; 4]),
    /// The version tag has no matching layout.
    UnknownVersion([u8; 4]),
    /// A numeric discriminant has no matching layout.
    UnknownDiscriminant(i64),
}

impl ParseError<&[u8]> for RecordParseError {
    fn from_error_kind(_input: &[u8], kind: ErrorKind) -> Self {
        RecordParseError::NomError { kind, other: None }
    }

    fn append(_input: &[u8], kind: ErrorKind, other: Self) -> Self {
        RecordParseError::NomError {
            kind,
            other: Some(Box::new(other)),
        }
    }
}

fn four_cc(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

impl RecordParseError {
    fn describe(&self) -> String {
        match self {
            RecordParseError::NomError { kind, .. } => format!("header mismatch ({:?})", kind),
            RecordParseError::UnknownSignature(sig) => {
                format!("unknown signature \"{}\"", four_cc(sig))
            }
            RecordParseError::UnknownVersion(version) => {
                format!("unsupported version \"{}\"", four_cc(version))
            }
            RecordParseError::UnknownDiscriminant(value) => {
                format!("no layout for discriminant value {}", value)
            }
        }
    }
}

/// Turns a header parser failure into the crate error for `node`.
pub(crate) fn to_struct_error(node: &str, err: Err<RecordParseError>) -> StructError {
    match err {
        Err::Error(e) | Err::Failure(e) => StructError::malformed(node, e.describe()),
        Err::Incomplete(..) => StructError::malformed(node, "buffer too short for header"),
    }
}
