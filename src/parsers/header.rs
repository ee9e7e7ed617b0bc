//! Signature and version tags found in the first eight bytes of a resource.

use super::{to_struct_error, RecordParseError, Result};
use crate::{error, schema::Schema};
use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take},
    combinator::map,
    Err,
};
use std::convert::TryInto;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signature {
    Item,
    Projectile,
}

/// ITM revisions. `V1` is the original games, `V11` is Planescape: Torment and `V20` is
/// Icewind Dale II.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemVersion {
    V1,
    V11,
    V20,
}

impl ItemVersion {
    pub fn tag(self) -> &'static [u8; 4] {
        match self {
            ItemVersion::V1 => b"V1  ",
            ItemVersion::V11 => b"V1.1",
            ItemVersion::V20 => b"V2.0",
        }
    }
}

fn four(input: &[u8]) -> [u8; 4] {
    let mut out = [0u8; 4];
    let len = input.len().min(4);
    out[..len].copy_from_slice(&input[..len]);
    out
}

pub(crate) fn parse_signature(input: &[u8]) -> Result<Signature> {
    let result = alt((
        map(tag("ITM "), |_| Signature::Item),
        map(tag("PRO "), |_| Signature::Projectile),
    ))(input);

    match result {
        Err(Err::Error(_)) => Err(Err::Failure(RecordParseError::UnknownSignature(four(input)))),
        other => other,
    }
}

pub(crate) fn parse_item_version(input: &[u8]) -> Result<ItemVersion> {
    let result = alt((
        map(tag_no_case("V1  "), |_| ItemVersion::V1),
        map(tag_no_case("V1.1"), |_| ItemVersion::V11),
        map(tag_no_case("V2.0"), |_| ItemVersion::V20),
    ))(input);

    match result {
        Err(Err::Error(_)) => Err(Err::Failure(RecordParseError::UnknownVersion(four(input)))),
        other => other,
    }
}

pub(crate) fn parse_projectile_version(input: &[u8]) -> Result<()> {
    let result = map(tag_no_case("V1.0"), |_| ())(input);

    match result {
        Err(Err::Error(_)) => Err(Err::Failure(RecordParseError::UnknownVersion(four(input)))),
        other => other,
    }
}

fn header(input: &[u8]) -> Result<(Signature, [u8; 4])> {
    let (input, signature) = parse_signature(input)?;
    let (input, version) = take(4_usize)(input)?;
    let version: [u8; 4] = version.try_into().unwrap_or_default();
    Ok((input, (signature, version)))
}

/// Reads the signature and version of `buffer` and returns the matching root schema.
pub fn detect(buffer: &[u8]) -> error::Result<Schema> {
    let (_, (signature, version)) =
        header(buffer).map_err(|e| to_struct_error("header", e))?;

    match signature {
        Signature::Item => {
            parse_item_version(&version).map_err(|e| to_struct_error("ITM", e))?;
            Ok(Schema::Item)
        }
        Signature::Projectile => {
            parse_projectile_version(&version).map_err(|e| to_struct_error("PRO", e))?;
            Ok(Schema::Projectile)
        }
    }
}

/// Version of an item buffer, used by the item schema to pick its layout.
pub(crate) fn item_version(buffer: &[u8]) -> error::Result<ItemVersion> {
    let version = buffer
        .get(4..)
        .ok_or_else(|| error::StructError::malformed("ITM", "buffer too short for header"))?;
    parse_item_version(version)
        .map(|(_, v)| v)
        .map_err(|e| to_struct_error("ITM", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_known_signatures() {
        assert_eq!(detect(b"ITM V1  ....").unwrap(), Schema::Item);
        assert_eq!(detect(b"ITM v1.1").unwrap(), Schema::Item);
        assert_eq!(detect(b"PRO V1.0").unwrap(), Schema::Projectile);
    }

    #[test]
    fn rejects_unknown_headers() {
        assert!(detect(b"SPL V1  ").is_err());
        assert!(detect(b"ITM V3.0").is_err());
        assert!(detect(b"ITM").is_err());
    }

    #[test]
    fn item_versions() {
        assert_eq!(item_version(b"ITM V2.0").unwrap(), ItemVersion::V20);
        assert_eq!(item_version(b"ITM V1  ").unwrap(), ItemVersion::V1);
        match parse_item_version(b"V9.9") {
            Err(Err::Failure(RecordParseError::UnknownVersion(v))) => assert_eq!(&v, b"V9.9"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
