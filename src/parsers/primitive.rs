//! Little-endian integer codecs. Every numeric field in the supported formats is 1, 2 or 4 bytes
//! wide and stored little-endian.

use byteorder::{ByteOrder, LittleEndian};
use nom::{
    bytes::complete::take,
    number::complete::{le_i16, le_i32, le_i8, le_u16, le_u32, le_u8},
};

/// Returns `len` bytes starting at `offset`, or `None` if the buffer is too short.
pub fn slice_at(buffer: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    let rest = buffer.get(offset..)?;
    take::<usize, &[u8], ()>(len)(rest)
        .ok()
        .map(|(_, bytes)| bytes)
}

pub fn parse_unsigned(slice: &[u8]) -> Option<u64> {
    let parsed = match slice.len() {
        1 => le_u8::<()>(slice).map(|(_, v)| u64::from(v)),
        2 => le_u16::<()>(slice).map(|(_, v)| u64::from(v)),
        4 => le_u32::<()>(slice).map(|(_, v)| u64::from(v)),
        _ => return None,
    };
    parsed.ok()
}

pub fn parse_signed(slice: &[u8]) -> Option<i64> {
    let parsed = match slice.len() {
        1 => le_i8::<()>(slice).map(|(_, v)| i64::from(v)),
        2 => le_i16::<()>(slice).map(|(_, v)| i64::from(v)),
        4 => le_i32::<()>(slice).map(|(_, v)| i64::from(v)),
        _ => return None,
    };
    parsed.ok()
}

/// Whether `value` is representable in `width` bytes.
pub fn fits(width: usize, signed: bool, value: i64) -> bool {
    if width == 0 || width > 4 {
        return false;
    }
    let bits = 8 * width as u32;
    if signed {
        let max = (1_i64 << (bits - 1)) - 1;
        let min = -(1_i64 << (bits - 1));
        value >= min && value <= max
    } else {
        value >= 0 && value < (1_i64 << bits)
    }
}

/// Stores `value` into `data` using the slice length as width. Callers check `fits` first.
pub fn encode(data: &mut [u8], value: i64) {
    match data.len() {
        1 => data[0] = value as u8,
        2 => LittleEndian::write_u16(data, value as u16),
        4 => LittleEndian::write_u32(data, value as u32),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_signed_and_unsigned_widths() {
        assert_eq!(parse_unsigned(&[0xff]), Some(255));
        assert_eq!(parse_signed(&[0xff]), Some(-1));
        assert_eq!(parse_unsigned(&[0x72, 0x00]), Some(0x72));
        assert_eq!(parse_signed(&[0xfe, 0xff, 0xff, 0xff]), Some(-2));
        assert_eq!(parse_unsigned(&[0, 0, 0]), None);
    }

    #[test]
    fn range_checks_follow_width() {
        assert!(fits(1, false, 255));
        assert!(!fits(1, false, 256));
        assert!(fits(2, true, -32768));
        assert!(!fits(2, true, 32768));
        assert!(!fits(4, false, -1));
        assert!(fits(4, false, u32::max_value() as i64));
    }

    #[test]
    fn encode_wraps_negative_values() {
        let mut data = [0u8; 2];
        encode(&mut data, -1);
        assert_eq!(data, [0xff, 0xff]);
        let mut data = [0u8; 4];
        encode(&mut data, 0x0102_0304);
        assert_eq!(data, [4, 3, 2, 1]);
    }

    #[test]
    fn slicing_stops_at_buffer_end() {
        let buffer = [1u8, 2, 3];
        assert_eq!(slice_at(&buffer, 1, 2), Some(&buffer[1..3]));
        assert_eq!(slice_at(&buffer, 2, 2), None);
        assert_eq!(slice_at(&buffer, 5, 0), None);
    }
}
