#![allow(dead_code)]

use byteorder::{ByteOrder, LittleEndian};
use iestruct::{Context, MemorySource, Profile, TableCache};

pub const V1: &[u8; 4] = b"V1  ";
pub const V11: &[u8; 4] = b"V1.1";
pub const V20: &[u8; 4] = b"V2.0";

pub fn item_header_len(version: &[u8; 4]) -> usize {
    match version {
        b"V1.1" => 154,
        b"V2.0" => 130,
        _ => 114,
    }
}

/// An item with one ability per entry of `ability_effects`, each owning that many effects, and
/// `globals` global effects. Abilities follow the header, effects follow the abilities with the
/// global effects first. Ability `i` has range `10 * (i + 1)` and effect `k` of the pool has
/// type `k + 1`, so records can be told apart after edits.
pub fn item(version: &[u8; 4], ability_effects: &[usize], globals: usize) -> Vec<u8> {
    let header = item_header_len(version);
    let abilities = ability_effects.len();
    let total: usize = globals + ability_effects.iter().sum::<usize>();
    let effects_offset = header + abilities * 56;

    let mut data = vec![0u8; effects_offset + total * 48];
    data[0..4].copy_from_slice(b"ITM ");
    data[4..8].copy_from_slice(version);
    LittleEndian::write_u32(&mut data[52..56], 1000);
    LittleEndian::write_u32(&mut data[100..104], header as u32);
    LittleEndian::write_u16(&mut data[104..106], abilities as u16);
    LittleEndian::write_u32(&mut data[106..110], effects_offset as u32);
    LittleEndian::write_u16(&mut data[110..112], 0);
    LittleEndian::write_u16(&mut data[112..114], globals as u16);

    let mut first = globals;
    for (i, count) in ability_effects.iter().enumerate() {
        let at = header + i * 56;
        LittleEndian::write_u16(&mut data[at + 0x0E..at + 0x10], 10 * (i as u16 + 1));
        LittleEndian::write_u16(&mut data[at + 0x1E..at + 0x20], *count as u16);
        LittleEndian::write_u16(&mut data[at + 0x20..at + 0x22], first as u16);
        first += count;
    }

    for k in 0..total {
        let at = effects_offset + k * 48;
        LittleEndian::write_u16(&mut data[at..at + 2], k as u16 + 1);
    }
    data
}

pub fn set_u16(data: &mut [u8], at: usize, value: u16) {
    LittleEndian::write_u16(&mut data[at..at + 2], value);
}

pub fn set_u32(data: &mut [u8], at: usize, value: u32) {
    LittleEndian::write_u32(&mut data[at..at + 4], value);
}

pub fn u16_at(data: &[u8], at: usize) -> u16 {
    LittleEndian::read_u16(&data[at..at + 2])
}

pub fn u32_at(data: &[u8], at: usize) -> u32 {
    LittleEndian::read_u32(&data[at..at + 4])
}

/// A projectile of the given type with zeroed trailing records.
pub fn projectile(kind: u16) -> Vec<u8> {
    let len = match kind {
        2 => 512,
        3 => 768,
        _ => 256,
    };
    let mut data = vec![0u8; len];
    data[0..4].copy_from_slice(b"PRO ");
    data[4..8].copy_from_slice(b"V1.0");
    set_u16(&mut data, 8, kind);
    data
}

pub fn maze_entry(walls: u16, trap: u32) -> Vec<u8> {
    let mut data = vec![0u8; 26];
    set_u32(&mut data, 4, 1);
    set_u32(&mut data, 16, trap);
    set_u16(&mut data, 20, walls);
    data
}

/// Tables of a BG2 install: kits exist, proficiencies come from PROFTYPE.IDS.
pub fn bg2_tables() -> TableCache {
    TableCache::with_source(
        MemorySource::new()
            .with_resource("KIT.IDS")
            .with_table("PROFTYPE.IDS", "89 BASTARDSWORD\n90 LONGSWORD\n")
            .with_table("MISSILE.IDS", "IDS V1.0\n2 Arrow\n3 Arrow Exploding\n")
            .with_table("PROJECTL.IDS", "1 arrow\n3 fireball\n"),
    )
}

pub fn ctx(tables: &TableCache) -> Context {
    Context::new(tables)
}

pub fn ee_ctx(tables: &TableCache) -> Context {
    Context::new(tables).with_profile(Profile::new().with_enhanced_edition(true))
}
