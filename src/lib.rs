//! # iestruct - A crate for editing Infinity Engine binary resources
//!
//! ## Example
//!
//! ```ignore
//! use iestruct::{Context, Document, Schema, TableCache};
//!
//! /// Adds an empty effect to the first ability of an item and saves it
//! fn main() -> iestruct::Result<()> {
//!     let ctx = Context::new(TableCache::global());
//!     let data = std::fs::read("sw1h01.itm")?;
//!     let mut item = Document::from_bytes(&data, &ctx)?;
//!
//!     let ability = item.section(item.root(), Schema::Ability)[0];
//!     let effect = item.push(ability, Schema::Effect, &ctx)?;
//!     item.set_value(effect, "Type", 12)?;
//!
//!     std::fs::write("sw1h01.itm", item.to_bytes()?)?;
//!     Ok(())
//! }
//! ```
//!
//! ## The resources
//!
//! Infinity Engine resources are little-endian C structs written one after the other. A record
//! has a fixed region of typed fields, and may point at repeated sub-records through a pair of
//! fields: an offset (or an index into a shared list) and a count. An item, for example, looks
//! like this (in Rust-like syntax):
//!
//! ```ignore
//! struct Item {
//!     signature: [u8; 4] = "ITM ",
//!     version: [u8; 4] = "V1  ",
//!     //[... other ommited properties ...]
//!     abilities_offset: u32 = 114,
//!     num_abilities: u16 = 1,
//!     effects_offset: u32 = 170,
//!     first_effect_index: u16 = 0,
//!     num_global_effects: u16 = 2,
//! }
//! // followed by `num_abilities` abilities at `abilities_offset`, each of which points at
//! // its own run of effects inside the list at `effects_offset`.
//! ```
//!
//! ## This crate
//!
//! [`Document`] reads a buffer into a tree of records ([`StructNode`]) holding typed
//! [`Field`]s. The tree can be edited: elements are inserted and removed with every offset,
//! count and index that depends on them repaired, and plain values are set in place. Writing an
//! unmodified document reproduces the input byte for byte.
//!
//! Layouts that depend on the game are resolved through a [`Context`]: the [`Profile`] says
//! whether Enhanced Edition layouts apply, and the [`TableCache`] answers which resources exist
//! and what symbolic IDS values mean.
//!
//! ### Supported resources
//!
//! * ITM V1, V1.1 and V2.0, with abilities and effects.
//! * PRO V1.0, with the projectile info and area effect records.
//! * Modron maze entries from PST saves (read with [`Schema::MazeEntry`]).

pub mod error;
pub mod parsers;
pub mod profile;
pub mod runtime;
pub mod schema;
pub mod tables;

pub use error::{Result, StructError};
pub use profile::{Context, Profile};
pub use runtime::{
    field::{Field, FieldKind},
    Document, DocumentDisplay, NodeId, StructNode,
};
pub use schema::Schema;
pub use tables::{IdsTable, MemorySource, RefList, TableCache, TableSource};
