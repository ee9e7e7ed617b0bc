//! Record schemas.
//!
//! A schema describes one kind of record: the fields it reads, how long its fixed region is, and
//! which repeated sections, flattened pools and embedded sub-records hang off it. Schemas are
//! plain data and functions; the generic reading, writing and editing logic lives in
//! [`crate::runtime`].

mod ability;
mod area;
mod effect;
mod item;
mod maze;
mod projectile;

pub use self::{
    area::AreaEffectSchema, item::ItemSchema, maze::MazeEntrySchema,
    projectile::{ProjectileInfoSchema, ProjectileSchema},
};
pub use self::{ability::AbilitySchema, effect::EffectSchema};

use crate::{error::Result, parsers::header::ItemVersion, profile::Context, runtime::read::NodeReader};
use std::fmt;

pub type Labels = &'static [&'static str];

/// Behaviour shared by every record kind.
pub trait RecordSchema: Sync {
    fn name(&self) -> &'static str;

    /// Picks the layout variant for the record starting at `offset`. Called once per record,
    /// before any field is read.
    fn resolve(&self, _buffer: &[u8], _offset: usize, _ctx: &Context) -> Result<Layout> {
        Ok(Layout::Plain)
    }

    fn read(&self, layout: &Layout, reader: &mut NodeReader) -> Result<()>;

    /// Length of the fixed region for `layout`.
    fn declared_len(&self, layout: &Layout) -> usize;

    fn removable(&self) -> bool {
        true
    }

    fn sections(&self, _layout: &Layout) -> &'static [SectionSpec] {
        &[]
    }

    fn pools(&self, _layout: &Layout) -> &'static [PoolSpec] {
        &[]
    }

    fn embedded(&self, _layout: &Layout) -> &'static [EmbeddedSpec] {
        &[]
    }
}

/// Every record kind known to the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Schema {
    Item,
    Ability,
    Effect,
    Projectile,
    ProjectileInfo,
    AreaEffect,
    MazeEntry,
}

impl Schema {
    pub fn def(self) -> &'static dyn RecordSchema {
        match self {
            Schema::Item => &ItemSchema,
            Schema::Ability => &AbilitySchema,
            Schema::Effect => &EffectSchema,
            Schema::Projectile => &ProjectileSchema,
            Schema::ProjectileInfo => &ProjectileInfoSchema,
            Schema::AreaEffect => &AreaEffectSchema,
            Schema::MazeEntry => &MazeEntrySchema,
        }
    }

    pub fn name(self) -> &'static str {
        self.def().name()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The layout variant a record was read with. Resolved once from the discriminants and the
/// profile, then kept on the node so edits and writes use the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Plain,
    Edition { enhanced: bool },
    Item(ItemLayout),
    Projectile(ProjectileLayout),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemLayout {
    pub version: ItemVersion,
    pub enhanced: bool,
    /// `KIT.IDS` exists: bytes 40..50 hold one-byte stats interleaved with kit usability flags.
    pub kit_usability: bool,
    pub proficiency: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileKind {
    /// Type 1: header only.
    Plain,
    /// Type 2: header and projectile info.
    Single,
    /// Type 3: header, projectile info and area effect.
    Area,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectileLayout {
    pub kind: ProjectileKind,
    pub enhanced: bool,
}

/// How a repeated section finds its first element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// A `SectionOffset` field of the owner holds the byte offset of the first element.
    Offset(&'static str),
    /// An `ElementIndex` field of the owner holds the index of the first element in `pool`,
    /// a flattened collection owned by the record itself or one of its ancestors.
    Index {
        field: &'static str,
        pool: &'static str,
    },
}

/// A repeated sub-record list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpec {
    pub element: Schema,
    /// Name of the `SectionCount` field in the owner.
    pub count: &'static str,
    pub stride: usize,
    pub anchor: Anchor,
}

impl SectionSpec {
    pub fn pool(&self) -> Option<&'static str> {
        match self.anchor {
            Anchor::Index { pool, .. } => Some(pool),
            Anchor::Offset(_) => None,
        }
    }

    pub fn anchor_field(&self) -> &'static str {
        match self.anchor {
            Anchor::Offset(field) => field,
            Anchor::Index { field, .. } => field,
        }
    }
}

/// A flattened element list shared by the index-anchored sections of its owner's subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSpec {
    pub name: &'static str,
    /// Name of the `SectionOffset` field in the owner.
    pub offset: &'static str,
    pub stride: usize,
}

/// A single sub-record at a fixed offset from the start of its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedSpec {
    pub schema: Schema,
    pub offset: usize,
}
