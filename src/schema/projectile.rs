//! PRO: projectiles. The projectile type at offset 8 decides which of the two trailing 256 byte
//! records follow the header.

use super::{
    EmbeddedSpec, Labels, Layout, ProjectileKind, ProjectileLayout, RecordSchema, Schema,
};
use crate::{
    error::{Result, StructError},
    parsers::{header, primitive::parse_unsigned, to_struct_error, RecordParseError},
    profile::Context,
    runtime::read::NodeReader,
};
use nom::Err;

pub const PROJECTILE_TYPE: &str = "Projectile type";

static INFO: [EmbeddedSpec; 1] = [EmbeddedSpec {
    schema: Schema::ProjectileInfo,
    offset: 256,
}];

static INFO_AND_AREA: [EmbeddedSpec; 2] = [
    EmbeddedSpec {
        schema: Schema::ProjectileInfo,
        offset: 256,
    },
    EmbeddedSpec {
        schema: Schema::AreaEffect,
        offset: 512,
    },
];

const TYPES: Labels = &["", "No BAM", "Single target", "Area of effect"];
const FLAGS: Labels = &[
    "No flags set", "Show sparks", "Use height", "Loop fire sound", "Loop impact sound",
    "Ignore center", "Draw as background",
];
const EXTENDED_FLAGS: Labels = &[
    "No flags set", "Bounce from walls", "Pass target", "Draw center VVC once", "Hit immediately",
    "Face target", "Curved path", "Start random frame", "Pillar", "Semi-trans. trail puff VEF",
    "Tinted trail puff VEF", "Multiple proj.", "Default spell on missed", "Falling path",
    "Comet", "Lined up AoE", "Rectangular AoE", "Draw behind target", "Casting glow effect",
    "Travel door", "Stop/fade after hit", "Display message", "Random path", "Start random seq.",
    "Color pulse on hit", "Touch hit", "Negate IDS1", "Negate IDS2", "Use either IDS",
    "Delayed payload", "Limited path count", "IWD style check", "Caster affected",
];
const INFO_FLAGS: Labels = &[
    "No flags set", "Enable BAM coloring", "Create smoke", "Colored smoke",
    "Not light source", "Modify for height", "Casts shadow", "Light spot enabled",
    "Translucent", "Mid-level brighten", "Blended",
];
const TRAIL_FLAGS: Labels = &["No flags set", "Draw at target", "Draw at source"];

fn projectile_kind(value: u64) -> Option<ProjectileKind> {
    match value {
        1 => Some(ProjectileKind::Plain),
        2 => Some(ProjectileKind::Single),
        3 => Some(ProjectileKind::Area),
        _ => None,
    }
}

fn layout(layout: &Layout) -> ProjectileLayout {
    match layout {
        Layout::Projectile(projectile) => *projectile,
        _ => ProjectileLayout {
            kind: ProjectileKind::Plain,
            enhanced: false,
        },
    }
}

pub struct ProjectileSchema;

impl RecordSchema for ProjectileSchema {
    fn name(&self) -> &'static str {
        "Projectile"
    }

    fn resolve(&self, buffer: &[u8], offset: usize, ctx: &Context) -> Result<Layout> {
        let input = buffer.get(offset..).unwrap_or(&[]);
        header::parse_projectile_version(input.get(4..).unwrap_or(&[]))
            .map_err(|e| to_struct_error(self.name(), e))?;

        let raw = input
            .get(8..10)
            .and_then(parse_unsigned)
            .ok_or_else(|| StructError::malformed(self.name(), "buffer too short for header"))?;
        let kind = projectile_kind(raw).ok_or_else(|| {
            to_struct_error(
                self.name(),
                Err::Failure(RecordParseError::UnknownDiscriminant(raw as i64)),
            )
        })?;

        Ok(Layout::Projectile(ProjectileLayout {
            kind,
            enhanced: ctx.is_enhanced_edition(),
        }))
    }

    fn read(&self, resolved: &Layout, r: &mut NodeReader) -> Result<()> {
        let projectile = layout(resolved);

        r.text(0x00, 4, "Signature")?;
        r.text(0x04, 4, "Version")?;
        r.bitmap(0x08, 2, PROJECTILE_TYPE, TYPES)?;
        r.mark_discriminant();
        r.unsigned(0x0A, 2, "Speed")?;
        r.flag(0x0C, 4, "Behavior", FLAGS)?;
        r.resref(0x10, "Fire sound", &["WAV"])?;
        r.resref(0x18, "Impact sound", &["WAV"])?;
        r.resref(0x20, "Source animation", &["VVC", "BAM"])?;
        r.ids_bitmap(0x28, 2, "Particle color", "PARTICLE.IDS")?;

        if projectile.enhanced {
            r.unsigned(0x2A, 2, "Projectile width")?;
            r.flag(0x2C, 4, "Extended flags", EXTENDED_FLAGS)?;
            r.strref(0x30, "Message")?;
            r.color(0x34, 4, "Pulse color")?;
            r.unsigned(0x38, 2, "Color speed")?;
            r.unsigned(0x3A, 2, "Screen shake amount")?;
            r.unsigned(0x3C, 2, "Creature value 1")?;
            r.unsigned(0x3E, 2, "Creature type 1")?;
            r.unsigned(0x40, 2, "Creature value 2")?;
            r.unsigned(0x42, 2, "Creature type 2")?;
            r.resref(0x44, "Default spell", &["SPL"])?;
            r.resref(0x4C, "Success spell", &["SPL"])?;
            r.unsigned(0x54, 2, "Angle increase minimum")?;
            r.unsigned(0x56, 2, "Angle increase maximum")?;
            r.unsigned(0x58, 2, "Curve minimum")?;
            r.unsigned(0x5A, 2, "Curve maximum")?;
            r.unsigned(0x5C, 2, "THAC0 bonus")?;
            r.unsigned(0x5E, 2, "THAC0 bonus (non-actor)")?;
            r.unsigned(0x60, 2, "Radius minimum")?;
            r.unsigned(0x62, 2, "Radius maximum")?;
            r.unknown(0x64, 156)?;
        } else {
            r.unknown(0x2A, 214)?;
        }
        Ok(())
    }

    fn declared_len(&self, _layout: &Layout) -> usize {
        256
    }

    fn removable(&self) -> bool {
        false
    }

    fn embedded(&self, resolved: &Layout) -> &'static [EmbeddedSpec] {
        match layout(resolved).kind {
            ProjectileKind::Plain => &[],
            ProjectileKind::Single => &INFO,
            ProjectileKind::Area => &INFO_AND_AREA,
        }
    }
}

/// Travel animation, smoke and trail settings of a single target or area projectile.
pub struct ProjectileInfoSchema;

impl RecordSchema for ProjectileInfoSchema {
    fn name(&self) -> &'static str {
        "Projectile info"
    }

    fn read(&self, _layout: &Layout, r: &mut NodeReader) -> Result<()> {
        r.flag(0, 4, "Flags", INFO_FLAGS)?;
        r.resref(4, "Projectile animation", &["BAM"])?;
        r.resref(12, "Shadow animation", &["BAM"])?;
        r.unsigned(20, 1, "Projectile animation number")?;
        r.unsigned(21, 1, "Shadow animation number")?;
        r.unsigned(22, 2, "Light spot intensity")?;
        r.unsigned(24, 2, "Light spot width")?;
        r.unsigned(26, 2, "Light spot height")?;
        r.resref(28, "Palette", &["BMP"])?;
        r.color(36, 1, "Projectile color 1")?;
        r.color(37, 1, "Projectile color 2")?;
        r.color(38, 1, "Projectile color 3")?;
        r.color(39, 1, "Projectile color 4")?;
        r.color(40, 1, "Projectile color 5")?;
        r.color(41, 1, "Projectile color 6")?;
        r.color(42, 1, "Projectile color 7")?;
        r.unsigned(43, 1, "Smoke puff period")?;
        r.color(44, 1, "Smoke color 1")?;
        r.color(45, 1, "Smoke color 2")?;
        r.color(46, 1, "Smoke color 3")?;
        r.color(47, 1, "Smoke color 4")?;
        r.color(48, 1, "Smoke color 5")?;
        r.color(49, 1, "Smoke color 6")?;
        r.color(50, 1, "Smoke color 7")?;
        r.unsigned(51, 1, "Animation granularity")?;
        r.ids_bitmap(52, 2, "Smoke animation", "ANIMATE.IDS")?;
        r.resref(54, "Trailing animation 1", &["BAM"])?;
        r.resref(62, "Trailing animation 2", &["BAM"])?;
        r.resref(70, "Trailing animation 3", &["BAM"])?;
        r.unsigned(78, 2, "Trailing animation delay 1")?;
        r.unsigned(80, 2, "Trailing animation delay 2")?;
        r.unsigned(82, 2, "Trailing animation delay 3")?;
        r.flag(84, 4, "Trail flags", TRAIL_FLAGS)?;
        r.unknown(88, 168)?;
        Ok(())
    }

    fn declared_len(&self, _layout: &Layout) -> usize {
        256
    }

    fn removable(&self) -> bool {
        false
    }
}
