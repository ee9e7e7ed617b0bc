use super::{Labels, Layout, RecordSchema};
use crate::{
    error::Result,
    profile::Context,
    runtime::{field::FieldKind, read::NodeReader},
    tables::RefList,
};

const AREA_FLAGS: Labels = &[
    "Trap not visible", "Trap visible", "Triggered by inanimates", "Triggered by condition",
    "Delayed trigger", "Secondary projectile", "Fragments", "Not affecting allies",
    "Not affecting enemies", "Mage-level duration", "Cleric-level duration", "Draw animation",
    "Cone-shaped", "Ignore visibility", "Delayed explosion", "Skip first condition",
    "Single target",
];

const AREA_FLAGS_EX: Labels = &[
    "No flags set", "Paletted ring", "Random speed", "Start scattered", "Paletted center",
    "Repeat scattering", "Paletted animation", "", "", "", "Oriented fireball puffs",
    "Use hit dice lookup", "", "", "Blend are/ring anim", "Glow area/ring anim",
    "Hit point limit",
];

const EXPLOSIONS: &[(i64, &str)] = &[
    (0, "Fireball"),
    (1, "Stinking cloud"),
    (2, "Cloudkill"),
    (3, "Ice storm"),
    (4, "Grease"),
    (5, "Web"),
    (6, "Meteor"),
    (7, "Horrid wilting"),
    (8, "Teleport field"),
    (9, "Entangle"),
    (10, "Color spray"),
    (11, "Cone of cold"),
    (12, "Holy smite"),
    (13, "Unholy blight"),
    (14, "Prismatic spray"),
    (15, "Red dragon blast"),
    (16, "Storm of vengeance"),
    (17, "Purple fireball"),
    (18, "Green dragon blast"),
    (254, "Custom"),
    (255, "None"),
];

/// Area of effect settings of a type 3 projectile. Always present in those, so it cannot be
/// removed.
pub struct AreaEffectSchema;

fn enhanced(layout: &Layout) -> bool {
    match layout {
        Layout::Edition { enhanced } => *enhanced,
        _ => false,
    }
}

impl RecordSchema for AreaEffectSchema {
    fn name(&self) -> &'static str {
        "Area effect info"
    }

    fn resolve(&self, _buffer: &[u8], _offset: usize, ctx: &Context) -> Result<Layout> {
        Ok(Layout::Edition {
            enhanced: ctx.is_enhanced_edition(),
        })
    }

    fn read(&self, layout: &Layout, r: &mut NodeReader) -> Result<()> {
        let animations: Labels = if enhanced(layout) {
            &["VVC", "BAM"]
        } else {
            &["VEF", "VVC", "BAM"]
        };

        r.flag(0, 2, "Area flags", AREA_FLAGS)?;
        r.number(2, 2, "Ray count")?;
        r.number(4, 2, "Trap size")?;
        r.number(6, 2, "Explosion size")?;
        r.resref(8, "Explosion sound", &["WAV"])?;
        r.number(16, 2, "Explosion frequency (frames)")?;
        r.ids_bitmap(18, 2, "Fragment animation", "ANIMATE.IDS")?;
        r.projectile(20, "Secondary projectile", RefList::Projectile)?;
        r.number(22, 1, "# repetitions")?;
        r.hash_bitmap(23, 1, "Explosion effect", EXPLOSIONS)?;
        r.color(24, 1, "Explosion color")?;
        r.add(25, 1, "Unused", FieldKind::Unknown)?;
        r.projectile(26, "Explosion projectile", RefList::Missile)?;
        r.resref(28, "Explosion animation", animations)?;
        r.number(36, 2, "Cone width")?;

        if enhanced(layout) {
            r.unknown(38, 2)?;
            r.resref(40, "Spread animation", animations)?;
            r.resref(48, "Ring animation", animations)?;
            r.resref(56, "Area sound", &["WAV"])?;
            r.flag(64, 4, "Extended flags", AREA_FLAGS_EX)?;
            r.unsigned(68, 2, "# dice for multiple targets")?;
            r.unsigned(70, 2, "Dice size for multiple targets")?;
            r.number(72, 2, "Animation granularity")?;
            r.number(74, 2, "Animation granularity divider")?;
            r.unknown(76, 180)?;
        } else {
            r.unknown(38, 218)?;
        }
        Ok(())
    }

    fn declared_len(&self, _layout: &Layout) -> usize {
        256
    }

    fn removable(&self) -> bool {
        false
    }
}
