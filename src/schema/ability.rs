use super::{item::EFFECTS_POOL, Anchor, Labels, Layout, RecordSchema, Schema, SectionSpec};
use crate::{error::Result, runtime::read::NodeReader, tables::RefList};

pub const NUM_EFFECTS: &str = "# effects";
pub const FIRST_EFFECT_INDEX: &str = "First effect index";

static SECTIONS: [SectionSpec; 1] = [SectionSpec {
    element: Schema::Effect,
    count: NUM_EFFECTS,
    stride: 48,
    anchor: Anchor::Index {
        field: FIRST_EFFECT_INDEX,
        pool: EFFECTS_POOL,
    },
}];

const ATTACK_TYPES: Labels = &["None", "Melee", "Ranged", "Magical", "Launcher"];
const IDENTIFY: Labels = &["No", "Yes"];
const LOCATIONS: Labels = &["None", "Weapon", "Spell", "Equipment", "Innate"];
const TARGETS: Labels = &[
    "Invalid", "Living actor", "Inventory", "Dead actor", "Any point within range", "Caster",
    "Crash game", "Caster (keep spell, no animation)",
];
const LAUNCHERS: Labels = &["None", "Bow", "Crossbow", "Sling"];
const DAMAGE_TYPES: Labels = &[
    "None", "Piercing", "Crushing", "Slashing", "Missile", "Fist", "Piercing/Crushing (better)",
    "Piercing/Slashing (better)", "Crushing/Slashing (worse)", "Blunt missile",
];
const DRAINED: Labels = &["Item remains", "Item vanishes", "Replace with used up", "Item recharges"];
const ABILITY_FLAGS: Labels = &[
    "None", "Add strength bonus", "Breakable", "EE: Damage strength bonus",
    "EE: THAC0 strength bonus", "", "", "", "", "", "", "Hostile", "Recharge after resting", "",
    "", "", "", "Bypass armor", "Keen edge",
];

/// One usable ability of an item: melee swing, ranged attack, magical charge and so on.
pub struct AbilitySchema;

impl RecordSchema for AbilitySchema {
    fn name(&self) -> &'static str {
        "Ability"
    }

    fn read(&self, _layout: &Layout, r: &mut NodeReader) -> Result<()> {
        r.bitmap(0x00, 1, "Type", ATTACK_TYPES)?;
        r.bitmap(0x01, 1, "Identify to use?", IDENTIFY)?;
        r.bitmap(0x02, 1, "Ability location", LOCATIONS)?;
        r.unsigned(0x03, 1, "Alternate dice size")?;
        r.resref(0x04, "Icon", &["BAM"])?;
        r.bitmap(0x0C, 1, "Target", TARGETS)?;
        r.unsigned(0x0D, 1, "# targets")?;
        r.unsigned(0x0E, 2, "Range (feet)")?;
        r.bitmap(0x10, 1, "Launcher required", LAUNCHERS)?;
        r.unsigned(0x11, 1, "Alternate # dice thrown")?;
        r.unsigned(0x12, 1, "Speed")?;
        r.number(0x13, 1, "Alternate damage bonus")?;
        r.number(0x14, 2, "Bonus to hit")?;
        r.unsigned(0x16, 1, "Dice size")?;
        r.unsigned(0x17, 1, "Primary type (school)")?;
        r.unsigned(0x18, 1, "# dice thrown")?;
        r.unsigned(0x19, 1, "Secondary type")?;
        r.number(0x1A, 2, "Damage bonus")?;
        r.bitmap(0x1C, 2, "Damage type", DAMAGE_TYPES)?;
        r.section_count(0x1E, 2, NUM_EFFECTS)?;
        r.element_index(0x20, 2, FIRST_EFFECT_INDEX)?;
        r.unsigned(0x22, 2, "# charges")?;
        r.bitmap(0x24, 2, "When drained", DRAINED)?;
        r.flag(0x26, 4, "Flags", ABILITY_FLAGS)?;
        r.projectile(0x2A, "Projectile", RefList::Missile)?;
        r.number(0x2C, 2, "Animation: Overhand swing %")?;
        r.number(0x2E, 2, "Animation: Backhand swing %")?;
        r.number(0x30, 2, "Animation: Thrust %")?;
        r.unsigned(0x32, 2, "Is arrow?")?;
        r.unsigned(0x34, 2, "Is bolt?")?;
        r.unsigned(0x36, 2, "Is bullet?")?;
        Ok(())
    }

    fn declared_len(&self, _layout: &Layout) -> usize {
        56
    }

    fn sections(&self, _layout: &Layout) -> &'static [SectionSpec] {
        &SECTIONS
    }
}
