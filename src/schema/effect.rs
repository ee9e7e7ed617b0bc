use super::{Labels, Layout, RecordSchema};
use crate::{error::Result, runtime::read::NodeReader};

const OPCODES: Labels = &[
    "AC bonus", "Modify attacks per round", "Cure sleep", "Berserk", "Cure berserk",
    "Charm creature", "Charisma bonus", "Set color", "Set color glow solid",
    "Set color glow pulse", "Constitution bonus", "Cure poison", "Damage", "Kill target",
    "Defrost", "Dexterity bonus", "Haste", "Current HP bonus", "Maximum HP bonus",
    "Intelligence bonus", "Invisibility", "Lore bonus", "Luck bonus", "Reset morale",
    "Panic", "Poison", "Remove curse", "Acid resistance bonus", "Cold resistance bonus",
    "Electricity resistance bonus", "Fire resistance bonus", "Magic damage resistance bonus",
    "Raise dead", "Save vs. death bonus", "Save vs. wand bonus", "Save vs. polymorph bonus",
    "Save vs. breath bonus", "Save vs. spell bonus", "Silence", "Sleep", "Slow",
    "Sparkle", "Bonus wizard spells", "Stone to flesh", "Strength bonus", "Stun",
    "Cure stun", "Remove invisibility", "Vocalize", "Wisdom bonus",
];
const TARGETS: Labels = &[
    "None", "Self", "Preset target", "Party", "Everyone", "Everyone except party",
    "Caster group", "Target group", "Everyone except self", "Original caster",
];
const TIMING: Labels = &[
    "Instant/Limited", "Instant/Permanent until death", "Instant/While equipped",
    "Delay/Limited", "Delay/Permanent", "Delay/While equipped", "Limited after duration",
    "Permanent after duration", "Equipped after duration", "Instant/Permanent",
    "Instant/Limited (ticks)",
];
const RESISTANCE: Labels = &[
    "No dispel/bypass resistance", "Dispel/Not bypass resistance",
    "Not dispel/bypass resistance", "Dispel/Bypass resistance",
];
const SAVE_TYPES: Labels = &[
    "No save", "Spell", "Breath weapon", "Paralyze/Poison/Death", "Rod/Staff/Wand",
    "Petrify/Polymorph",
];

/// A single opcode application in the short (48 byte) form used by items.
pub struct EffectSchema;

impl RecordSchema for EffectSchema {
    fn name(&self) -> &'static str {
        "Effect"
    }

    fn read(&self, _layout: &Layout, r: &mut NodeReader) -> Result<()> {
        r.bitmap(0x00, 2, "Type", OPCODES)?;
        r.bitmap(0x02, 1, "Target", TARGETS)?;
        r.unsigned(0x03, 1, "Power")?;
        r.number(0x04, 4, "Parameter 1")?;
        r.number(0x08, 4, "Parameter 2")?;
        r.bitmap(0x0C, 1, "Timing mode", TIMING)?;
        r.bitmap(0x0D, 1, "Dispel/Resistance", RESISTANCE)?;
        r.unsigned(0x0E, 4, "Duration")?;
        r.unsigned(0x12, 1, "Probability 1")?;
        r.unsigned(0x13, 1, "Probability 2")?;
        r.resref(0x14, "Resource", &["SPL", "ITM", "VVC", "BAM", "EFF", "CRE"])?;
        r.unsigned(0x1C, 4, "# dice thrown/maximum level")?;
        r.unsigned(0x20, 4, "Dice size/minimum level")?;
        r.flag(0x24, 4, "Save type", SAVE_TYPES)?;
        r.number(0x28, 4, "Save penalty")?;
        r.number(0x2C, 4, "Special")?;
        Ok(())
    }

    fn declared_len(&self, _layout: &Layout) -> usize {
        48
    }
}
