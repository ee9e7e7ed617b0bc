//! ITM: items. Three revisions share the first 114 bytes, except for the block at 16..40 whose
//! meaning changes with the version and the game edition.

use super::{
    Anchor, ItemLayout, Labels, Layout, PoolSpec, RecordSchema, Schema, SectionSpec,
};
use crate::{
    error::Result,
    parsers::header::{self, ItemVersion},
    profile::Context,
    runtime::read::NodeReader,
};

pub const ABILITIES_OFFSET: &str = "Abilities offset";
pub const NUM_ABILITIES: &str = "# abilities";
pub const EFFECTS_OFFSET: &str = "Effects offset";
pub const FIRST_EFFECT_INDEX: &str = "First effect index";
pub const NUM_GLOBAL_EFFECTS: &str = "# global effects";

pub(super) const EFFECTS_POOL: &str = "effects";

static SECTIONS: [SectionSpec; 2] = [
    SectionSpec {
        element: Schema::Ability,
        count: NUM_ABILITIES,
        stride: 56,
        anchor: Anchor::Offset(ABILITIES_OFFSET),
    },
    SectionSpec {
        element: Schema::Effect,
        count: NUM_GLOBAL_EFFECTS,
        stride: 48,
        anchor: Anchor::Index {
            field: FIRST_EFFECT_INDEX,
            pool: EFFECTS_POOL,
        },
    },
];

static POOLS: [PoolSpec; 1] = [PoolSpec {
    name: EFFECTS_POOL,
    offset: EFFECTS_OFFSET,
    stride: 48,
}];

const CATEGORIES: Labels = &[
    "Miscellaneous", "Amulets and necklaces", "Armor", "Belts and girdles", "Boots", "Arrows",
    "Bracers and gauntlets", "Headgear", "Keys", "Potions", "Rings", "Scrolls", "Shields", "Food",
    "Bullets", "Bows", "Daggers", "Maces", "Slings", "Small swords", "Large swords", "Hammers",
    "Morning stars", "Flails", "Darts", "Axes", "Quarterstaves", "Crossbows",
    "Hand-to-hand weapons", "Spears", "Halberds", "Bolts", "Cloaks and robes", "Gold pieces",
    "Gems", "Wands", "Containers", "Books", "Familiars", "Tattoos", "Lenses", "Bucklers",
    "Candles", "Child bodies", "Clubs", "Female bodies", "Keys (old)", "Large shields",
    "Male bodies", "Medium shields", "Notes", "Rods", "Skulls", "Small shields", "Spider bodies",
    "Telescopes", "Bottles", "Greatswords", "Bags", "Furs and pelts", "Leather armor",
    "Studded leather", "Chain mail", "Splint mail", "Plate mail", "Full plate", "Hide armor",
    "Robes", "Scale mail", "Bastard swords", "Scarves", "Rations", "Hats", "Gloves",
];

const CATEGORIES_PST: Labels = &[
    "Miscellaneous", "Amulets and necklaces", "Armor", "Belts and girdles", "Boots", "Arrows",
    "Bracers and gauntlets", "Headgear", "Keys", "Potions", "Rings", "Scrolls", "Shields",
    "Spells", "Bullets", "Bows", "Daggers", "Maces", "Slings", "Small swords", "Large swords",
    "Hammers", "Morning stars", "Flails", "Darts", "Axes", "Quarterstaves", "Crossbows",
    "Hand-to-hand weapons", "Greatswords", "Halberds", "Bolts", "Cloaks and robes",
    "Copper commons", "Gems", "Wands", "Eyeballs", "Bracelets", "Earrings", "Tattoos", "Lenses",
    "Teeth",
];

const FLAGS: Labels = &[
    "None", "Unsellable", "Two-handed", "Droppable", "Displayable", "Cursed", "Not copyable",
    "Magical", "Left-handed", "Silver", "Cold iron", "Off-handed", "Conversable",
    "EE: Fake two-handed", "EE: Forbid off-hand weapon", "", "", "", "", "", "", "", "", "", "",
    "EE/Ex: Undispellable", "EE/Ex: Toggle critical hits",
];

const FLAGS_PST: Labels = &[
    "None", "Unsellable", "Two-handed", "Droppable", "Displayable", "Cursed", "Not copyable",
    "Magical", "Left-handed", "Silver", "Cold iron", "Steel", "Conversable", "Pulsating",
];

const USABILITY: Labels = &[
    "None",
    "Chaotic;Includes Chaotic Good, Chaotic Neutral and Chaotic Evil",
    "Evil;Includes Lawful Evil, Neutral Evil and Chaotic Evil",
    "Good;Includes Lawful Good, Neutral Good and Chaotic Good",
    "... Neutral;Includes Lawful Neutral, True Neutral and Chaotic Neutral",
    "Lawful;Includes Lawful Good, Lawful Neutral and Lawful Evil",
    "Neutral ...;Includes Neutral Good, True Neutral and Neutral Evil",
    "Bard", "Cleric", "Cleric-Mage", "Cleric-Thief", "Cleric-Ranger", "Fighter", "Fighter-Druid",
    "Fighter-Mage", "Fighter-Cleric", "Fighter-Mage-Cleric", "Fighter-Mage-Thief",
    "Fighter-Thief", "Mage", "Mage-Thief", "Paladin", "Ranger", "Thief", "Elf", "Dwarf",
    "Half-Elf", "Halfling", "Human", "Gnome", "Monk", "Druid", "Half-orc",
];

const USABILITY_PST: Labels = &[
    "None",
    "Chaotic;Includes Chaotic Good, Chaotic Neutral and Chaotic Evil",
    "Evil;Includes Lawful Evil, Neutral Evil and Chaotic Evil",
    "Good;Includes Lawful Good, Neutral Good and Chaotic Good",
    "... Neutral;Includes Lawful Neutral, True Neutral and Chaotic Neutral",
    "Lawful;Includes Lawful Good, Lawful Neutral and Lawful Evil",
    "Neutral ...;Includes Neutral Good, True Neutral and Neutral Evil",
    "Sensate", "Priest", "Godsman", "Anarchist", "Xaositect", "Fighter", "Non-aligned",
    "Fighter-Mage", "Dustman", "Mercykiller", "Indep", "Figher-Thief", "Mage", "Mage-Thief",
    "Dak'kon", "Fall-From-Grace", "Thief", "Vhailor", "Ignus", "Morte", "Nordom", "Human",
    "Annah", "", "Nameless One", "",
];

const USABILITY_IWD2: Labels = &[
    "None", "Barbarian", "Bard", "Cleric", "Druid", "Fighter", "Monk", "Paladin", "Ranger",
    "Rogue", "Sorcerer", "Wizard", "",
    "Chaotic;Includes Chaotic Good, Chaotic Neutral and Chaotic Evil",
    "Evil;Includes Lawful Evil, Neutral Evil and Chaotic Evil",
    "Good;Includes Lawful Good, Neutral Good and Chaotic Good",
    "... Neutral;Includes Lawful Neutral, True Neutral and Chaotic Neutral",
    "Lawful;Includes Lawful Good, Lawful Neutral and Lawful Evil",
    "Neutral ...;Includes Neutral Good, True Neutral and Neutral Evil",
    "", "", "", "", "", "Elf", "Dwarf", "Half-elf", "Halfling", "Human", "Gnome",
];

const KIT_USE_1: Labels = &[
    "None", "Cleric of talos", "Cleric of helm", "Cleric of lathander", "Totemic druid",
    "Shapeshifter", "Avenger", "Barbarian", "Wild mage",
];
const KIT_USE_2: Labels = &[
    "None", "Stalker", "Beastmaster", "Assassin", "Bounty hunter", "Swashbuckler", "Blade",
    "Jester", "Skald",
];
const KIT_USE_3: Labels = &[
    "None", "Diviner", "Enchanter", "Illusionist", "Invoker", "Necromancer", "Transmuter",
    "Generalist", "Archer",
];
const KIT_USE_4: Labels = &[
    "None", "Berserker", "Wizard slayer", "Kensai", "Cavalier", "Inquisitor", "Undead hunter",
    "Abjurer", "Conjurer",
];

const ANIM_TAGS: Labels = &[
    "  ", "2A", "3A", "4A", "2W", "3W", "4W", "AX", "BW", "CB", "CL", "D1", "D2", "D3", "D4",
    "DD", "FL", "FS", "H0", "H1", "H2", "H3", "H4", "H5", "H6", "HB", "MC", "MS", "QS", "S1",
    "S2", "S3", "SC", "SL", "SP", "SS", "WH",
];
const ANIM_LABELS: Labels = &[
    "None", "Leather armor", "Chain mail", "Plate mail", "Mage robe 1", "Mage robe 2",
    "Mage robe 3", "Battle axe", "Bow", "Crossbow", "Club", "Buckler", "Small shield",
    "Medium shield", "Large shield", "Dagger", "Flail", "Flaming sword", "Helmet 1", "Helmet 2",
    "Helmet 3", "Helmet 4", "Helmet 5", "Helmet 6", "Helmet 7", "Halberd", "Mace",
    "Morning star", "Quarterstaff", "Long sword", "Two-handed sword", "Katana", "Scimitar",
    "Sling", "Spear", "Short sword", "War hammer",
];

const ANIM_TAGS_PST: Labels = &["  ", "AX", "CB", "CL", "DD", "S1", "WH"];
const ANIM_LABELS_PST: Labels = &["None", "Axe", "Crossbow", "Club", "Dagger", "Sword", "Hammer"];

const ANIM_TAGS_EE: Labels = &[
    "  ", "2A", "3A", "4A", "2W", "3W", "4W", "AX", "BS", "BW", "C0", "C1", "C2", "C3", "C4",
    "C5", "C6", "C7", "CB", "CL", "D1", "D2", "D3", "D4", "DD", "F0", "F1", "F2", "F3", "FL",
    "FS", "GS", "H0", "H1", "H2", "H3", "H4", "H5", "H6", "HB", "J0", "J1", "J2", "J3", "J4",
    "J5", "J6", "J7", "J8", "J9", "JA", "JB", "JC", "M2", "MC", "MS", "Q2", "Q3", "Q4", "QS",
    "S0", "S1", "S2", "S3", "SC", "SL", "SP", "SS", "WH", "YW", "ZW",
];
const ANIM_LABELS_EE: Labels = &[
    "None", "Leather armor", "Chain mail", "Plate mail", "Mage robe 1", "Mage robe 2",
    "Mage robe 3", "Battle axe", "Bow?", "Bow", "Small shield (alternate 1)",
    "Medium shield (alternate 1)", "Large shield (alternate 1)", "Medium shield (alternate 2)",
    "Small shield (alternate 2)", "Large shield (alternate 2)", "Large shield (alternate 3)",
    "Medium shield (alternate 3)", "Crossbow", "Club", "Buckler", "Small shield",
    "Medium shield", "Large shield", "Dagger", "Flail (alternate 1)", "Flail (alternate 2)",
    "Flaming sword (blue)", "Flail (alternate 3)", "Flail", "Flaming sword", "Glowing staff",
    "Helmet 1", "Helmet 2", "Helmet 3", "Helmet 4", "Helmet 5", "Helmet 6", "Helmet 7",
    "Halberd", "Helmet 8", "Helmet 9", "Helmet 10", "Helmet 11", "Helmet 12", "Helmet 13",
    "Helmet 14", "Helmet 15", "Helmet 16", "Helmet 17", "Helmet 18", "Circlet", "Helmet 20",
    "Mace (alternate)", "Mace", "Morning star", "Quarterstaff (alternate 1)",
    "Quarterstaff (alternate 2)", "Quarterstaff (alternate 3)", "Quarterstaff", "Bastard sword",
    "Long sword", "Two-handed sword", "Katana", "Scimitar", "Sling", "Spear", "Short sword",
    "War hammer", "Wings?", "Feathered wings",
];

pub struct ItemSchema;

fn layout(layout: &Layout) -> ItemLayout {
    match layout {
        Layout::Item(item) => *item,
        _ => ItemLayout {
            version: ItemVersion::V1,
            enhanced: false,
            kit_usability: true,
            proficiency: "PROFTYPE.IDS",
        },
    }
}

impl RecordSchema for ItemSchema {
    fn name(&self) -> &'static str {
        "Item"
    }

    fn resolve(&self, buffer: &[u8], offset: usize, ctx: &Context) -> Result<Layout> {
        let version = header::item_version(buffer.get(offset..).unwrap_or(&[]))?;
        let proficiency = if ctx.resource_exists("PROFTYPE.IDS") {
            "PROFTYPE.IDS"
        } else {
            "STATS.IDS"
        };
        Ok(Layout::Item(ItemLayout {
            version,
            enhanced: ctx.is_enhanced_edition(),
            kit_usability: ctx.resource_exists("KIT.IDS"),
            proficiency,
        }))
    }

    fn read(&self, resolved: &Layout, r: &mut NodeReader) -> Result<()> {
        let item = layout(resolved);

        r.text(0, 4, "Signature")?;
        r.text(4, 4, "Version")?;
        r.mark_discriminant();
        r.strref(8, "General name")?;
        r.strref(12, "Identified name")?;

        if item.version == ItemVersion::V11 {
            r.resref(16, "Drop sound", &["WAV"])?;
            r.flag(24, 4, "Flags", FLAGS_PST)?;
            r.bitmap(28, 2, "Category", CATEGORIES_PST)?;
            r.flag(30, 4, "Unusable by", USABILITY_PST)?;
            r.text_bitmap(34, 2, "Equipped appearance", ANIM_TAGS_PST, ANIM_LABELS_PST)?;
        } else {
            r.resref(16, "Used up item", &["ITM"])?;
            r.flag(24, 4, "Flags", FLAGS)?;
            r.bitmap(28, 2, "Category", CATEGORIES)?;
            if item.version == ItemVersion::V20 {
                r.flag(30, 4, "Unusable by", USABILITY_IWD2)?;
            } else {
                r.flag(30, 4, "Unusable by", USABILITY)?;
            }
            if item.enhanced {
                r.text_bitmap(34, 2, "Equipped appearance", ANIM_TAGS_EE, ANIM_LABELS_EE)?;
            } else {
                r.text_bitmap(34, 2, "Equipped appearance", ANIM_TAGS, ANIM_LABELS)?;
            }
        }

        r.number(36, 2, "Minimum level")?;
        r.number(38, 2, "Minimum strength")?;
        if item.kit_usability {
            r.number(40, 1, "Minimum strength bonus")?;
            r.flag(41, 1, "Unusable by (1/4)", KIT_USE_1)?;
            r.number(42, 1, "Minimum intelligence")?;
            r.flag(43, 1, "Unusable by (2/4)", KIT_USE_2)?;
            r.number(44, 1, "Minimum dexterity")?;
            r.flag(45, 1, "Unusable by (3/4)", KIT_USE_3)?;
            r.number(46, 1, "Minimum wisdom")?;
            r.flag(47, 1, "Unusable by (4/4)", KIT_USE_4)?;
            r.number(48, 1, "Minimum constitution")?;
            r.ids_bitmap(49, 1, "Weapon proficiency", item.proficiency)?;
        } else {
            r.number(40, 2, "Minimum strength bonus")?;
            r.number(42, 2, "Minimum intelligence")?;
            r.number(44, 2, "Minimum dexterity")?;
            r.number(46, 2, "Minimum wisdom")?;
            r.number(48, 2, "Minimum constitution")?;
        }
        r.number(50, 2, "Minimum charisma")?;
        r.number(52, 4, "Price")?;
        r.number(56, 2, "Maximum in stack")?;
        r.resref(58, "Icon", &["BAM"])?;
        r.number(66, 2, "Lore to identify")?;
        r.resref(68, "Ground icon", &["BAM"])?;
        r.number(76, 4, "Weight")?;
        r.strref(80, "General description")?;
        r.strref(84, "Identified description")?;
        if item.version == ItemVersion::V11 {
            r.resref(88, "Pick up sound", &["WAV"])?;
        } else if item.enhanced {
            r.resref(88, "Description image", &["BAM", "BMP"])?;
        } else {
            r.resref(88, "Description image", &["BAM"])?;
        }
        r.number(96, 4, "Enchantment")?;
        r.section_offset(100, ABILITIES_OFFSET)?;
        r.section_count(104, 2, NUM_ABILITIES)?;
        r.section_offset(106, EFFECTS_OFFSET)?;
        r.element_index(110, 2, FIRST_EFFECT_INDEX)?;
        r.section_count(112, 2, NUM_GLOBAL_EFFECTS)?;

        match item.version {
            ItemVersion::V11 => {
                r.resref(114, "Dialogue", &["DLG"])?;
                r.strref(122, "Speaker name")?;
                r.ids_bitmap(126, 2, "Weapon color", "CLOWNCLR.IDS")?;
                r.unknown(128, 26)?;
            }
            ItemVersion::V20 => r.unknown(114, 16)?,
            ItemVersion::V1 => {}
        }
        Ok(())
    }

    fn declared_len(&self, resolved: &Layout) -> usize {
        match layout(resolved).version {
            ItemVersion::V1 => 114,
            ItemVersion::V11 => 154,
            ItemVersion::V20 => 130,
        }
    }

    fn removable(&self) -> bool {
        false
    }

    fn sections(&self, _layout: &Layout) -> &'static [SectionSpec] {
        &SECTIONS
    }

    fn pools(&self, _layout: &Layout) -> &'static [PoolSpec] {
        &POOLS
    }
}
