mod common;

use common::*;
use iestruct::{Document, FieldKind, MemorySource, Schema, StructError, TableCache};

fn types(doc: &Document, owner: iestruct::NodeId) -> Vec<i64> {
    doc.section(owner, Schema::Effect)
        .into_iter()
        .map(|e| doc.value(e, "Type").unwrap())
        .collect()
}

#[test]
fn every_version_round_trips() {
    let tables = bg2_tables();
    for version in &[V1, V11, V20] {
        let data = item(version, &[2, 0], 1);
        let doc = Document::from_bytes(&data, &ctx(&tables)).unwrap();

        assert_eq!(doc.node(doc.root()).len(), item_header_len(version));
        assert_eq!(doc.section(doc.root(), Schema::Ability).len(), 2);
        assert_eq!(doc.to_bytes().unwrap(), data);
        assert_eq!(doc.len().unwrap(), data.len());
    }
}

#[test]
fn version_specific_fields() {
    let tables = bg2_tables();
    let pst = Document::from_bytes(&item(V11, &[], 0), &ctx(&tables)).unwrap();
    let root = pst.node(pst.root());
    assert!(root.field("Dialogue").is_some());
    assert_eq!(root.field("Weapon color").unwrap().offset(), 126);

    let iwd2 = Document::from_bytes(&item(V20, &[], 0), &ctx(&tables)).unwrap();
    let unknown = iwd2.node(iwd2.root()).fields().last().unwrap();
    assert_eq!((unknown.name(), unknown.offset(), unknown.len()), ("Unknown", 114, 16));
}

#[test]
fn kit_table_switches_stat_widths() {
    let data = item(V1, &[1], 0);

    let with_kits = bg2_tables();
    let doc = Document::from_bytes(&data, &ctx(&with_kits)).unwrap();
    let root = doc.node(doc.root());
    assert_eq!(root.field("Minimum intelligence").unwrap().len(), 1);
    assert!(root.field("Unusable by (1/4)").is_some());
    assert_eq!(
        root.field("Weapon proficiency").unwrap().kind(),
        FieldKind::IdsBitmap("PROFTYPE.IDS")
    );

    let without_kits = TableCache::new();
    let doc = Document::from_bytes(&data, &ctx(&without_kits)).unwrap();
    let root = doc.node(doc.root());
    let intelligence = root.field("Minimum intelligence").unwrap();
    assert_eq!((intelligence.offset(), intelligence.len()), (42, 2));
    assert!(root.field("Unusable by (1/4)").is_none());
    assert_eq!(doc.to_bytes().unwrap(), data);

    let no_proftype = TableCache::with_source(MemorySource::new().with_resource("KIT.IDS"));
    let doc = Document::from_bytes(&data, &ctx(&no_proftype)).unwrap();
    assert_eq!(
        doc.field(doc.root(), "Weapon proficiency").unwrap().kind(),
        FieldKind::IdsBitmap("STATS.IDS")
    );
}

#[test]
fn inserting_an_ability_then_an_effect() {
    let tables = bg2_tables();
    let ctx = ctx(&tables);
    let data = item(V1, &[1], 2);
    assert_eq!(data.len(), 314);
    let mut doc = Document::from_bytes(&data, &ctx).unwrap();
    let root = doc.root();
    let first = doc.section(root, Schema::Ability)[0];

    let second = doc.insert(root, Schema::Ability, 1, &ctx).unwrap();
    assert_eq!(doc.node(second).name(), "Ability 1");
    assert_eq!(doc.value(second, "First effect index"), Some(3));
    assert_eq!(doc.value(second, "# effects"), Some(0));
    assert_eq!(doc.value(root, "# abilities"), Some(2));
    assert_eq!(doc.value(root, "Effects offset"), Some(226));

    let effect = doc.insert(first, Schema::Effect, 1, &ctx).unwrap();
    assert_eq!(doc.value(first, "First effect index"), Some(2));
    assert_eq!(doc.value(first, "# effects"), Some(2));
    assert_eq!(doc.value(second, "First effect index"), Some(4));
    assert_eq!(doc.value(root, "First effect index"), Some(0));
    assert_eq!(doc.node(effect).offset(), 226 + 3 * 48);
    assert_eq!(types(&doc, first), vec![3, 0]);
    assert_eq!(types(&doc, root), vec![1, 2]);

    let bytes = doc.to_bytes().unwrap();
    assert_eq!(bytes.len(), 418);
    assert_eq!(u32_at(&bytes, 106), 226);
    assert_eq!(u16_at(&bytes, 114 + 0x0E), 10);
    assert_eq!(u16_at(&bytes, 170 + 0x0E), 0);
    assert_eq!(u16_at(&bytes, 170 + 0x20), 4);

    let reread = Document::from_bytes(&bytes, &ctx).unwrap();
    assert_eq!(reread.to_bytes().unwrap(), bytes);
    let abilities = reread.section(reread.root(), Schema::Ability);
    assert_eq!(types(&reread, abilities[0]), vec![3, 0]);
    assert!(types(&reread, abilities[1]).is_empty());
}

#[test]
fn indices_shift_behind_edits() {
    let tables = bg2_tables();
    let ctx = ctx(&tables);
    let mut doc = Document::from_bytes(&item(V1, &[1, 1], 1), &ctx).unwrap();
    let root = doc.root();
    let abilities = doc.section(root, Schema::Ability);

    doc.insert(root, Schema::Effect, 0, &ctx).unwrap();
    assert_eq!(doc.value(root, "First effect index"), Some(0));
    assert_eq!(doc.value(abilities[0], "First effect index"), Some(2));
    assert_eq!(doc.value(abilities[1], "First effect index"), Some(3));
    assert_eq!(types(&doc, root), vec![0, 1]);

    let effect = doc.section(abilities[0], Schema::Effect)[0];
    doc.remove(effect).unwrap();
    assert!(doc.get(effect).is_none());
    assert_eq!(doc.value(abilities[0], "# effects"), Some(0));
    assert_eq!(doc.value(abilities[1], "First effect index"), Some(2));
    assert_eq!(types(&doc, abilities[1]), vec![3]);

    let bytes = doc.to_bytes().unwrap();
    assert_eq!(bytes.len(), 114 + 2 * 56 + 3 * 48);
    let reread = Document::from_bytes(&bytes, &ctx).unwrap();
    assert_eq!(reread.to_bytes().unwrap(), bytes);
}

#[test]
fn removing_an_ability_releases_its_effects() {
    let tables = bg2_tables();
    let ctx = ctx(&tables);
    let mut doc = Document::from_bytes(&item(V1, &[2, 1], 1), &ctx).unwrap();
    let root = doc.root();
    let abilities = doc.section(root, Schema::Ability);
    let owned = doc.section(abilities[0], Schema::Effect);

    doc.remove(abilities[0]).unwrap();
    assert!(doc.get(abilities[0]).is_none());
    assert!(owned.iter().all(|e| doc.get(*e).is_none()));

    let remaining = doc.section(root, Schema::Ability);
    assert_eq!(remaining, vec![abilities[1]]);
    assert_eq!(doc.node(remaining[0]).name(), "Ability 0");
    assert_eq!(doc.node(remaining[0]).offset(), 114);
    assert_eq!(doc.value(remaining[0], "Range (feet)"), Some(20));
    assert_eq!(doc.value(remaining[0], "First effect index"), Some(1));
    assert_eq!(doc.value(root, "Effects offset"), Some(170));
    assert_eq!(types(&doc, root), vec![1]);
    assert_eq!(types(&doc, remaining[0]), vec![4]);

    let bytes = doc.to_bytes().unwrap();
    assert_eq!(bytes.len(), 114 + 56 + 2 * 48);
    assert_eq!(Document::from_bytes(&bytes, &ctx).unwrap().to_bytes().unwrap(), bytes);
}

#[test]
fn empty_section_sentinel_moves_to_the_end() {
    let tables = bg2_tables();
    let ctx = ctx(&tables);
    let mut data = item(V1, &[], 1);
    set_u32(&mut data, 100, 0);
    let mut doc = Document::from_bytes(&data, &ctx).unwrap();
    assert_eq!(doc.to_bytes().unwrap(), data);

    let root = doc.root();
    doc.push(root, Schema::Ability, &ctx).unwrap();
    assert_eq!(doc.value(root, "Abilities offset"), Some(162));
    assert_eq!(doc.value(root, "Effects offset"), Some(114));

    let bytes = doc.to_bytes().unwrap();
    assert_eq!(bytes.len(), 218);
    assert_eq!(Document::from_bytes(&bytes, &ctx).unwrap().to_bytes().unwrap(), bytes);
}

#[test]
fn gaps_and_trailing_bytes_survive_edits() {
    let tables = bg2_tables();
    let ctx = ctx(&tables);
    let base = item(V1, &[1], 1);
    let mut data = base[..170].to_vec();
    data.extend_from_slice(&[0xAB; 4]);
    data.extend_from_slice(&base[170..]);
    data.extend_from_slice(b"END!");
    set_u32(&mut data, 106, 174);

    let mut doc = Document::from_bytes(&data, &ctx).unwrap();
    assert_eq!(doc.to_bytes().unwrap(), data);

    let ability = doc.section(doc.root(), Schema::Ability)[0];
    doc.push(ability, Schema::Effect, &ctx).unwrap();
    let bytes = doc.to_bytes().unwrap();
    assert_eq!(bytes.len(), data.len() + 48);
    assert_eq!(&bytes[170..174], &[0xAB; 4]);
    assert_eq!(&bytes[bytes.len() - 4..], b"END!");
}

#[test]
fn failed_edits_leave_the_document_untouched() {
    let tables = bg2_tables();
    let ctx = ctx(&tables);
    let data = item(V1, &[1], 1);
    let mut doc = Document::from_bytes(&data, &ctx).unwrap();
    let root = doc.root();

    match doc.insert(root, Schema::Ability, 5, &ctx) {
        Err(StructError::IndexOutOfRange { index, len, .. }) => assert_eq!((index, len), (5, 1)),
        other => panic!("unexpected {:?}", other),
    }
    match doc.insert(root, Schema::Item, 0, &ctx) {
        Err(StructError::UnsupportedMutation { .. }) => {}
        other => panic!("unexpected {:?}", other),
    }
    match doc.remove(root) {
        Err(StructError::NotRemovable { node }) => assert_eq!(node, "Item"),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(doc.to_bytes().unwrap(), data);
}

#[test]
fn value_edits() {
    let tables = bg2_tables();
    let mut doc = Document::from_bytes(&item(V1, &[1], 0), &ctx(&tables)).unwrap();
    let root = doc.root();

    doc.set_value(root, "Price", 1234).unwrap();
    assert_eq!(u32_at(&doc.to_bytes().unwrap(), 52), 1234);

    match doc.set_value(root, "Version", 1) {
        Err(StructError::UnsupportedMutation { field, .. }) => assert_eq!(field, "Version"),
        other => panic!("unexpected {:?}", other),
    }
    match doc.set_value(root, "# abilities", 3) {
        Err(StructError::UnsupportedMutation { .. }) => {}
        other => panic!("unexpected {:?}", other),
    }
    match doc.set_value(root, "Lore to identify", 70_000) {
        Err(StructError::ValueOutOfRange { value, len, .. }) => assert_eq!((value, len), (70_000, 2)),
        other => panic!("unexpected {:?}", other),
    }
    match doc.set_value(root, "Charm", 1) {
        Err(StructError::UnknownField { field, .. }) => assert_eq!(field, "Charm"),
        other => panic!("unexpected {:?}", other),
    }

    doc.set_text(root, "Icon", "isw1").unwrap();
    assert_eq!(doc.field(root, "Icon").unwrap().label(&tables), "ISW1");
    assert_eq!(doc.value(root, "Price"), Some(1234));
}

#[test]
fn labels_use_tables() {
    let tables = bg2_tables();
    let ctx = ctx(&tables);
    let mut doc = Document::from_bytes(&item(V1, &[1], 0), &ctx).unwrap();
    let ability = doc.section(doc.root(), Schema::Ability)[0];

    doc.set_value(ability, "Projectile", 2).unwrap();
    let projectile = doc.field(ability, "Projectile").unwrap();
    assert_eq!(projectile.label(&tables), "ARROW.PRO (Arrow) - 2");

    doc.set_value(ability, "Projectile", 3).unwrap();
    let projectile = doc.field(ability, "Projectile").unwrap();
    assert_eq!(projectile.label(&tables), "None (Arrow Exploding) - 3");

    doc.set_value(doc.root(), "Weapon proficiency", 90).unwrap();
    let proficiency = doc.field(doc.root(), "Weapon proficiency").unwrap();
    assert_eq!(proficiency.label(&tables), "LONGSWORD");

    assert!(doc.to_string().contains("Ability 0 (@0x72)"));
    let dump = doc.display(&tables).to_string();
    assert!(dump.contains("Projectile [0x9c; 2] = None (Arrow Exploding) - 3;"));
    assert!(dump.contains("Weapon proficiency [0x31; 1] = LONGSWORD;"));
}

#[test]
fn malformed_items_are_rejected() {
    let tables = bg2_tables();
    let ctx = ctx(&tables);
    let data = item(V1, &[1], 1);

    let mut bad_version = data.clone();
    bad_version[4..8].copy_from_slice(b"V9.9");
    let mut too_many = data.clone();
    set_u16(&mut too_many, 104, 5);
    let mut overlapping = data.clone();
    set_u32(&mut overlapping, 100, 0);
    let mut untiled = data.clone();
    set_u16(&mut untiled, 114 + 0x20, 0);

    for buffer in &[data[..100].to_vec(), bad_version, too_many, overlapping, untiled] {
        match Document::from_bytes(buffer, &ctx) {
            Err(StructError::MalformedRecord { .. }) => {}
            other => panic!("unexpected {:?}", other.map(|d| d.to_string())),
        }
    }
}

#[test]
fn sentinels_past_the_data_are_left_alone() {
    let tables = bg2_tables();
    let ctx = ctx(&tables);

    let mut far = item(V1, &[], 1);
    set_u32(&mut far, 100, 0x10000);
    let mut doc = Document::from_bytes(&far, &ctx).unwrap();
    let root = doc.root();
    doc.push(root, Schema::Ability, &ctx).unwrap();
    assert_eq!(doc.value(root, "Abilities offset"), Some(162));
    assert_eq!(doc.to_bytes().unwrap().len(), 218);

    let mut unset = item(V1, &[], 1);
    set_u32(&mut unset, 100, 0xFFFF_FFFF);
    let mut doc = Document::from_bytes(&unset, &ctx).unwrap();
    let root = doc.root();
    doc.push(root, Schema::Effect, &ctx).unwrap();
    assert_eq!(doc.value(root, "Abilities offset"), Some(0xFFFF_FFFF));
    assert_eq!(doc.value(root, "# global effects"), Some(2));
    assert_eq!(doc.to_bytes().unwrap().len(), 114 + 2 * 48);
}

#[test]
fn empty_sections_keep_out_of_range_indices() {
    let tables = bg2_tables();
    let ctx = ctx(&tables);
    let mut data = item(V1, &[0], 1);
    set_u16(&mut data, 114 + 0x20, 0xFFFF);
    let mut doc = Document::from_bytes(&data, &ctx).unwrap();
    let root = doc.root();
    let ability = doc.section(root, Schema::Ability)[0];

    doc.push(root, Schema::Effect, &ctx).unwrap();
    assert_eq!(doc.value(ability, "First effect index"), Some(0xFFFF));

    doc.push(ability, Schema::Effect, &ctx).unwrap();
    assert_eq!(doc.value(ability, "First effect index"), Some(2));
    assert_eq!(doc.value(ability, "# effects"), Some(1));

    let bytes = doc.to_bytes().unwrap();
    assert_eq!(bytes.len(), 114 + 56 + 3 * 48);
    assert_eq!(Document::from_bytes(&bytes, &ctx).unwrap().to_bytes().unwrap(), bytes);
}

#[test]
fn overflowing_count_rolls_back() {
    let tables = TableCache::new();
    let ctx = ctx(&tables);
    let mut data = item(V1, &[], 0xFFFF);
    let abilities_at = data.len();
    data.resize(abilities_at + 56, 0);
    set_u32(&mut data, 100, abilities_at as u32);
    set_u16(&mut data, 104, 1);
    let mut doc = Document::from_bytes(&data, &ctx).unwrap();
    let root = doc.root();

    // The abilities behind the effects are shifted before the count overflows.
    match doc.push(root, Schema::Effect, &ctx) {
        Err(StructError::InconsistentReference { field, .. }) => {
            assert_eq!(field, "# global effects")
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(doc.section(root, Schema::Effect).len(), 0xFFFF);
    assert_eq!(doc.value(root, "Abilities offset"), Some(abilities_at as i64));
    assert_eq!(doc.to_bytes().unwrap(), data);

    let ability = doc.section(root, Schema::Ability)[0];
    doc.push(ability, Schema::Effect, &ctx).unwrap();
    assert_eq!(doc.value(ability, "First effect index"), Some(0xFFFF));
    assert_eq!(doc.value(root, "Abilities offset"), Some(abilities_at as i64 + 48));
}

#[test]
fn removing_an_insert_restores_the_bytes() {
    let tables = bg2_tables();
    let ctx = ctx(&tables);
    let data = item(V1, &[1, 2], 1);
    let mut doc = Document::from_bytes(&data, &ctx).unwrap();
    let root = doc.root();
    let first = doc.section(root, Schema::Ability)[0];

    let effect = doc.insert(first, Schema::Effect, 0, &ctx).unwrap();
    assert_ne!(doc.to_bytes().unwrap(), data);
    doc.remove(effect).unwrap();
    assert_eq!(doc.to_bytes().unwrap(), data);

    let ability = doc.insert(root, Schema::Ability, 1, &ctx).unwrap();
    assert_eq!(doc.to_bytes().unwrap().len(), data.len() + 56);
    doc.remove(ability).unwrap();
    assert_eq!(doc.to_bytes().unwrap(), data);
}

#[test]
fn index_shifts_add_up() {
    let tables = bg2_tables();
    let ctx = ctx(&tables);
    let mut doc = Document::from_bytes(&item(V1, &[1, 1], 1), &ctx).unwrap();
    let root = doc.root();
    let abilities = doc.section(root, Schema::Ability);

    for at in &[0, 1, 1] {
        doc.insert(root, Schema::Effect, *at, &ctx).unwrap();
    }
    doc.insert(abilities[0], Schema::Effect, 0, &ctx).unwrap();
    doc.insert(abilities[0], Schema::Effect, 0, &ctx).unwrap();
    assert_eq!(doc.value(abilities[0], "First effect index"), Some(4));
    assert_eq!(doc.value(abilities[1], "First effect index"), Some(7));

    for _ in 0..2 {
        let global = doc.section(root, Schema::Effect)[0];
        doc.remove(global).unwrap();
    }
    assert_eq!(doc.value(abilities[0], "First effect index"), Some(2));
    assert_eq!(doc.value(abilities[1], "First effect index"), Some(5));
    assert_eq!(types(&doc, abilities[1]), vec![3]);

    let bytes = doc.to_bytes().unwrap();
    assert_eq!(bytes.len(), 114 + 2 * 56 + 6 * 48);
    assert_eq!(Document::from_bytes(&bytes, &ctx).unwrap().to_bytes().unwrap(), bytes);
}
