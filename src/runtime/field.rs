use crate::{
    parsers::primitive::{encode, fits, parse_signed, parse_unsigned},
    schema::Labels,
    tables::{RefList, TableCache},
};
use std::{fmt::Write as _, io::Write};

/// How the raw bytes of a field are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Number { signed: bool },
    /// Bit set. `labels[0]` names the empty set, `labels[n + 1]` names bit `n`.
    Flag(Labels),
    /// Enumeration indexed by value.
    Bitmap(Labels),
    /// Enumeration over sparse values.
    HashBitmap(&'static [(i64, &'static str)]),
    /// Enumeration looked up in an IDS table, e.g. `ANIMATE.IDS`.
    IdsBitmap(&'static str),
    /// Short text tag, `tags[n]` is displayed as `labels[n]`.
    TextBitmap { tags: Labels, labels: Labels },
    Text,
    /// Eight byte resource name. The labels list the accepted extensions.
    ResourceRef(Labels),
    StringRef,
    Color,
    ProjectileRef(RefList),
    SectionOffset,
    SectionCount,
    ElementIndex,
    Unknown,
}

impl FieldKind {
    /// Offsets, counts and indices are maintained by the mutation engine.
    pub fn is_structural(self) -> bool {
        match self {
            FieldKind::SectionOffset | FieldKind::SectionCount | FieldKind::ElementIndex => true,
            _ => false,
        }
    }

    pub fn is_textual(self) -> bool {
        match self {
            FieldKind::Text | FieldKind::ResourceRef(_) | FieldKind::TextBitmap { .. } => true,
            _ => false,
        }
    }

    fn is_signed(self) -> bool {
        match self {
            FieldKind::Number { signed } => signed,
            FieldKind::StringRef => true,
            _ => false,
        }
    }
}

/// A typed view over a fixed-width run of bytes inside a record.
///
/// The raw bytes are the source of truth. Every decoded value is derived from them, so a field
/// nobody touched writes back exactly what was read.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: &'static str,
    offset: usize,
    kind: FieldKind,
    data: Vec<u8>,
    discriminant: bool,
}

fn short_label(label: &str) -> &str {
    label.split(';').next().unwrap_or(label)
}

impl Field {
    pub(crate) fn new(name: &'static str, offset: usize, kind: FieldKind, data: &[u8]) -> Self {
        Field {
            name,
            offset,
            kind,
            data: data.to_vec(),
            discriminant: false,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Absolute offset in the resource.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Whether the field selects the layout of its record.
    pub fn is_discriminant(&self) -> bool {
        self.discriminant
    }

    /// The numeric value, for every field that is not text or opaque bytes.
    pub fn value(&self) -> Option<i64> {
        if self.kind.is_textual() || self.kind == FieldKind::Unknown {
            return None;
        }
        if self.kind.is_signed() {
            parse_signed(&self.data)
        } else {
            parse_unsigned(&self.data).map(|v| v as i64)
        }
    }

    /// Text up to the first NUL byte.
    pub fn text(&self) -> Option<String> {
        if !self.kind.is_textual() {
            return None;
        }
        let end = self
            .data
            .iter()
            .position(|b| *b == 0)
            .unwrap_or_else(|| self.data.len());
        Some(String::from_utf8_lossy(&self.data[..end]).into_owned())
    }

    /// Human readable rendering of the value. Lookups that miss render as `Unknown (value)`.
    pub fn label(&self, tables: &TableCache) -> String {
        let value = self.value().unwrap_or(0);
        let unknown = |v: &dyn std::fmt::Display| format!("Unknown ({})", v);

        match self.kind {
            FieldKind::Number { .. }
            | FieldKind::StringRef
            | FieldKind::Color
            | FieldKind::SectionCount
            | FieldKind::ElementIndex => value.to_string(),
            FieldKind::SectionOffset => format!("{} (0x{:x})", value, value),
            FieldKind::Flag(labels) => {
                if value == 0 {
                    return labels.get(0).map_or("None", |l| short_label(l)).to_owned();
                }
                let mut names = Vec::new();
                for bit in 0..(8 * self.data.len()) {
                    if value & (1 << bit) == 0 {
                        continue;
                    }
                    match labels.get(bit + 1).filter(|l| !l.is_empty()) {
                        Some(l) => names.push(short_label(l).to_owned()),
                        None => names.push(unknown(&bit)),
                    }
                }
                names.join(", ")
            }
            FieldKind::Bitmap(labels) => labels
                .get(value as usize)
                .filter(|l| value >= 0 && !l.is_empty())
                .map(|l| short_label(l).to_owned())
                .unwrap_or_else(|| unknown(&value)),
            FieldKind::HashBitmap(entries) => entries
                .iter()
                .find(|(k, _)| *k == value)
                .map(|(_, l)| (*l).to_owned())
                .unwrap_or_else(|| unknown(&value)),
            FieldKind::IdsBitmap(table) => tables
                .get(table)
                .and_then(|t| t.get(value).map(str::to_owned))
                .unwrap_or_else(|| unknown(&value)),
            FieldKind::TextBitmap { tags, labels } => {
                let text = self.text().unwrap_or_default();
                tags.iter()
                    .position(|t| *t == text)
                    .and_then(|i| labels.get(i))
                    .map(|l| (*l).to_owned())
                    .unwrap_or_else(|| unknown(&text))
            }
            FieldKind::Text => self.text().unwrap_or_default(),
            FieldKind::ResourceRef(_) => match self.text() {
                Some(ref name) if !name.is_empty() => name.to_uppercase(),
                _ => "None".to_owned(),
            },
            FieldKind::ProjectileRef(list) => tables
                .lookup_ref(list, value)
                .map(|entry| entry.to_string())
                .unwrap_or_else(|| unknown(&value)),
            FieldKind::Unknown => {
                let mut hex = String::with_capacity(self.data.len() * 3);
                for (i, b) in self.data.iter().enumerate() {
                    if i > 0 {
                        hex.push(' ');
                    }
                    let _ = write!(hex, "{:02x}", b);
                }
                hex
            }
        }
    }

    pub fn write<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        out.write_all(&self.data)
    }

    /// Stores `value` if it fits the field width.
    pub(crate) fn encode(&mut self, value: i64) -> bool {
        let signed = self.kind.is_signed();
        if !fits(self.data.len(), signed, value) {
            // Unsigned 4-byte fields also accept the signed spelling of the same bits.
            if !(self.data.len() == 4 && fits(4, !signed, value)) {
                return false;
            }
        }
        encode(&mut self.data, value);
        true
    }

    /// Stores `text` NUL padded. Fails if it is longer than the field.
    pub(crate) fn encode_text(&mut self, text: &str) -> bool {
        let bytes = text.as_bytes();
        if bytes.len() > self.data.len() {
            return false;
        }
        for (i, slot) in self.data.iter_mut().enumerate() {
            *slot = bytes.get(i).cloned().unwrap_or(0);
        }
        true
    }

    pub(crate) fn relocate(&mut self, offset: usize) {
        self.offset = offset;
    }

    pub(crate) fn mark_discriminant(&mut self) {
        self.discriminant = true;
    }
}
