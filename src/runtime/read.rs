use super::{field::Field, field::FieldKind, Document, NodeId, Slot, StructNode};
use crate::{
    error::{Result, StructError},
    parsers::{header, primitive::slice_at},
    profile::Context,
    schema::{Anchor, Labels, Schema},
    tables::RefList,
};
use log::{debug, trace};
use std::{collections::HashMap, io::Read};

/// Reads the fields of one record. Fields must be added in offset order without gaps, so the
/// schema code doubles as a layout check.
pub struct NodeReader<'a> {
    buffer: &'a [u8],
    node: &'a str,
    start: usize,
    cursor: usize,
    fields: Vec<Field>,
}

impl<'a> NodeReader<'a> {
    pub(crate) fn new(buffer: &'a [u8], node: &'a str, start: usize) -> Self {
        NodeReader {
            buffer,
            node,
            start,
            cursor: 0,
            fields: Vec::new(),
        }
    }

    /// Absolute offset of the record.
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn add(&mut self, offset: usize, len: usize, name: &'static str, kind: FieldKind) -> Result<()> {
        if offset != self.cursor {
            return Err(StructError::malformed(
                self.node,
                format!(
                    "field `{}` starts at +{} but the previous field ends at +{}",
                    name, offset, self.cursor
                ),
            ));
        }
        let absolute = self.start + offset;
        let data = slice_at(self.buffer, absolute, len).ok_or_else(|| {
            StructError::malformed(
                self.node,
                format!("buffer ends inside field `{}` (0x{:x}, {} bytes)", name, absolute, len),
            )
        })?;
        trace!("{}: {} @0x{:x} [{}]", self.node, name, absolute, len);
        self.fields.push(Field::new(name, absolute, kind, data));
        self.cursor += len;
        Ok(())
    }

    pub fn number(&mut self, offset: usize, len: usize, name: &'static str) -> Result<()> {
        self.add(offset, len, name, FieldKind::Number { signed: true })
    }

    pub fn unsigned(&mut self, offset: usize, len: usize, name: &'static str) -> Result<()> {
        self.add(offset, len, name, FieldKind::Number { signed: false })
    }

    pub fn flag(&mut self, offset: usize, len: usize, name: &'static str, labels: Labels) -> Result<()> {
        self.add(offset, len, name, FieldKind::Flag(labels))
    }

    pub fn bitmap(&mut self, offset: usize, len: usize, name: &'static str, labels: Labels) -> Result<()> {
        self.add(offset, len, name, FieldKind::Bitmap(labels))
    }

    pub fn hash_bitmap(
        &mut self,
        offset: usize,
        len: usize,
        name: &'static str,
        entries: &'static [(i64, &'static str)],
    ) -> Result<()> {
        self.add(offset, len, name, FieldKind::HashBitmap(entries))
    }

    pub fn ids_bitmap(
        &mut self,
        offset: usize,
        len: usize,
        name: &'static str,
        table: &'static str,
    ) -> Result<()> {
        self.add(offset, len, name, FieldKind::IdsBitmap(table))
    }

    pub fn text_bitmap(
        &mut self,
        offset: usize,
        len: usize,
        name: &'static str,
        tags: Labels,
        labels: Labels,
    ) -> Result<()> {
        self.add(offset, len, name, FieldKind::TextBitmap { tags, labels })
    }

    pub fn text(&mut self, offset: usize, len: usize, name: &'static str) -> Result<()> {
        self.add(offset, len, name, FieldKind::Text)
    }

    pub fn resref(&mut self, offset: usize, name: &'static str, extensions: Labels) -> Result<()> {
        self.add(offset, 8, name, FieldKind::ResourceRef(extensions))
    }

    pub fn strref(&mut self, offset: usize, name: &'static str) -> Result<()> {
        self.add(offset, 4, name, FieldKind::StringRef)
    }

    pub fn color(&mut self, offset: usize, len: usize, name: &'static str) -> Result<()> {
        self.add(offset, len, name, FieldKind::Color)
    }

    pub fn projectile(&mut self, offset: usize, name: &'static str, list: RefList) -> Result<()> {
        self.add(offset, 2, name, FieldKind::ProjectileRef(list))
    }

    pub fn section_offset(&mut self, offset: usize, name: &'static str) -> Result<()> {
        self.add(offset, 4, name, FieldKind::SectionOffset)
    }

    pub fn section_count(&mut self, offset: usize, len: usize, name: &'static str) -> Result<()> {
        self.add(offset, len, name, FieldKind::SectionCount)
    }

    pub fn element_index(&mut self, offset: usize, len: usize, name: &'static str) -> Result<()> {
        self.add(offset, len, name, FieldKind::ElementIndex)
    }

    pub fn unknown(&mut self, offset: usize, len: usize) -> Result<()> {
        self.add(offset, len, "Unknown", FieldKind::Unknown)
    }

    /// Marks the last added field as a layout discriminant.
    pub fn mark_discriminant(&mut self) {
        if let Some(field) = self.fields.last_mut() {
            field.mark_discriminant();
        }
    }

    /// Value of a field that was already read.
    pub fn value(&self, name: &str) -> Option<i64> {
        self.fields
            .iter()
            .find(|f| f.name() == name)
            .and_then(Field::value)
    }

    fn finish(self, declared_len: usize) -> Result<Vec<Field>> {
        if self.cursor != declared_len {
            return Err(StructError::malformed(
                self.node,
                format!("fields cover {} bytes, layout needs {}", self.cursor, declared_len),
            ));
        }
        Ok(self.fields)
    }
}

pub(super) fn read_node(
    doc: &mut Document,
    buffer: &[u8],
    schema: Schema,
    parent: Option<NodeId>,
    slot: Slot,
    offset: usize,
    name: String,
    ctx: &Context,
) -> Result<NodeId> {
    let def = schema.def();
    let layout = def.resolve(buffer, offset, ctx)?;
    let mut reader = NodeReader::new(buffer, &name, offset);
    def.read(&layout, &mut reader)?;
    let fields = reader.finish(def.declared_len(&layout))?;
    debug!("read {} @0x{:x} ({:?})", name, offset, layout);

    let id = doc.alloc(StructNode {
        name,
        schema,
        layout,
        parent,
        slot,
        offset,
        fields,
        children: Vec::new(),
    });
    if let Some(parent) = parent {
        doc.try_node_mut(parent)?.children.push(id);
    }

    for (index, spec) in def.embedded(&layout).iter().enumerate() {
        read_node(
            doc,
            buffer,
            spec.schema,
            Some(id),
            Slot::Embedded(index),
            offset + spec.offset,
            spec.schema.name().to_owned(),
            ctx,
        )?;
    }

    for (index, spec) in def.sections(&layout).iter().enumerate() {
        let node = doc.try_node(id)?;
        let count = node.require(spec.count)? as usize;
        if count == 0 {
            continue;
        }
        let start = match spec.anchor {
            Anchor::Offset(field) => node.require(field)? as usize,
            Anchor::Index { field, pool } => {
                let first = node.require(field)? as usize;
                let owner = doc.pool_owner(id, pool)?;
                let base = doc.node(owner.node).require(owner.spec.offset)? as usize;
                base + first * owner.spec.stride
            }
        };
        let end = start + count * spec.stride;
        if end > buffer.len() {
            return Err(StructError::malformed(
                doc.node(id).name.as_str(),
                format!(
                    "{} {} records at 0x{:x} run past the end of the buffer (0x{:x})",
                    count,
                    spec.element.name(),
                    start,
                    buffer.len()
                ),
            ));
        }
        for k in 0..count {
            let element = read_node(
                doc,
                buffer,
                spec.element,
                Some(id),
                Slot::Section(index),
                start + k * spec.stride,
                format!("{} {}", spec.element.name(), k),
                ctx,
            )?;
            let len = doc.node(element).len();
            if len != spec.stride {
                return Err(StructError::malformed(
                    doc.node(element).name.as_str(),
                    format!("record is {} bytes, section stride is {}", len, spec.stride),
                ));
            }
        }
    }

    Ok(id)
}

impl Document {
    /// Parses `buffer` as a `schema` record. Any inconsistency rejects the whole buffer.
    pub fn read(buffer: &[u8], schema: Schema, ctx: &Context) -> Result<Document> {
        let mut doc = Document {
            nodes: Vec::new(),
            root: NodeId(0),
            gaps: HashMap::new(),
            trailer: Vec::new(),
        };
        doc.root = read_node(
            &mut doc,
            buffer,
            schema,
            None,
            Slot::Root,
            0,
            schema.name().to_owned(),
            ctx,
        )
        .map_err(StructError::into_malformed)?;
        doc.check().map_err(StructError::into_malformed)?;
        doc.capture_gaps(buffer)?;
        debug!(
            "read {} ({} records, {} bytes)",
            schema.name(),
            doc.nodes.len(),
            buffer.len()
        );
        Ok(doc)
    }

    /// Parses `buffer`, picking the schema from its signature and version.
    pub fn from_bytes(buffer: &[u8], ctx: &Context) -> Result<Document> {
        let schema = header::detect(buffer)?;
        Document::read(buffer, schema, ctx)
    }

    pub fn from_reader<R: Read>(mut reader: R, ctx: &Context) -> Result<Document> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        Document::from_bytes(&buffer, ctx)
    }

    fn capture_gaps(&mut self, buffer: &[u8]) -> Result<()> {
        let mut cursor = self.node(self.root).len();
        for block in self.sorted_blocks()? {
            if block.start > cursor {
                self.gaps
                    .insert(block.key, buffer[cursor..block.start].to_vec());
            }
            cursor = cursor.max(block.start + block.len);
        }
        if cursor < buffer.len() {
            self.trailer = buffer[cursor..].to_vec();
        }
        Ok(())
    }
}
