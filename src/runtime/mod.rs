//! The editable document model.
//!
//! A [`Document`] owns every record of a resource in an arena. Records refer to their parent and
//! children through [`NodeId`]s, so the tree can be cloned wholesale for transactional edits.
//!
//! Reading lives in [`read`], serialization in [`write`], the structural edits in [`mutate`] and
//! the block bookkeeping they share in [`layout`].

pub mod field;
pub mod layout;
pub mod mutate;
pub mod read;
pub mod write;

use self::{field::Field, layout::BlockKey};
use crate::{
    error::{Result, StructError},
    schema::{Layout, RecordSchema, Schema},
    tables::TableCache,
};
use std::{collections::HashMap, fmt};

/// Handle to a record inside a [`Document`]. Handles stay valid until the record is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// Where a record sits relative to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Root,
    /// Index into the parent's embedded specs.
    Embedded(usize),
    /// Index into the parent's section specs.
    Section(usize),
}

/// One record: a schema, the layout it was read with and its fields in offset order.
#[derive(Debug, Clone)]
pub struct StructNode {
    pub(crate) name: String,
    pub(crate) schema: Schema,
    pub(crate) layout: Layout,
    pub(crate) parent: Option<NodeId>,
    pub(crate) slot: Slot,
    pub(crate) offset: usize,
    pub(crate) fields: Vec<Field>,
    pub(crate) children: Vec<NodeId>,
}

impl StructNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub(crate) fn def(&self) -> &'static dyn RecordSchema {
        self.schema.def()
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }

    /// Absolute offset of the first byte of the record.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Length of the fixed region.
    pub fn len(&self) -> usize {
        self.fields.iter().map(Field::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub(crate) fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name() == name)
    }

    pub fn value(&self, name: &str) -> Option<i64> {
        self.field(name).and_then(Field::value)
    }

    pub(crate) fn require(&self, name: &str) -> Result<i64> {
        self.value(name).ok_or_else(|| StructError::UnknownField {
            node: self.name.clone(),
            field: name.to_owned(),
        })
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// A parsed resource.
#[derive(Debug, Clone)]
pub struct Document {
    pub(crate) nodes: Vec<Option<StructNode>>,
    pub(crate) root: NodeId,
    /// Bytes found before each block when the resource was read.
    pub(crate) gaps: HashMap<BlockKey, Vec<u8>>,
    /// Bytes after the last block.
    pub(crate) trailer: Vec<u8>,
}

impl Document {
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The record behind `id`.
    ///
    /// # Panics
    /// If `id` was removed from this document.
    pub fn node(&self, id: NodeId) -> &StructNode {
        match self.get(id) {
            Some(node) => node,
            None => panic!("stale node id {:?}", id),
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&StructNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub(crate) fn try_node(&self, id: NodeId) -> Result<&StructNode> {
        self.get(id)
            .ok_or_else(|| StructError::malformed(format!("{:?}", id), "record no longer exists"))
    }

    pub(crate) fn try_node_mut(&mut self, id: NodeId) -> Result<&mut StructNode> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| StructError::malformed(format!("{:?}", id), "record no longer exists"))
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).children()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Elements of the section of `parent` whose elements are `element` records.
    pub fn section(&self, parent: NodeId, element: Schema) -> Vec<NodeId> {
        let node = self.node(parent);
        match self.section_index(node, element) {
            Some(index) => self.section_by_index(parent, index),
            None => Vec::new(),
        }
    }

    pub(crate) fn section_index(&self, node: &StructNode, element: Schema) -> Option<usize> {
        node.def()
            .sections(&node.layout)
            .iter()
            .position(|s| s.element == element)
    }

    pub(crate) fn section_by_index(&self, parent: NodeId, index: usize) -> Vec<NodeId> {
        self.node(parent)
            .children
            .iter()
            .cloned()
            .filter(|c| self.node(*c).slot == Slot::Section(index))
            .collect()
    }

    pub fn field(&self, id: NodeId, name: &str) -> Option<&Field> {
        self.get(id).and_then(|n| n.field(name))
    }

    pub fn value(&self, id: NodeId, name: &str) -> Option<i64> {
        self.field(id, name).and_then(Field::value)
    }

    /// Every live record, parents before children, children in order.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.node(id).children.iter().rev().cloned());
        }
        out
    }

    /// Dump of the document with labels resolved through `tables`. The plain `Display` uses
    /// [`TableCache::global`].
    pub fn display<'a>(&'a self, tables: &'a TableCache) -> DocumentDisplay<'a> {
        DocumentDisplay { doc: self, tables }
    }

    pub(crate) fn alloc(&mut self, node: StructNode) -> NodeId {
        self.nodes.push(Some(node));
        NodeId(self.nodes.len() - 1)
    }
}

pub struct DocumentDisplay<'a> {
    doc: &'a Document,
    tables: &'a TableCache,
}

fn fmt_node(
    doc: &Document,
    tables: &TableCache,
    f: &mut fmt::Formatter,
    id: NodeId,
    ident: usize,
) -> fmt::Result {
    let ident_str: String = std::iter::repeat(" ").take(4 * ident).collect();
    let node = doc.node(id);

    writeln!(f, "{} (@0x{:x}) {{", node.name, node.offset)?;

    for field in &node.fields {
        writeln!(
            f,
            "{}    {} [0x{:x}; {}] = {};",
            ident_str,
            field.name(),
            field.offset(),
            field.len(),
            field.label(tables)
        )?;
    }

    for child in &node.children {
        write!(f, "{}    ", ident_str)?;
        fmt_node(doc, tables, f, *child, ident + 1)?;
    }

    writeln!(f, "{}}}", ident_str)
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt_node(self, TableCache::global(), f, self.root, 0)
    }
}

impl<'a> fmt::Display for DocumentDisplay<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt_node(self.doc, self.tables, f, self.doc.root, 0)
    }
}
