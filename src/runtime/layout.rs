//! Byte-region bookkeeping shared by reading, writing and mutation.
//!
//! Outside the root's fixed region every byte of a resource belongs to a block: an embedded
//! record, the elements of an offset-anchored section, or a flattened pool. Blocks are identified
//! by the record that anchors them, so the key survives edits.

use super::{Document, NodeId, Slot};
use crate::{
    error::{Result, StructError},
    schema::{Anchor, PoolSpec},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKey {
    Embedded(NodeId),
    /// Offset-anchored section `n` of a record.
    Section(NodeId, usize),
    /// Pool `n` owned by a record.
    Pool(NodeId, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block {
    pub key: BlockKey,
    /// Declaration order. Breaks ties between blocks starting at the same byte.
    pub order: usize,
    pub start: usize,
    pub len: usize,
}

impl Block {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PoolOwner {
    pub node: NodeId,
    pub index: usize,
    pub spec: PoolSpec,
}

/// An index-anchored section drawing its elements from a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PoolMember {
    pub node: NodeId,
    pub slot: usize,
    pub first: usize,
    pub count: usize,
    /// Position in a walk visiting a record's own sections before its children.
    pub tree_order: usize,
}

impl Document {
    /// Every block, empty ones included, in declaration order.
    pub fn blocks(&self) -> Result<Vec<Block>> {
        let mut blocks = Vec::new();
        for id in self.preorder() {
            let node = self.node(id);
            let def = node.def();

            for child in &node.children {
                let child_node = self.node(*child);
                if let Slot::Embedded(_) = child_node.slot {
                    blocks.push((BlockKey::Embedded(*child), child_node.offset, child_node.len()));
                }
            }

            for (index, spec) in def.sections(&node.layout).iter().enumerate() {
                if let Anchor::Offset(field) = spec.anchor {
                    let start = node.require(field)? as usize;
                    let count = node.require(spec.count)? as usize;
                    blocks.push((BlockKey::Section(id, index), start, count * spec.stride));
                }
            }

            for (index, spec) in def.pools(&node.layout).iter().enumerate() {
                let start = node.require(spec.offset)? as usize;
                let total: usize = self
                    .pool_members(id, index)?
                    .iter()
                    .map(|m| m.count)
                    .sum();
                blocks.push((BlockKey::Pool(id, index), start, total * spec.stride));
            }
        }

        Ok(blocks
            .into_iter()
            .enumerate()
            .map(|(order, (key, start, len))| Block {
                key,
                order,
                start,
                len,
            })
            .collect())
    }

    /// Non-empty blocks in the order they are written.
    pub fn sorted_blocks(&self) -> Result<Vec<Block>> {
        let mut blocks: Vec<Block> = self
            .blocks()?
            .into_iter()
            .filter(|b| b.len > 0)
            .collect();
        blocks.sort_by_key(|b| (b.start, b.order));
        Ok(blocks)
    }

    /// `(record name, anchoring field)` of a block, for error messages.
    pub(crate) fn describe(&self, key: BlockKey) -> (String, &'static str) {
        match key {
            BlockKey::Embedded(id) => (self.node(id).name.clone(), "offset"),
            BlockKey::Section(id, index) => {
                let node = self.node(id);
                let field = node
                    .def()
                    .sections(&node.layout)
                    .get(index)
                    .map_or("section", |s| s.anchor_field());
                (node.name.clone(), field)
            }
            BlockKey::Pool(id, index) => {
                let node = self.node(id);
                let field = node
                    .def()
                    .pools(&node.layout)
                    .get(index)
                    .map_or("pool", |p| p.offset);
                (node.name.clone(), field)
            }
        }
    }

    /// The nearest record, starting at `from` and walking up, that owns `pool`.
    pub(crate) fn pool_owner(&self, from: NodeId, pool: &str) -> Result<PoolOwner> {
        let mut current = Some(from);
        while let Some(id) = current {
            let node = self.try_node(id)?;
            let pools = node.def().pools(&node.layout);
            if let Some(index) = pools.iter().position(|p| p.name == pool) {
                return Ok(PoolOwner {
                    node: id,
                    index,
                    spec: pools[index],
                });
            }
            current = node.parent;
        }
        Err(StructError::inconsistent(
            self.node(from).name.as_str(),
            pool,
            "no enclosing record owns this pool",
        ))
    }

    /// Sections drawing from pool `index` of `owner`, in tree order.
    pub(crate) fn pool_members(&self, owner: NodeId, index: usize) -> Result<Vec<PoolMember>> {
        let owner_node = self.try_node(owner)?;
        let pool = match owner_node.def().pools(&owner_node.layout).get(index) {
            Some(spec) => spec.name,
            None => return Ok(Vec::new()),
        };

        let mut members = Vec::new();
        let mut stack = vec![owner];
        while let Some(id) = stack.pop() {
            let node = self.try_node(id)?;
            for (slot, spec) in node.def().sections(&node.layout).iter().enumerate() {
                if spec.pool() != Some(pool) || self.pool_owner(id, pool)?.node != owner {
                    continue;
                }
                members.push(PoolMember {
                    node: id,
                    slot,
                    first: node.require(spec.anchor_field())? as usize,
                    count: node.require(spec.count)? as usize,
                    tree_order: members.len(),
                });
            }
            stack.extend(node.children.iter().rev().cloned());
        }
        Ok(members)
    }

    /// Byte offset of the first element of section `index` of `id`. `None` for an empty section,
    /// whose anchor is only a sentinel.
    pub(crate) fn section_start(&self, id: NodeId, index: usize) -> Result<Option<usize>> {
        let node = self.try_node(id)?;
        let spec = match node.def().sections(&node.layout).get(index) {
            Some(spec) => *spec,
            None => return Ok(None),
        };
        if node.require(spec.count)? == 0 {
            return Ok(None);
        }
        let start = match spec.anchor {
            Anchor::Offset(field) => node.require(field)? as usize,
            Anchor::Index { field, pool } => {
                let first = node.require(field)? as usize;
                let owner = self.pool_owner(id, pool)?;
                let base = self.node(owner.node).require(owner.spec.offset)? as usize;
                base + first * owner.spec.stride
            }
        };
        Ok(Some(start))
    }

    fn move_node(&mut self, id: NodeId, offset: usize, name: Option<String>) -> Result<()> {
        let node = self.try_node_mut(id)?;
        node.offset = offset;
        if let Some(name) = name {
            node.name = name;
        }
        let mut cursor = offset;
        for field in &mut node.fields {
            field.relocate(cursor);
            cursor += field.len();
        }
        Ok(())
    }

    /// Recomputes every record offset from the anchors and renumbers section elements.
    pub(crate) fn relayout(&mut self) -> Result<()> {
        for id in self.preorder() {
            let node = self.node(id);
            let sections = node.def().sections(&node.layout);
            let embedded: Vec<NodeId> = node
                .children
                .iter()
                .cloned()
                .filter(|c| match self.node(*c).slot {
                    Slot::Embedded(_) => true,
                    _ => false,
                })
                .collect();

            for child in embedded {
                let offset = self.node(child).offset;
                self.move_node(child, offset, None)?;
            }

            for (index, spec) in sections.iter().enumerate() {
                let start = match self.section_start(id, index)? {
                    Some(start) => start,
                    None => continue,
                };
                for (k, element) in self.section_by_index(id, index).into_iter().enumerate() {
                    let name = format!("{} {}", spec.element.name(), k);
                    self.move_node(element, start + k * spec.stride, Some(name))?;
                }
            }
        }
        Ok(())
    }

    /// Verifies the structural invariants: contiguous fields, counts matching the live elements,
    /// pools tiled without holes or overlaps, and blocks that do not overlap.
    pub(crate) fn check(&self) -> Result<()> {
        for id in self.preorder() {
            let node = self.node(id);
            let def = node.def();

            let mut cursor = node.offset;
            for field in &node.fields {
                if field.offset() != cursor {
                    return Err(StructError::inconsistent(
                        node.name.as_str(),
                        field.name(),
                        format!("expected at 0x{:x}, found at 0x{:x}", cursor, field.offset()),
                    ));
                }
                cursor += field.len();
            }

            for (index, spec) in def.sections(&node.layout).iter().enumerate() {
                let live = self.section_by_index(id, index).len();
                let count = node.require(spec.count)? as usize;
                if live != count {
                    return Err(StructError::inconsistent(
                        node.name.as_str(),
                        spec.count,
                        format!("count is {} but {} records are present", count, live),
                    ));
                }
            }

            for (index, spec) in def.pools(&node.layout).iter().enumerate() {
                let mut members: Vec<PoolMember> = self
                    .pool_members(id, index)?
                    .into_iter()
                    .filter(|m| m.count > 0)
                    .collect();
                members.sort_by_key(|m| (m.first, m.tree_order));

                let mut expected = 0;
                for member in members {
                    if member.first != expected {
                        let holder = self.node(member.node);
                        let field = holder
                            .def()
                            .sections(&holder.layout)
                            .get(member.slot)
                            .map_or(spec.name, |s| s.anchor_field());
                        return Err(StructError::inconsistent(
                            holder.name.as_str(),
                            field,
                            format!(
                                "`{}` index {} leaves the pool untiled at {}",
                                spec.name, member.first, expected
                            ),
                        ));
                    }
                    expected += member.count;
                }
            }
        }

        let mut cursor = self.node(self.root).len();
        for block in self.sorted_blocks()? {
            if block.start < cursor {
                let (node, field) = self.describe(block.key);
                return Err(StructError::inconsistent(
                    node,
                    field,
                    format!(
                        "block at 0x{:x} overlaps data ending at 0x{:x}",
                        block.start, cursor
                    ),
                ));
            }
            cursor = block.end();
        }
        Ok(())
    }
}
