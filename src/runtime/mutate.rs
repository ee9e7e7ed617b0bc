//! Structural edits.
//!
//! Every edit that changes the shape of a document runs on a staged copy. Inserting or removing
//! an element grows or shrinks one block, shifts the anchors of every block behind it and, for
//! pooled sections, shifts the first-element index of every section behind it in the pool. The
//! staged copy is then laid out again and checked, and only replaces the document if every
//! invariant still holds.

use super::{
    layout::{Block, BlockKey, PoolOwner},
    read::read_node,
    Document, NodeId, Slot,
};
use crate::{
    error::{Result, StructError},
    profile::Context,
    schema::{Anchor, Schema},
};
use log::debug;

impl Document {
    fn transact<T, F>(&mut self, op: F) -> Result<T>
    where
        F: FnOnce(&mut Document) -> Result<T>,
    {
        let mut staged = self.clone();
        let out = op(&mut staged)?;
        staged.relayout()?;
        staged.check()?;
        *self = staged;
        Ok(out)
    }

    /// Inserts a zeroed `element` record at position `at` of the matching section of `parent`.
    /// `at` may equal the section length to append.
    pub fn insert(
        &mut self,
        parent: NodeId,
        element: Schema,
        at: usize,
        ctx: &Context,
    ) -> Result<NodeId> {
        let id = self.transact(|doc| doc.insert_element(parent, element, at, ctx))?;
        debug!("inserted {} into {}", self.node(id).name, self.node(parent).name);
        Ok(id)
    }

    /// Appends a zeroed `element` record to the matching section of `parent`.
    pub fn push(&mut self, parent: NodeId, element: Schema, ctx: &Context) -> Result<NodeId> {
        let at = self.section(parent, element).len();
        self.insert(parent, element, at, ctx)
    }

    /// Removes a section element together with everything it owns.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        let node = self.try_node(id)?;
        let embedded = match node.slot {
            Slot::Embedded(_) => true,
            _ => false,
        };
        if id == self.root || embedded || !node.def().removable() {
            return Err(StructError::NotRemovable {
                node: node.name.clone(),
            });
        }
        let name = node.name.clone();
        self.transact(|doc| doc.release(id))?;
        debug!("removed {}", name);
        Ok(())
    }

    /// Stores a numeric value. Layout discriminants and structural fields are refused.
    pub fn set_value(&mut self, id: NodeId, name: &str, value: i64) -> Result<()> {
        let node = self.try_node_mut(id)?;
        let node_name = node.name.clone();
        let field = node
            .field_mut(name)
            .ok_or_else(|| StructError::UnknownField {
                node: node_name.clone(),
                field: name.to_owned(),
            })?;

        if field.is_discriminant() {
            return Err(StructError::unsupported(
                node_name,
                name,
                "the field selects the record layout",
            ));
        }
        if field.kind().is_structural() {
            return Err(StructError::unsupported(
                node_name,
                name,
                "offsets, counts and indices follow the record structure",
            ));
        }
        if field.value().is_none() {
            return Err(StructError::unsupported(node_name, name, "not a numeric field"));
        }
        if !field.encode(value) {
            return Err(StructError::ValueOutOfRange {
                field: name.to_owned(),
                value,
                len: field.len(),
            });
        }
        debug!("{}: {} = {}", node_name, name, value);
        Ok(())
    }

    /// Stores text in a text or resource field, NUL padded.
    pub fn set_text(&mut self, id: NodeId, name: &str, text: &str) -> Result<()> {
        let node = self.try_node_mut(id)?;
        let node_name = node.name.clone();
        let field = node
            .field_mut(name)
            .ok_or_else(|| StructError::UnknownField {
                node: node_name.clone(),
                field: name.to_owned(),
            })?;

        if field.is_discriminant() {
            return Err(StructError::unsupported(
                node_name,
                name,
                "the field selects the record layout",
            ));
        }
        if !field.kind().is_textual() {
            return Err(StructError::unsupported(node_name, name, "not a text field"));
        }
        if !field.encode_text(text) {
            return Err(StructError::ValueOutOfRange {
                field: name.to_owned(),
                value: text.len() as i64,
                len: field.len(),
            });
        }
        debug!("{}: {} = {:?}", node_name, name, text);
        Ok(())
    }

    fn insert_element(
        &mut self,
        parent: NodeId,
        element: Schema,
        at: usize,
        ctx: &Context,
    ) -> Result<NodeId> {
        let node = self.try_node(parent)?;
        let index = self.section_index(node, element).ok_or_else(|| {
            StructError::unsupported(
                node.name.as_str(),
                element.name(),
                "the record has no section of this kind",
            )
        })?;
        let spec = node.def().sections(&node.layout)[index];
        let elements = self.section_by_index(parent, index);
        let count = elements.len();
        if at > count {
            return Err(StructError::IndexOutOfRange {
                node: node.name.clone(),
                index: at,
                len: count,
            });
        }

        let position = if at < count {
            node.children.iter().position(|c| *c == elements[at])
        } else if count > 0 {
            node.children
                .iter()
                .position(|c| *c == elements[count - 1])
                .map(|p| p + 1)
        } else {
            None
        };
        let position = match position {
            Some(p) => p,
            None => node
                .children
                .iter()
                .position(|c| match self.node(*c).slot {
                    Slot::Section(other) => other > index,
                    _ => false,
                })
                .unwrap_or_else(|| node.children.len()),
        };

        match spec.anchor {
            Anchor::Offset(field) => {
                let key = BlockKey::Section(parent, index);
                if count == 0 {
                    self.place_empty(parent, field, key)?;
                }
                let start = self.try_node(parent)?.require(field)? as usize;
                self.grow(key, start + at * spec.stride, spec.stride)?;
            }
            Anchor::Index { field, pool } => {
                let owner = self.pool_owner(parent, pool)?;
                let key = BlockKey::Pool(owner.node, owner.index);
                if self.pool_total(owner)? == 0 {
                    self.place_empty(owner.node, owner.spec.offset, key)?;
                }
                if count == 0 {
                    let seed = self.seed_index(owner, parent, index)?;
                    self.set_structural(parent, field, seed as i64)?;
                }
                let first = self.try_node(parent)?.require(field)? as usize;
                let base = self.try_node(owner.node)?.require(owner.spec.offset)? as usize;
                let global = first + at;
                self.grow(key, base + global * owner.spec.stride, owner.spec.stride)?;
                self.shift_indices(owner, parent, index, global, 1)?;
            }
        }
        self.add_structural(parent, spec.count, 1)?;

        let zeros = vec![0u8; spec.stride];
        let name = format!("{} {}", element.name(), at);
        let id = read_node(
            self,
            &zeros,
            element,
            Some(parent),
            Slot::Section(index),
            0,
            name,
            ctx,
        )?;
        let len = self.node(id).len();
        if len != spec.stride {
            return Err(StructError::inconsistent(
                self.node(parent).name.as_str(),
                spec.count,
                format!("new {} is {} bytes, stride is {}", element, len, spec.stride),
            ));
        }

        let children = &mut self.try_node_mut(parent)?.children;
        children.pop();
        children.insert(position, id);

        self.seed_own_sections(id)?;
        Ok(id)
    }

    /// A fresh element's pooled sections start right after their predecessor in the pool.
    fn seed_own_sections(&mut self, id: NodeId) -> Result<()> {
        let node = self.try_node(id)?;
        let sections = node.def().sections(&node.layout);
        for (index, spec) in sections.iter().enumerate() {
            if let Anchor::Index { field, pool } = spec.anchor {
                let owner = self.pool_owner(id, pool)?;
                let seed = self.seed_index(owner, id, index)?;
                self.set_structural(id, field, seed as i64)?;
            }
        }
        Ok(())
    }

    fn release(&mut self, id: NodeId) -> Result<()> {
        let children = self.try_node(id)?.children.clone();
        for child in children.into_iter().rev() {
            self.release(child)?;
        }
        self.detach(id)
    }

    fn detach(&mut self, id: NodeId) -> Result<()> {
        let node = self.try_node(id)?;
        let not_removable = || StructError::NotRemovable {
            node: node.name.clone(),
        };
        let parent = node.parent.ok_or_else(not_removable)?;

        match node.slot {
            Slot::Root => return Err(not_removable()),
            Slot::Embedded(_) => {
                let (offset, len) = (node.offset, node.len());
                self.shrink(BlockKey::Embedded(id), offset, len)?;
            }
            Slot::Section(index) => {
                let parent_node = self.try_node(parent)?;
                let spec = parent_node.def().sections(&parent_node.layout)[index];
                let k = self
                    .section_by_index(parent, index)
                    .iter()
                    .position(|e| *e == id)
                    .ok_or_else(|| {
                        StructError::inconsistent(
                            parent_node.name.as_str(),
                            spec.count,
                            format!("{} is not one of its elements", node.name),
                        )
                    })?;
                let start = self.section_start(parent, index)?.ok_or_else(|| {
                    StructError::inconsistent(
                        parent_node.name.as_str(),
                        spec.count,
                        "section is empty",
                    )
                })?;
                match spec.anchor {
                    Anchor::Offset(_) => {
                        self.shrink(
                            BlockKey::Section(parent, index),
                            start + k * spec.stride,
                            spec.stride,
                        )?;
                    }
                    Anchor::Index { field, pool } => {
                        let owner = self.pool_owner(parent, pool)?;
                        let global = parent_node.require(field)? as usize + k;
                        self.shrink(
                            BlockKey::Pool(owner.node, owner.index),
                            start + k * owner.spec.stride,
                            owner.spec.stride,
                        )?;
                        self.shift_indices(owner, parent, index, global, -1)?;
                    }
                }
                self.add_structural(parent, spec.count, -1)?;
            }
        }

        self.try_node_mut(parent)?.children.retain(|c| *c != id);
        self.gaps.retain(|key, _| match *key {
            BlockKey::Embedded(n) | BlockKey::Section(n, _) | BlockKey::Pool(n, _) => n != id,
        });
        self.nodes[id.0] = None;
        Ok(())
    }

    fn pool_total(&self, owner: PoolOwner) -> Result<usize> {
        Ok(self
            .pool_members(owner.node, owner.index)?
            .iter()
            .map(|m| m.count)
            .sum())
    }

    /// First index for an empty pooled section: the end of the last non-empty section before it
    /// in tree order.
    fn seed_index(&self, owner: PoolOwner, node: NodeId, slot: usize) -> Result<usize> {
        let members = self.pool_members(owner.node, owner.index)?;
        let target = members
            .iter()
            .find(|m| m.node == node && m.slot == slot)
            .map(|m| m.tree_order)
            .ok_or_else(|| {
                StructError::inconsistent(
                    self.node(node).name.as_str(),
                    owner.spec.name,
                    "section is not part of the pool",
                )
            })?;
        Ok(members
            .iter()
            .filter(|m| m.tree_order < target && m.count > 0)
            .map(|m| m.first + m.count)
            .max()
            .unwrap_or(0))
    }

    /// End of the laid-out data: the root region followed by every non-empty block.
    fn data_end(&self) -> Result<usize> {
        let root_len = self.node(self.root).len();
        Ok(self
            .sorted_blocks()?
            .iter()
            .map(Block::end)
            .fold(root_len, std::cmp::max))
    }

    /// Moves an empty block whose anchor is a sentinel to the end of the layout. Anchors already
    /// on a boundary between blocks are kept.
    fn place_empty(&mut self, holder: NodeId, field: &'static str, key: BlockKey) -> Result<()> {
        let start = self.try_node(holder)?.require(field)? as usize;
        let root_len = self.node(self.root).len();
        let end = self.data_end()?;
        let stray = start < root_len
            || start > end
            || self
                .sorted_blocks()?
                .iter()
                .any(|b| b.key != key && start > b.start && start < b.end());
        if stray {
            debug!("{}: moving empty block from 0x{:x} to 0x{:x}", field, start, end);
            self.set_structural(holder, field, end as i64)?;
        }
        Ok(())
    }

    /// Makes room for `len` bytes at `at` inside block `key`.
    fn grow(&mut self, key: BlockKey, at: usize, len: usize) -> Result<()> {
        let blocks = self.blocks()?;
        let end = self.data_end()?;
        let own = blocks
            .iter()
            .find(|b| b.key == key)
            .map(|b| b.order)
            .unwrap_or(0);
        // Empty blocks anchored past the data are sentinels and stay put.
        for block in blocks
            .iter()
            .filter(|b| b.key != key && (b.len > 0 || b.start <= end))
        {
            let behind = block.start > at
                || (block.start == at && (block.len > 0 || block.order > own));
            if behind {
                self.shift_block(block.key, len as i64)?;
            }
        }
        Ok(())
    }

    /// Closes the `len` bytes at `at` inside block `key`.
    fn shrink(&mut self, key: BlockKey, at: usize, len: usize) -> Result<()> {
        let end = at + len;
        let data_end = self.data_end()?;
        for block in self
            .blocks()?
            .into_iter()
            .filter(|b| b.key != key && (b.len > 0 || b.start <= data_end))
        {
            if block.start >= end {
                self.shift_block(block.key, -(len as i64))?;
            } else if block.start >= at {
                if block.len > 0 {
                    let (node, field) = self.describe(block.key);
                    return Err(StructError::inconsistent(
                        node,
                        field,
                        format!("points into the removed range 0x{:x}..0x{:x}", at, end),
                    ));
                }
                self.shift_block(block.key, at as i64 - block.start as i64)?;
            }
        }
        Ok(())
    }

    fn shift_block(&mut self, key: BlockKey, delta: i64) -> Result<()> {
        match key {
            BlockKey::Embedded(id) => {
                let node = self.try_node_mut(id)?;
                let offset = node.offset as i64 + delta;
                if offset < 0 {
                    return Err(StructError::inconsistent(
                        node.name.as_str(),
                        "offset",
                        format!("moved to {}", offset),
                    ));
                }
                node.offset = offset as usize;
                Ok(())
            }
            BlockKey::Section(id, index) => {
                let node = self.try_node(id)?;
                let field = node.def().sections(&node.layout)[index].anchor_field();
                self.add_structural(id, field, delta)
            }
            BlockKey::Pool(id, index) => {
                let node = self.try_node(id)?;
                let field = node.def().pools(&node.layout)[index].offset;
                self.add_structural(id, field, delta)
            }
        }
    }

    /// Shifts the first index of every other section in the pool that lies behind `global`.
    fn shift_indices(
        &mut self,
        owner: PoolOwner,
        node: NodeId,
        slot: usize,
        global: usize,
        delta: i64,
    ) -> Result<()> {
        let members = self.pool_members(owner.node, owner.index)?;
        let total: usize = members.iter().map(|m| m.count).sum();
        let target = members
            .iter()
            .find(|m| m.node == node && m.slot == slot)
            .map(|m| m.tree_order)
            .unwrap_or(0);

        for member in members {
            if member.node == node && member.slot == slot {
                continue;
            }
            // An empty section indexing past the pool holds a sentinel. It is seeded again when
            // it gets its first element.
            if member.count == 0 && member.first > total {
                continue;
            }
            let behind = if delta > 0 {
                member.first > global
                    || (member.first == global && (member.count > 0 || member.tree_order > target))
            } else {
                member.first > global
            };
            if behind {
                let holder = self.try_node(member.node)?;
                let field = holder.def().sections(&holder.layout)[member.slot].anchor_field();
                self.add_structural(member.node, field, delta)?;
            }
        }
        Ok(())
    }

    fn set_structural(&mut self, id: NodeId, name: &str, value: i64) -> Result<()> {
        let node = self.try_node_mut(id)?;
        let node_name = node.name.clone();
        let field = node
            .field_mut(name)
            .ok_or_else(|| StructError::UnknownField {
                node: node_name.clone(),
                field: name.to_owned(),
            })?;
        if value < 0 || !field.encode(value) {
            return Err(StructError::inconsistent(
                node_name,
                name,
                format!("{} does not fit in {} bytes", value, field.len()),
            ));
        }
        Ok(())
    }

    fn add_structural(&mut self, id: NodeId, name: &str, delta: i64) -> Result<()> {
        let current = self.try_node(id)?.require(name)?;
        self.set_structural(id, name, current + delta)
    }
}
