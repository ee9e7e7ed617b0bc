use super::{layout::BlockKey, Document, NodeId};
use crate::error::{Result, StructError};
use log::warn;
use std::io::Write;

impl Document {
    /// Serializes the document. The root's fixed region comes first, then every non-empty block
    /// in increasing offset order. The bytes between blocks are the ones found when reading,
    /// or zeros if an edit changed the length of a gap.
    pub fn write<W: Write>(&self, out: &mut W) -> Result<()> {
        let root = self.node(self.root);
        for field in &root.fields {
            field.write(out)?;
        }

        let mut cursor = root.len();
        for block in self.sorted_blocks()? {
            if block.start < cursor {
                let (node, field) = self.describe(block.key);
                return Err(StructError::inconsistent(
                    node,
                    field,
                    format!("block at 0x{:x} overlaps data ending at 0x{:x}", block.start, cursor),
                ));
            }

            let gap = block.start - cursor;
            if gap > 0 {
                match self.gaps.get(&block.key) {
                    Some(bytes) if bytes.len() == gap => out.write_all(bytes)?,
                    _ => {
                        warn!("zero-filling {} bytes before 0x{:x}", gap, block.start);
                        out.write_all(&vec![0; gap])?;
                    }
                }
            }

            for id in self.block_records(block.key)? {
                for field in &self.node(id).fields {
                    field.write(out)?;
                }
            }
            cursor = block.end();
        }

        out.write_all(&self.trailer)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write(&mut out)?;
        Ok(out)
    }

    /// Records whose fixed regions make up a block, in byte order.
    fn block_records(&self, key: BlockKey) -> Result<Vec<NodeId>> {
        match key {
            BlockKey::Embedded(id) => Ok(vec![id]),
            BlockKey::Section(id, index) => Ok(self.section_by_index(id, index)),
            BlockKey::Pool(owner, index) => {
                let mut elements = Vec::new();
                for member in self.pool_members(owner, index)? {
                    for (k, element) in self
                        .section_by_index(member.node, member.slot)
                        .into_iter()
                        .enumerate()
                    {
                        elements.push((member.first + k, element));
                    }
                }
                elements.sort_by_key(|(index, _)| *index);
                Ok(elements.into_iter().map(|(_, id)| id).collect())
            }
        }
    }

    /// The serialized length, without building the buffer.
    pub fn len(&self) -> Result<usize> {
        let root = self.node(self.root).len();
        let end = self
            .sorted_blocks()?
            .iter()
            .map(|b| b.end())
            .max()
            .unwrap_or(0);
        Ok(root.max(end) + self.trailer.len())
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.iter().all(Option::is_none)
    }
}
