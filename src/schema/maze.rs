use super::{Labels, Layout, RecordSchema};
use crate::{error::Result, runtime::read::NodeReader};

const NO_YES: Labels = &["No", "Yes"];
const TRAPS: Labels = &["TrapA", "TrapB", "TrapC"];
const WALLS: Labels = &["None", "East", "West", "North", "South"];

/// One cell of the modron maze stored in Planescape: Torment saves.
pub struct MazeEntrySchema;

impl RecordSchema for MazeEntrySchema {
    fn name(&self) -> &'static str {
        "Maze entry"
    }

    fn read(&self, _layout: &Layout, r: &mut NodeReader) -> Result<()> {
        r.number(0, 4, "Override")?;
        r.bitmap(4, 4, "Accessible", NO_YES)?;
        r.bitmap(8, 4, "Is valid", NO_YES)?;
        r.bitmap(12, 4, "Is trapped", NO_YES)?;
        r.bitmap(16, 4, "Trap type", TRAPS)?;
        r.flag(20, 2, "Walls", WALLS)?;
        r.bitmap(22, 4, "Visited", NO_YES)?;
        Ok(())
    }

    fn declared_len(&self, _layout: &Layout) -> usize {
        26
    }
}
