use tessera_assets::TileMapData;

/// One cell write: `old` is what the cell held before, `new` what it holds
/// after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileChange {
    pub x: i32,
    pub y: i32,
    pub old: u16,
    pub new: u16,
}

/// A reversible edit to a tile map.
///
/// Each command carries enough context to undo itself.
#[derive(Debug, Clone, PartialEq)]
pub enum EditCommand {
    /// A brush stroke, erase stroke or fill. Undo = restore every `old`.
    SetTiles(Vec<TileChange>),
    /// Half-extent change. Holds the full grid on both sides because
    /// shrinking discards tiles.
    Resize {
        from: (u32, u32),
        to: (u32, u32),
        before: Vec<u16>,
        after: Vec<u16>,
    },
    CellSize { old: f32, new: f32 },
}

impl EditCommand {
    /// Produce the inverse command (for undo).
    pub fn inverse(&self) -> Self {
        match self {
            Self::SetTiles(changes) => Self::SetTiles(
                changes
                    .iter()
                    .rev()
                    .map(|c| TileChange {
                        old: c.new,
                        new: c.old,
                        ..*c
                    })
                    .collect(),
            ),
            Self::Resize {
                from,
                to,
                before,
                after,
            } => Self::Resize {
                from: *to,
                to: *from,
                before: after.clone(),
                after: before.clone(),
            },
            Self::CellSize { old, new } => Self::CellSize {
                old: *new,
                new: *old,
            },
        }
    }

    pub fn apply(&self, map: &mut TileMapData) {
        match self {
            Self::SetTiles(changes) => {
                for c in changes {
                    map.set_tile(c.x, c.y, c.new);
                }
            }
            Self::Resize { to, after, .. } => {
                map.resize(to.0, to.1);
                let width = map.width() as i32;
                for (i, &id) in after.iter().enumerate() {
                    let i = i as i32;
                    map.set_tile(i % width, i / width, id);
                }
            }
            Self::CellSize { new, .. } => map.set_cell_size(*new),
        }
    }
}

/// Undo/redo stacks. A new edit clears the redo stack.
#[derive(Debug, Default)]
pub struct History {
    undo_stack: Vec<EditCommand>,
    redo_stack: Vec<EditCommand>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a command that has already been applied.
    pub fn push(&mut self, command: EditCommand) {
        self.undo_stack.push(command);
        self.redo_stack.clear();
    }

    /// Revert the last edit. Returns false when there is nothing to undo.
    pub fn undo(&mut self, map: &mut TileMapData) -> bool {
        let Some(cmd) = self.undo_stack.pop() else {
            return false;
        };
        cmd.inverse().apply(map);
        self.redo_stack.push(cmd);
        true
    }

    /// Re-apply the last undone edit. Returns false when there is nothing
    /// to redo.
    pub fn redo(&mut self, map: &mut TileMapData) -> bool {
        let Some(cmd) = self.redo_stack.pop() else {
            return false;
        };
        cmd.apply(map);
        self.undo_stack.push(cmd);
        true
    }

    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paint(map: &mut TileMapData, x: i32, y: i32, id: u16) -> EditCommand {
        let old = map.set_tile(x, y, id).unwrap();
        EditCommand::SetTiles(vec![TileChange { x, y, old, new: id }])
    }

    #[test]
    fn set_tiles_undo_redo() {
        let mut map = TileMapData::new(1, 1);
        let mut history = History::new();

        let cmd = paint(&mut map, 0, 0, 4);
        history.push(cmd);
        assert!(history.undo(&mut map));
        assert_eq!(map.get_tile(0, 0), 0);

        assert!(history.redo(&mut map));
        assert_eq!(map.get_tile(0, 0), 4);
    }

    #[test]
    fn overlapping_changes_undo_in_reverse() {
        let mut map = TileMapData::new(1, 1);
        let cmd = EditCommand::SetTiles(vec![
            TileChange { x: 0, y: 0, old: 0, new: 1 },
            TileChange { x: 0, y: 0, old: 1, new: 2 },
        ]);
        cmd.apply(&mut map);
        assert_eq!(map.get_tile(0, 0), 2);
        cmd.inverse().apply(&mut map);
        assert_eq!(map.get_tile(0, 0), 0);
    }

    #[test]
    fn shrink_undo_restores_dropped_tiles() {
        let mut map = TileMapData::new(2, 2);
        map.set_tile(0, 0, 9);
        map.set_tile(2, 2, 5);

        let before = map.tiles().to_vec();
        map.resize(1, 1);
        let cmd = EditCommand::Resize {
            from: (2, 2),
            to: (1, 1),
            before,
            after: map.tiles().to_vec(),
        };
        assert_eq!(map.get_tile(0, 0), 0);

        cmd.inverse().apply(&mut map);
        assert_eq!((map.half_width(), map.half_height()), (2, 2));
        assert_eq!(map.get_tile(0, 0), 9);
        assert_eq!(map.get_tile(2, 2), 5);
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut map = TileMapData::new(1, 1);
        let mut history = History::new();

        let cmd = paint(&mut map, 1, 1, 3);
        history.push(cmd);
        history.undo(&mut map);
        assert!(history.can_redo());

        let cmd = paint(&mut map, 0, 1, 3);
        history.push(cmd);
        assert!(!history.can_redo());
        assert_eq!(history.undo_count(), 1);
    }

    #[test]
    fn empty_stacks_return_false() {
        let mut map = TileMapData::default();
        let mut history = History::new();
        assert!(!history.undo(&mut map));
        assert!(!history.redo(&mut map));
    }
}
