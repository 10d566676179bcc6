//! Tile map authoring: brush, eraser and fill tools over a canvas camera,
//! with undo/redo.
//!
//! # Invariants
//! - Every edit to an open map is reversible.
//! - A stroke (button down to button up) is a single undo step.

mod canvas;
mod history;
mod tilemap_editor;

pub use canvas::{CanvasCamera, MAX_ZOOM, MIN_ZOOM};
pub use history::{EditCommand, History, TileChange};
pub use tilemap_editor::{
    CanvasInput, EditError, MAX_CELL_SIZE, MAX_HALF_EXTENT, MIN_CELL_SIZE, TileMapEditor, Tool,
};
