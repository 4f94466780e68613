#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure construction system that turns pointer input into board edit commands.
//!
//! The player picks what to build (or demolition), then sweeps the cursor
//! over the board. Once a tile was changed it is skipped until the player
//! confirms, so holding the button over one tile never builds and demolishes
//! the same spot repeatedly.

use tile_defence_core::{Command, Event, GroundKind, TileContent, TileCoord};
use tracing::debug;

/// What the next placement does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    /// Constructs the provided content.
    Build(TileContent),
    /// Tears down whatever occupies the tile.
    Demolish,
}

/// Shape of the area covered by one placement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlacementMode {
    /// Every tile the cursor passes over while the action is held.
    #[default]
    Single,
    /// A straight row or column from the first pressed tile to the cursor.
    Line,
    /// A filled rectangle spanned by the first pressed tile and the cursor.
    Square,
}

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuilderInput {
    /// Tile under the cursor, as picked by the adapter's ray cast.
    pub cursor_tile: Option<TileCoord>,
    /// Whether the placement action is held on this frame.
    pub place_action: bool,
    /// Whether the player released the action and confirmed the placement.
    pub confirm_action: bool,
}

/// Construction system holding the selection and the current sweep.
#[derive(Clone, Debug, Default)]
pub struct Builder {
    selection: Option<Selection>,
    mode: PlacementMode,
    anchor: Option<TileCoord>,
    last_tile: Option<TileCoord>,
}

impl Builder {
    /// Creates a builder with nothing selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Active selection, if any.
    #[must_use]
    pub const fn selection(&self) -> Option<Selection> {
        self.selection
    }

    /// Active placement mode.
    #[must_use]
    pub const fn mode(&self) -> PlacementMode {
        self.mode
    }

    /// Chooses what subsequent placements do.
    pub fn select(&mut self, selection: Selection) {
        self.selection = Some(selection);
    }

    /// Chooses the area covered by subsequent placements.
    pub fn set_mode(&mut self, mode: PlacementMode) {
        self.mode = mode;
        self.anchor = None;
    }

    /// Drops the selection and any sweep in progress.
    pub fn cancel(&mut self) {
        self.selection = None;
        self.anchor = None;
        self.last_tile = None;
    }

    /// Consumes board events and frame input to emit edit commands.
    pub fn handle(&mut self, events: &[Event], input: BuilderInput, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::BuildingPlaced { tile, .. }
                | Event::BridgePlaced { tile }
                | Event::Demolished { tile, .. }
                | Event::SpawnPointToggled { tile, .. } => self.last_tile = Some(*tile),
                _ => {}
            }
        }

        let Some(selection) = self.selection else {
            return;
        };

        match self.mode {
            PlacementMode::Single => {
                if input.place_action {
                    if let Some(tile) = input.cursor_tile {
                        self.emit(selection, tile, out);
                    }
                }
            }
            PlacementMode::Line | PlacementMode::Square => {
                if input.place_action && self.anchor.is_none() {
                    self.anchor = input.cursor_tile;
                }
                if input.confirm_action {
                    if let (Some(anchor), Some(cursor)) = (self.anchor, input.cursor_tile) {
                        let area = if self.mode == PlacementMode::Line {
                            line_between(anchor, cursor)
                        } else {
                            rect_between(anchor, cursor)
                        };
                        debug!(?anchor, ?cursor, tiles = area.len(), "placing area");
                        for tile in area {
                            self.emit(selection, tile, out);
                        }
                    }
                    self.anchor = None;
                }
            }
        }

        if input.confirm_action {
            self.last_tile = None;
        }
    }

    fn emit(&self, selection: Selection, tile: TileCoord, out: &mut Vec<Command>) {
        if self.last_tile == Some(tile) {
            return;
        }
        out.push(command_for(selection, tile));
    }
}

/// Command that applies `selection` to `tile`.
#[must_use]
pub fn command_for(selection: Selection, tile: TileCoord) -> Command {
    match selection {
        Selection::Demolish => Command::Demolish { tile },
        Selection::Build(TileContent::Ground(GroundKind::Bridge)) => Command::PlaceBridge { tile },
        Selection::Build(TileContent::SpawnPoint) => Command::ToggleSpawnPoint { tile },
        Selection::Build(content) => Command::PlaceBuilding { tile, content },
    }
}

/// Tiles of the straight run from `from` toward `to` along the longer axis.
#[must_use]
pub fn line_between(from: TileCoord, to: TileCoord) -> Vec<TileCoord> {
    let columns = span(from.column(), to.column());
    let rows = span(from.row(), to.row());
    if columns.len() >= rows.len() {
        columns
            .into_iter()
            .map(|column| TileCoord::new(column, from.row()))
            .collect()
    } else {
        rows.into_iter()
            .map(|row| TileCoord::new(from.column(), row))
            .collect()
    }
}

/// Tiles of the rectangle with corners `from` and `to`, row by row.
#[must_use]
pub fn rect_between(from: TileCoord, to: TileCoord) -> Vec<TileCoord> {
    let columns = span(from.column(), to.column());
    span(from.row(), to.row())
        .into_iter()
        .flat_map(|row| columns.iter().map(move |&column| TileCoord::new(column, row)))
        .collect()
}

/// Values from `from` to `to` inclusive, in walking order.
fn span(from: u32, to: u32) -> Vec<u32> {
    if from <= to {
        (from..=to).collect()
    } else {
        (to..=from).rev().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_follow_the_longer_axis() {
        assert_eq!(
            line_between(TileCoord::new(3, 1), TileCoord::new(1, 2)),
            vec![
                TileCoord::new(3, 1),
                TileCoord::new(2, 1),
                TileCoord::new(1, 1)
            ]
        );
        assert_eq!(
            line_between(TileCoord::new(0, 0), TileCoord::new(1, 2)),
            vec![
                TileCoord::new(0, 0),
                TileCoord::new(0, 1),
                TileCoord::new(0, 2)
            ]
        );
    }

    #[test]
    fn rectangles_cover_every_tile_once() {
        let tiles = rect_between(TileCoord::new(2, 2), TileCoord::new(0, 1));
        assert_eq!(tiles.len(), 6);
        assert_eq!(tiles[0], TileCoord::new(2, 2));
        assert!(tiles.contains(&TileCoord::new(0, 1)));
    }
}
