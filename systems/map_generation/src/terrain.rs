/// Coarse terrain class tracked while the generator runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Terrain {
    /// Impassable water.
    Water,
    /// Open ground.
    Ground,
    /// Impassable mountain.
    Mountain,
    /// Resource deposit awaiting a variation.
    Resource,
}

/// Grid cell position used by the generator; signed so neighbours can step off the edge.
pub type Cell = (i32, i32);

/// Dense interior map the generator mutates in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerrainGrid {
    width: i32,
    height: i32,
    cells: Vec<Terrain>,
}

impl TerrainGrid {
    /// Creates a grid of the provided size filled with `fill`.
    #[must_use]
    pub fn new(width: u32, height: u32, fill: Terrain) -> Self {
        let width = i32::try_from(width).unwrap_or(i32::MAX);
        let height = i32::try_from(height).unwrap_or(i32::MAX);
        let count = usize::try_from(width)
            .unwrap_or(0)
            .saturating_mul(usize::try_from(height).unwrap_or(0));
        Self {
            width,
            height,
            cells: vec![fill; count],
        }
    }

    /// Builds a grid from rows of text where `~` is water, `^` mountain,
    /// `*` resource, and anything else ground. The first line is the top row.
    #[must_use]
    pub fn from_rows(rows: &[&str]) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.chars().count());
        let mut grid = Self::new(
            u32::try_from(width).unwrap_or(0),
            u32::try_from(height).unwrap_or(0),
            Terrain::Ground,
        );
        for (line, row) in rows.iter().enumerate() {
            let y = i32::try_from(height - 1 - line).unwrap_or(0);
            for (x, symbol) in row.chars().enumerate() {
                let terrain = match symbol {
                    '~' => Terrain::Water,
                    '^' => Terrain::Mountain,
                    '*' => Terrain::Resource,
                    _ => Terrain::Ground,
                };
                grid.set((i32::try_from(x).unwrap_or(0), y), terrain);
            }
        }
        grid
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Whether the cell lies inside the grid.
    #[must_use]
    pub fn contains(&self, (x, y): Cell) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    /// Terrain stored at the cell, or `None` beyond the edge.
    #[must_use]
    pub fn get(&self, cell: Cell) -> Option<Terrain> {
        self.index(cell).map(|index| self.cells[index])
    }

    /// Overwrites the terrain at the cell; cells beyond the edge are ignored.
    pub fn set(&mut self, cell: Cell, terrain: Terrain) {
        if let Some(index) = self.index(cell) {
            self.cells[index] = terrain;
        }
    }

    /// Whether the cell holds the provided terrain.
    #[must_use]
    pub fn is(&self, cell: Cell, terrain: Terrain) -> bool {
        self.get(cell) == Some(terrain)
    }

    /// Cells in generator scan order: columns outermost, rows innermost.
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let (width, height) = (self.width, self.height);
        (0..width).flat_map(move |x| (0..height).map(move |y| (x, y)))
    }

    /// Number of cells holding the provided terrain.
    #[must_use]
    pub fn count(&self, terrain: Terrain) -> usize {
        self.cells.iter().filter(|cell| **cell == terrain).count()
    }

    /// Position of `cell` in row-major storage, if it lies on the grid.
    pub(crate) fn index(&self, (x, y): Cell) -> Option<usize> {
        if !self.contains((x, y)) {
            return None;
        }
        let column = usize::try_from(x).ok()?;
        let row = usize::try_from(y).ok()?;
        let width = usize::try_from(self.width).ok()?;
        Some(row * width + column)
    }
}

/// The four orthogonal neighbours of a cell, in or out of range.
pub(crate) fn orthogonal((x, y): Cell) -> [Cell; 4] {
    [(x, y + 1), (x + 1, y), (x, y - 1), (x - 1, y)]
}

/// The eight surrounding cells in scan order, in or out of range.
pub(crate) fn surrounding((x, y): Cell) -> impl Iterator<Item = Cell> {
    (x - 1..=x + 1)
        .flat_map(move |nx| (y - 1..=y + 1).map(move |ny| (nx, ny)))
        .filter(move |cell| *cell != (x, y))
}
