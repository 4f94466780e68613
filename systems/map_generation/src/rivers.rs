//! River carving between lakes.

use crate::terrain::{Cell, Terrain, TerrainGrid};

/// Rasterises the segment between two cells with Bresenham's algorithm.
///
/// The result starts at `from`, ends at `to`, and advances exactly one cell
/// along the longer axis per step.
#[must_use]
pub fn bresenham_line(from: Cell, to: Cell) -> Vec<Cell> {
    let (mut x, mut y) = from;
    let dx = to.0 - x;
    let dy = to.1 - y;

    let mut step = dx.signum();
    let mut gradient_step = dy.signum();
    let mut longest = dx.abs();
    let mut shortest = dy.abs();
    let inverted = longest < shortest;
    if inverted {
        std::mem::swap(&mut longest, &mut shortest);
        std::mem::swap(&mut step, &mut gradient_step);
    }

    let mut accumulation = longest / 2;
    let mut line = Vec::with_capacity(usize::try_from(longest).unwrap_or(0) + 1);
    for _ in 0..=longest {
        line.push((x, y));
        if inverted {
            y += step;
        } else {
            x += step;
        }
        accumulation += shortest;
        if accumulation >= longest {
            if inverted {
                x += gradient_step;
            } else {
                y += gradient_step;
            }
            accumulation -= longest;
        }
    }
    line
}

/// Turns a Bresenham line into a 4-connected river course.
///
/// Diagonal steps get a corner cell, and when the course has no straight run
/// of three cells it is extended by one cell past its end so a bridge always
/// has somewhere to go.
#[must_use]
pub(crate) fn river_course(from: Cell, to: Cell) -> Vec<Cell> {
    let line = bresenham_line(from, to);
    let mut course: Vec<Cell> = Vec::with_capacity(line.len() * 2);
    for cell in line {
        if let Some(&previous) = course.last() {
            if previous.0 != cell.0 && previous.1 != cell.1 {
                course.push((cell.0, previous.1));
            }
        }
        course.push(cell);
    }

    if !has_straight_run(&course) && course.len() >= 2 {
        let last = course[course.len() - 1];
        let before = course[course.len() - 2];
        course.push((2 * last.0 - before.0, 2 * last.1 - before.1));
    }
    course
}

/// Whether three consecutive cells of the course share a row or column.
#[must_use]
pub(crate) fn has_straight_run(course: &[Cell]) -> bool {
    course.windows(3).any(|window| {
        let same_column = window[0].0 == window[1].0 && window[1].0 == window[2].0;
        let same_row = window[0].1 == window[1].1 && window[1].1 == window[2].1;
        same_column || same_row
    })
}

/// Floods the course between two lake edge cells.
pub(crate) fn carve_river(grid: &mut TerrainGrid, from: Cell, to: Cell) {
    for cell in river_course(from, to) {
        grid.set(cell, Terrain::Water);
    }
}
