//! Grids and their cells.

use super::base::Base;
use rustc_hash::FxHashSet;
use std::fmt::{self, Display, Formatter};
use std::ops::{Index, IndexMut};

/// One position of a grid: a value and the region the position belongs to.
/// `0` stands for a cell without a value yet, `-1` for a cell without a
/// region yet.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Cell {
    /// Value carried by the cell, `0` when unassigned.
    pub value: u8,
    /// Identifier of the region the cell belongs to, `-1` when unassigned.
    pub region: i32,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            value: 0,
            region: -1,
        }
    }
}

impl Cell {
    /// Returns `true` iff both the value and the region are assigned.
    #[must_use]
    pub const fn is_filled(&self) -> bool {
        self.value >= 1 && self.region >= 0
    }
}

/// A base together with one cell per position, stored row by row.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Grid {
    /// Shape parameters of the grid.
    pub base: Base,
    /// Cells in row-major order.
    pub cells: Vec<Cell>,
}

impl Index<(usize, usize)> for Grid {
    type Output = Cell;

    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        &self.cells[self.base.index(row, col)]
    }
}

impl IndexMut<(usize, usize)> for Grid {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Self::Output {
        let index = self.base.index(row, col);
        &mut self.cells[index]
    }
}

impl Grid {
    /// Constructs a grid of `base` with every cell unassigned.
    #[must_use]
    pub fn new(base: Base) -> Self {
        Self {
            base,
            cells: vec![Cell::default(); base.cells()],
        }
    }

    /// Returns the number of distinct regions present in the grid.
    #[must_use]
    pub fn nb_regions(&self) -> usize {
        self.cells
            .iter()
            .filter_map(|cell| (cell.region >= 0).then_some(cell.region))
            .collect::<FxHashSet<_>>()
            .len()
    }

    /// Returns `true` iff every cell has a value.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.cells.iter().all(|cell| cell.value >= 1)
    }

    /// Renumbers regions so that their identifiers appear in increasing
    /// order of first occurrence, cells being visited row by row. Returns
    /// whether any cell was relabelled.
    ///
    /// This operation is idempotent and yields the unique labelling shared
    /// by all structurally equivalent grids.
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;
        let mut formers: Vec<i32> = Vec::new();

        for cell in &mut self.cells {
            let region = cell.region;
            if region >= 0 {
                let next = match formers.iter().position(|&former| former == region) {
                    Some(next) => next,
                    None => {
                        formers.push(region);
                        formers.len() - 1
                    }
                };
                let next = i32::try_from(next).unwrap();
                if next != region {
                    changed = true;
                }
                cell.region = next;
            }
        }

        changed
    }

    /// Returns `true` iff the grid already carries the labelling that
    /// [`Self::normalize`] would produce.
    #[must_use]
    pub fn is_normal(&self) -> bool {
        let mut formers: Vec<i32> = Vec::new();

        for cell in &self.cells {
            let region = cell.region;
            if region >= 0 {
                let next = match formers.iter().position(|&former| former == region) {
                    Some(next) => next,
                    None => {
                        formers.push(region);
                        formers.len() - 1
                    }
                };
                if i32::try_from(next).unwrap() != region {
                    return false;
                }
            }
        }

        true
    }

    /// Returns `true` iff the grid is the canonical representative of its
    /// orbit under the symmetry group of the rectangle, judged on cell
    /// values: the first quadrant must dominate its three symmetric
    /// counterparts.
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        let height = self.base.height as usize;
        let width = self.base.width as usize;

        for row in 0..height / 2 {
            for col in 0..width / 2 {
                let value = self[(row, col)].value;
                let mirrors = [
                    self[(row, width - 1 - col)].value,
                    self[(height - 1 - row, col)].value,
                    self[(height - 1 - row, width - 1 - col)].value,
                ];

                let mut assigned = mirrors.iter().filter(|&&mirror| mirror >= 1).peekable();
                if assigned.peek().is_none() {
                    if value >= 1 {
                        return true;
                    }
                } else {
                    for &mirror in assigned {
                        if mirror < value {
                            return false;
                        } else if mirror > value {
                            return true;
                        }
                    }
                }
            }
        }

        true
    }

    /// Rewrites the grid in place as its transpose: rows become columns and
    /// conversely.
    pub fn transpose(&mut self) {
        let dual = self.base.transposed();
        let mut cells = vec![Cell::default(); dual.cells()];

        for (index, cell) in cells.iter_mut().enumerate() {
            let (row, col) = dual.position(index);
            *cell = self.cells[self.base.index(col, row)];
        }

        self.base = dual;
        self.cells = cells;
    }
}

impl Display for Grid {
    /// Renders the values of the grid, drawing a border wherever two
    /// neighbouring cells belong to different regions.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let height = self.base.height as usize;
        let width = self.base.width as usize;

        let digits = self
            .cells
            .iter()
            .filter(|cell| cell.value >= 1)
            .map(|cell| cell.value.to_string().len())
            .max()
            .unwrap_or(1);

        for row in 0..height {
            // horizontal separator above the row
            write!(f, "+")?;
            for col in 0..width {
                let region = self[(row, col)].region;
                let border =
                    row == 0 || (region >= 0 && self[(row - 1, col)].region != region);
                let separator = if border { "-" } else { " " };
                write!(f, "{}+", separator.repeat(digits))?;
            }
            writeln!(f)?;

            // values of the row
            for col in 0..width {
                let cell = self[(row, col)];
                let border =
                    col == 0 || (cell.region >= 0 && self[(row, col - 1)].region != cell.region);
                write!(f, "{}", if border { '|' } else { ' ' })?;
                if cell.value >= 1 {
                    write!(f, "{:>digits$}", cell.value)?;
                } else {
                    write!(f, "{}", " ".repeat(digits))?;
                }
            }
            writeln!(f, "|")?;
        }

        // last horizontal separator
        write!(f, "+")?;
        for _ in 0..width {
            write!(f, "{}+", "-".repeat(digits))?;
        }

        Ok(())
    }
}
