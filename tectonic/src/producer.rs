//! Enumeration of the legal ways of filling the next cell of a grid.

use super::codec;
use super::error::Result;
use super::grid::Cell;
use super::region::Regions;
use itertools::Itertools;
use num_bigint::BigUint;

/// Produces, for codes of grids whose first `stage` cells are filled, the
/// codes of every legal grid obtained by filling the cell at index `stage`.
///
/// The order of production is deterministic: the candidate cell first
/// extends each adjacent region in increasing identifier order, then opens
/// a fresh region, and finally merges the two adjacent regions; for a given
/// region choice, values are tried in increasing order. Checkpoint replay
/// relies on this order being stable.
#[derive(Clone, Copy, Debug)]
pub struct Producer {
    stage: usize,
}

impl Producer {
    /// Constructor. `stage` is the index of the cell the producer fills.
    #[must_use]
    pub const fn new(stage: usize) -> Self {
        Self { stage }
    }

    /// Returns the codes of every successor of `code`, in production order.
    ///
    /// A successor is pruned when it would close an adjacent region that
    /// does not yet hold all of its values, since no later cell could ever
    /// repair it.
    ///
    /// # Errors
    ///
    /// Propagates codec errors on `code` or on a successor.
    pub fn successors(&self, code: &BigUint) -> Result<Vec<BigUint>> {
        let mut grid = codec::decode(code)?;
        let base = grid.base;
        let (row, col) = base.position(self.stage);
        let regions = Regions::survey(&grid);

        // regions holding the cell through its west and north sides; a
        // single region may touch through both
        let mut sides: Vec<usize> = Vec::with_capacity(2);
        if col > 0 {
            sides.push(usize::try_from(grid[(row, col - 1)].region).unwrap());
        }
        if row > 0 {
            sides.push(usize::try_from(grid[(row - 1, col)].region).unwrap());
        }
        let adjacent: Vec<usize> = sides.iter().copied().sorted().dedup().collect();

        // the king-move rule: no value may repeat among the already filled
        // cells within a Chebyshev distance of 1
        let mut taken = [false; 256];
        if col > 0 {
            taken[grid[(row, col - 1)].value as usize] = true;
        }
        if row > 0 {
            taken[grid[(row - 1, col)].value as usize] = true;
            if col > 0 {
                taken[grid[(row - 1, col - 1)].value as usize] = true;
            }
            if col + 1 < base.width as usize {
                taken[grid[(row - 1, col + 1)].value as usize] = true;
            }
        }
        let possible: Vec<u8> = (1..=base.maximum).filter(|&v| !taken[v as usize]).collect();

        let mut codes = Vec::new();

        // 1) extend each adjacent region in every possible way
        for (chosen, &extended) in adjacent.iter().enumerate() {
            let closes_other = adjacent.iter().enumerate().any(|(other, &id)| {
                let region = regions.get(id).unwrap();
                other != chosen && region.free_border == 1 && region.is_incomplete()
            });
            if closes_other {
                continue;
            }

            let held = &regions.get(extended).unwrap().values;
            for value in possible.iter().copied().filter(|value| !held.contains(value)) {
                grid.cells[self.stage] = Cell {
                    value,
                    region: i32::try_from(extended).unwrap(),
                };
                codes.push(codec::encode(&grid)?);
            }
        }

        // 2) open a fresh region, unless that would close an adjacent one
        let orphans = adjacent.iter().any(|&id| {
            let touches = u32::try_from(sides.iter().filter(|&&side| side == id).count()).unwrap();
            let region = regions.get(id).unwrap();
            region.free_border == touches && region.is_incomplete()
        });
        if !orphans {
            let fresh = regions.region_max() + 1;
            for &value in &possible {
                grid.cells[self.stage] = Cell {
                    value,
                    region: fresh,
                };
                codes.push(codec::encode(&grid)?);
            }
        }

        // 3) merge the two adjacent regions when they only meet here
        for (&low, &high) in adjacent.iter().tuple_combinations() {
            let first = regions.get(low).unwrap();
            let second = regions.get(high).unwrap();
            if first.neighbours.contains(&high) || !first.values.is_disjoint(&second.values) {
                continue;
            }

            let usable: Vec<u8> = possible
                .iter()
                .copied()
                .filter(|value| !first.values.contains(value) && !second.values.contains(value))
                .collect();
            if usable.is_empty() {
                continue;
            }

            let mut merged = grid.clone();
            let low = i32::try_from(low).unwrap();
            for cell in &mut merged.cells {
                if cell.region == i32::try_from(high).unwrap() {
                    cell.region = low;
                }
            }
            merged.cells[self.stage].region = low;
            merged.normalize();

            for &value in &usable {
                merged.cells[self.stage].value = value;
                codes.push(codec::encode(&merged)?);
            }
        }

        Ok(codes)
    }
}
