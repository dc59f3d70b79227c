//! Summary of the regions of a grid.

use super::grid::Grid;
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

/// Derived description of one region: the values it holds, the regions it
/// touches and the number of unassigned cells it could still grow into.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Region {
    /// Values carried by the cells of the region.
    pub values: FxHashSet<u8>,
    /// Identifiers of the regions 4-adjacent to this one.
    pub neighbours: FxHashSet<usize>,
    /// Number of unassigned cells 4-adjacent to the region.
    pub free_border: u32,
}

impl Region {
    /// Returns `true` iff the values do not form a contiguous interval
    /// starting at 1.
    #[must_use]
    pub fn is_incomplete(&self) -> bool {
        let mut count = 0_u32;
        let mut minimum = u8::MAX;
        let mut maximum = u8::MIN;
        for &value in &self.values {
            count += 1;
            minimum = minimum.min(value);
            maximum = maximum.max(value);
        }
        count == 0 || minimum != 1 || u32::from(maximum - minimum) + 1 != count
    }

    /// A region is anomalous when it cannot grow any more and does not
    /// contain all the values it is supposed to. Grids holding such a
    /// region cannot extend to a legal complete grid.
    #[must_use]
    pub fn is_anomalous(&self) -> bool {
        self.free_border == 0 && self.is_incomplete()
    }
}

/// Per-region summaries of a (partial or full) grid, computed in a single
/// row-major pass.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Regions {
    summaries: BTreeMap<usize, Region>,
}

impl Regions {
    /// Surveys `grid`. Only the two forward 4-neighbours of each cell are
    /// inspected, since adjacency is symmetric.
    #[must_use]
    pub fn survey(grid: &Grid) -> Self {
        let mut summaries: BTreeMap<usize, Region> = BTreeMap::new();

        for (index, cell) in grid.cells.iter().enumerate() {
            let Ok(region) = usize::try_from(cell.region) else {
                continue;
            };

            if cell.value > 0 {
                summaries
                    .entry(region)
                    .or_default()
                    .values
                    .insert(cell.value);
            }

            let (row, col) = grid.base.position(index);
            for (next_row, next_col) in [(row, col + 1), (row + 1, col)] {
                if next_row < grid.base.height as usize && next_col < grid.base.width as usize {
                    match usize::try_from(grid[(next_row, next_col)].region) {
                        Err(_) => summaries.entry(region).or_default().free_border += 1,
                        Ok(other) if other != region => {
                            summaries.entry(region).or_default().neighbours.insert(other);
                            summaries.entry(other).or_default().neighbours.insert(region);
                        }
                        Ok(_) => {}
                    }
                }
            }
        }

        Self { summaries }
    }

    /// Returns the summary of region `id`, if the region is present.
    #[must_use]
    pub fn get(&self, id: usize) -> Option<&Region> {
        self.summaries.get(&id)
    }

    /// Returns the highest region identifier present, or −1 if the grid
    /// holds no region at all.
    #[must_use]
    pub fn region_max(&self) -> i32 {
        self.summaries
            .keys()
            .next_back()
            .map_or(-1, |&id| i32::try_from(id).unwrap())
    }

    /// Returns `true` iff at least one region is anomalous.
    #[must_use]
    pub fn any_anomalous(&self) -> bool {
        self.summaries.values().any(Region::is_anomalous)
    }
}
