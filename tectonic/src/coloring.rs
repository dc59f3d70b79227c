//! Four-colouring of the region neighbourhood graph.
//!
//! Neighbourhood is judged on king moves: two regions are neighbours as
//! soon as one cell of the first lies within a Chebyshev distance of 1 of
//! one cell of the second. This is stricter than the shared-border
//! adjacency of the four-colour theorem, so a colouring is not guaranteed
//! to exist and has to be searched for.

use super::grid::Grid;
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

/// Builds the king-move adjacency between the regions of `grid`. Every
/// present region appears as a node, isolated ones included.
fn region_graph(grid: &Grid) -> BTreeMap<usize, FxHashSet<usize>> {
    let height = grid.base.height as usize;
    let width = grid.base.width as usize;

    let mut graph: BTreeMap<usize, FxHashSet<usize>> = BTreeMap::new();

    for (index, cell) in grid.cells.iter().enumerate() {
        let Ok(region) = usize::try_from(cell.region) else {
            continue;
        };
        graph.entry(region).or_default();

        // forward half of the 8 king moves; adjacency is symmetric
        let (row, col) = grid.base.position(index);
        for (next_row, next_col) in [
            (row.wrapping_sub(1), col + 1),
            (row, col + 1),
            (row + 1, col + 1),
            (row + 1, col),
        ] {
            if next_row < height && next_col < width {
                if let Ok(other) = usize::try_from(grid[(next_row, next_col)].region) {
                    if other != region {
                        graph.entry(region).or_default().insert(other);
                        graph.entry(other).or_default().insert(region);
                    }
                }
            }
        }
    }

    graph
}

/// Searches for a total colouring of `graph` with at most four colours, by
/// backtracking over the nodes in increasing identifier order.
fn colorable(graph: &BTreeMap<usize, FxHashSet<usize>>) -> bool {
    fn assign(
        order: &[usize],
        graph: &BTreeMap<usize, FxHashSet<usize>>,
        colors: &mut BTreeMap<usize, u8>,
        position: usize,
    ) -> bool {
        let Some(&region) = order.get(position) else {
            return true;
        };

        for color in 0..4_u8 {
            let conflict = graph[&region]
                .iter()
                .any(|neighbour| colors.get(neighbour) == Some(&color));
            if conflict {
                continue;
            }

            colors.insert(region, color);
            if assign(order, graph, colors, position + 1) {
                return true;
            }
            colors.remove(&region);
        }

        false
    }

    let order: Vec<usize> = graph.keys().copied().collect();
    assign(&order, graph, &mut BTreeMap::new(), 0)
}

/// Returns `true` iff the regions of `grid` can be painted with four
/// colours, no two king-move neighbours sharing one.
#[must_use]
pub fn is_four_colorable(grid: &Grid) -> bool {
    colorable(&region_graph(grid))
}
