use indexmap::IndexSet;
use rand::Rng;

use crate::error::{CoreError, Result};
use crate::grid::TileGrid;
use crate::models::{Placement, Tile};

pub const MIN_ROADS: usize = 1;
pub const MIN_NON_ROADS: usize = 2;

/// Picks the agent start and the pickup/drop-off targets for a round.
///
/// Pickup and drop-off are sampled independently and may land on the same tile.
pub fn place_entities<R: Rng + ?Sized>(grid: &TileGrid, rng: &mut R) -> Result<Placement> {
    let roads = grid.roads();
    let non_roads = grid.non_roads();
    if roads.len() < MIN_ROADS || non_roads.len() < MIN_NON_ROADS {
        return Err(CoreError::InsufficientGrid { roads: roads.len(), non_roads: non_roads.len() });
    }

    let agent = pick(roads, rng);
    let pickup_anchor = pick(roads, rng);
    let pickup = find_nearest_non_road(pickup_anchor, non_roads, rng);
    let dropoff_anchor = pick(roads, rng);
    let dropoff = find_nearest_non_road(dropoff_anchor, non_roads, rng);
    match (pickup, dropoff) {
        (Some(pickup), Some(dropoff)) => Ok(Placement { agent, pickup, dropoff }),
        _ => Err(CoreError::InsufficientGrid { roads: roads.len(), non_roads: non_roads.len() }),
    }
}

/// A random non-road tile within Chebyshev distance 1 of `road`, or the first
/// non-road tile when none is that close. `None` only for an empty set.
pub fn find_nearest_non_road<R: Rng + ?Sized>(road: Tile, non_roads: &IndexSet<Tile>, rng: &mut R) -> Option<Tile> {
    let candidates: Vec<Tile> = non_roads.iter().copied().filter(|t| t.chebyshev(road) <= 1).collect();
    if candidates.is_empty() {
        return non_roads.first().copied();
    }
    Some(candidates[rng.gen_range(0..candidates.len())])
}

fn pick<R: Rng + ?Sized>(set: &IndexSet<Tile>, rng: &mut R) -> Tile {
    set[rng.gen_range(0..set.len())]
}
