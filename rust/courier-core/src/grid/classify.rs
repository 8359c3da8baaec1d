use bitvec::prelude::*;
use indexmap::IndexSet;
use itertools::iproduct;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::Tile;
use crate::surface::{Raster, Surface};

use super::{TileGrid, Traversability};

pub const ROAD_MIN: u8 = 90;
pub const ROAD_MAX: u8 = 150;

/// Inclusive per-channel band a pixel must fall in to count as road. Alpha is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoadColorRange {
    pub min: u8,
    pub max: u8,
}

impl Default for RoadColorRange {
    fn default() -> Self { Self { min: ROAD_MIN, max: ROAD_MAX } }
}

impl RoadColorRange {
    pub fn contains(&self, [r, g, b]: [u8; 3]) -> bool {
        let band = self.min..=self.max;
        band.contains(&r) && band.contains(&g) && band.contains(&b)
    }
}

/// Samples the top-left pixel of every tile, row by row, and splits tiles into road and non-road.
pub fn classify(surface: &Surface, range: RoadColorRange) -> TileGrid {
    let pitch = surface.pitch();
    let (columns, rows) = surface.grid_dimensions();
    let mut roads = IndexSet::new();
    let mut non_roads = IndexSet::new();
    let mut mask = bitvec![usize, Lsb0; 0; (columns as usize) * (rows as usize)];

    let xs = (0..surface.width()).step_by(pitch as usize);
    let ys = (0..surface.height()).step_by(pitch as usize);
    for (y, x) in iproduct!(ys, xs) {
        let tile = Tile::new((x / pitch) as i32, (y / pitch) as i32);
        let road = surface.rgb(x as i64, y as i64).map(|px| range.contains(px)).unwrap_or(false);
        if road {
            let idx = tile.y as usize * columns as usize + tile.x as usize;
            mask.set(idx, true);
            roads.insert(tile);
        } else {
            non_roads.insert(tile);
        }
    }

    debug!(columns, rows, pitch, roads = roads.len(), non_roads = non_roads.len(), "classified surface");
    TileGrid { pitch, columns, rows, roads, non_roads, mask }
}

/// Answers traversability by sampling the surface on every query instead of reading a cached grid.
pub struct LiveSampler<'a, R: Raster> {
    raster: &'a R,
    pitch: u32,
    range: RoadColorRange,
}

impl<'a, R: Raster> LiveSampler<'a, R> {
    pub fn new(raster: &'a R, pitch: u32, range: RoadColorRange) -> Self {
        Self { raster, pitch, range }
    }
}

impl<R: Raster> Traversability for LiveSampler<'_, R> {
    fn is_traversable(&self, tile: Tile) -> bool {
        let p = self.pitch as i64;
        self.raster
            .rgb(tile.x as i64 * p, tile.y as i64 * p)
            .map(|px| self.range.contains(px))
            .unwrap_or(false)
    }
}
