pub mod classify;

use bitvec::prelude::*;
use indexmap::IndexSet;

use crate::models::Tile;

pub use classify::{classify, LiveSampler, RoadColorRange};

/// Anything that can say whether a tile may be walked on.
pub trait Traversability {
    fn is_traversable(&self, tile: Tile) -> bool;
}

/// Road/non-road partition of a classified surface.
///
/// Both sets keep row-major sampling order; the placement fallback relies on
/// `non_roads` having a stable first element.
#[derive(Debug, Clone)]
pub struct TileGrid {
    pub(crate) pitch: u32,
    pub(crate) columns: u32,
    pub(crate) rows: u32,
    pub(crate) roads: IndexSet<Tile>,
    pub(crate) non_roads: IndexSet<Tile>,
    pub(crate) mask: BitVec,
}

impl TileGrid {
    pub fn pitch(&self) -> u32 { self.pitch }
    pub fn columns(&self) -> u32 { self.columns }
    pub fn rows(&self) -> u32 { self.rows }
    pub fn roads(&self) -> &IndexSet<Tile> { &self.roads }
    pub fn non_roads(&self) -> &IndexSet<Tile> { &self.non_roads }

    pub fn contains(&self, tile: Tile) -> bool {
        tile.x >= 0 && tile.y >= 0 && (tile.x as u32) < self.columns && (tile.y as u32) < self.rows
    }

    pub fn is_road(&self, tile: Tile) -> bool {
        if !self.contains(tile) {
            return false;
        }
        let idx = tile.y as usize * self.columns as usize + tile.x as usize;
        self.mask.get(idx).map(|b| *b).unwrap_or(false)
    }

    pub fn len(&self) -> usize { self.roads.len() + self.non_roads.len() }
    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl Traversability for TileGrid {
    fn is_traversable(&self, tile: Tile) -> bool { self.is_road(tile) }
}

impl<T: Traversability + ?Sized> Traversability for &T {
    fn is_traversable(&self, tile: Tile) -> bool { (**self).is_traversable(tile) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Surface;
    use image::{Rgba, RgbaImage};

    fn striped(w: u32, h: u32, pitch: u32) -> Surface {
        let mut img = RgbaImage::from_pixel(w, h, Rgba([20, 160, 40, 255]));
        for y in 0..h {
            for x in 0..w {
                if (x / pitch + y / pitch) % 2 == 0 {
                    img.put_pixel(x, y, Rgba([128, 128, 128, 255]));
                }
            }
        }
        Surface::new(img, pitch).unwrap()
    }

    #[test]
    fn every_tile_lands_in_exactly_one_set() {
        let s = striped(50, 35, 10);
        let g = classify(&s, RoadColorRange::default());
        assert_eq!((g.columns(), g.rows()), (5, 4));
        assert_eq!(g.len(), 20);
        for y in 0..4 {
            for x in 0..5 {
                let t = Tile::new(x, y);
                assert!(g.roads().contains(&t) ^ g.non_roads().contains(&t), "{t:?}");
                assert_eq!(g.is_road(t), g.roads().contains(&t));
            }
        }
    }

    #[test]
    fn partial_trailing_tiles_are_sampled() {
        // 23 px wide at pitch 10: columns start at 0, 10, 20
        let s = striped(23, 10, 10);
        let g = classify(&s, RoadColorRange::default());
        assert_eq!(g.columns(), 3);
        assert!(g.is_road(Tile::new(2, 0)));
        assert!(!g.contains(Tile::new(3, 0)));
    }

    #[test]
    fn sets_keep_row_major_order() {
        let s = striped(30, 20, 10);
        let g = classify(&s, RoadColorRange::default());
        let non: Vec<Tile> = g.non_roads().iter().copied().collect();
        assert_eq!(non, vec![Tile::new(1, 0), Tile::new(0, 1), Tile::new(2, 1)]);
        assert_eq!(g.non_roads().first(), Some(&Tile::new(1, 0)));
    }

    #[test]
    fn out_of_bounds_is_never_road() {
        let s = striped(20, 20, 10);
        let g = classify(&s, RoadColorRange::default());
        assert!(!g.is_traversable(Tile::new(-1, 0)));
        assert!(!g.is_traversable(Tile::new(0, 2)));
    }
}
