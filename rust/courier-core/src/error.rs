use thiserror::Error;

use crate::models::{Placement, Tile};

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("no path from ({},{}) towards ({},{})", from.x, from.y, to.x, to.y)]
    NoPathFound { from: Tile, to: Tile },
    #[error("grid has {roads} road and {non_roads} non-road tiles; need at least 1 and 2")]
    InsufficientGrid { roads: usize, non_roads: usize },
    #[error("placement does not fit the grid: {0:?}")]
    InvalidPlacement(Placement),
    #[error("no map has been placed yet")]
    NotReady,
    #[error("start is disabled until the next round is placed")]
    StartDisabled,
    #[error("surface has zero width or height")]
    EmptySurface,
    #[error("image decode failed: {0}")]
    Decode(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
