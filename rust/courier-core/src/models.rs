use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
}

impl Tile {
    pub const fn new(x: i32, y: i32) -> Self { Self { x, y } }

    pub fn manhattan(self, other: Tile) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    pub fn chebyshev(self, other: Tile) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    /// True when `other` is one step away along exactly one axis.
    pub fn is_orthogonally_adjacent(self, other: Tile) -> bool {
        self.manhattan(other) == 1
    }

    /// Right, left, down, up. Search expansion relies on this order.
    pub fn neighbors4(self) -> [Tile; 4] {
        [
            Tile::new(self.x + 1, self.y),
            Tile::new(self.x - 1, self.y),
            Tile::new(self.x, self.y + 1),
            Tile::new(self.x, self.y - 1),
        ]
    }
}

impl From<(i32, i32)> for Tile {
    fn from((x, y): (i32, i32)) -> Self { Tile { x, y } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    #[default]
    Right,
}

impl Direction {
    /// Axis-aligned heading from `from` towards `to`. The x axis wins when both differ;
    /// identical tiles face right.
    pub fn between(from: Tile, to: Tile) -> Self {
        if to.x != from.x {
            if to.x > from.x { Direction::Right } else { Direction::Left }
        } else if to.y != from.y {
            if to.y > from.y { Direction::Down } else { Direction::Up }
        } else {
            Direction::Right
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub tile: Tile,
    pub direction: Direction,
    pub carrying: bool,
}

impl Agent {
    pub fn at(tile: Tile) -> Self {
        Self { tile, direction: Direction::default(), carrying: false }
    }
}

/// Agent start plus the two targets of one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub agent: Tile,
    pub pickup: Tile,
    pub dropoff: Tile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_prefers_x_axis() {
        let o = Tile::new(3, 3);
        assert_eq!(Direction::between(o, Tile::new(4, 3)), Direction::Right);
        assert_eq!(Direction::between(o, Tile::new(2, 3)), Direction::Left);
        assert_eq!(Direction::between(o, Tile::new(3, 4)), Direction::Down);
        assert_eq!(Direction::between(o, Tile::new(3, 2)), Direction::Up);
        assert_eq!(Direction::between(o, Tile::new(4, 0)), Direction::Right);
        assert_eq!(Direction::between(o, o), Direction::Right);
    }

    #[test]
    fn adjacency_is_orthogonal_only() {
        let o = Tile::new(0, 0);
        assert!(o.is_orthogonally_adjacent(Tile::new(1, 0)));
        assert!(o.is_orthogonally_adjacent(Tile::new(0, -1)));
        assert!(!o.is_orthogonally_adjacent(Tile::new(1, 1)));
        assert!(!o.is_orthogonally_adjacent(o));
        assert_eq!(o.chebyshev(Tile::new(1, 1)), 1);
    }
}
