use serde::{Deserialize, Serialize};

use crate::grid::RoadColorRange;

pub const DEFAULT_MAX_EXPANSIONS: u64 = 1_000_000;
pub const DEFAULT_TICK_MS: u64 = 250;
pub const DEFAULT_FACE_DELAY_MS: u64 = 150;
pub const DEFAULT_ARRIVAL_PAUSE_MS: u64 = 1_000;
pub const DEFAULT_CANVAS_WIDTH: u32 = 1000;
pub const DEFAULT_CANVAS_HEIGHT: u32 = 700;
pub const DEFAULT_BASE_PITCH: u32 = 40;

/// Where the search reads traversability from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Re-sample the surface pixel for every neighbour.
    #[default]
    Live,
    /// Read the classified grid's bit mask.
    Cached,
}

impl std::str::FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(SearchMode::Live),
            "cached" | "cache" | "grid" => Ok(SearchMode::Cached),
            other => Err(format!("unknown search mode '{other}'")),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub mode: SearchMode,
    pub max_expansions: u64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self { mode: SearchMode::Live, max_expansions: DEFAULT_MAX_EXPANSIONS }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub tick_ms: u64,
    pub face_delay_ms: u64,
    pub arrival_pause_ms: u64,

    pub canvas_width: u32,
    pub canvas_height: u32,
    pub base_pitch: u32,

    pub road_color: RoadColorRange,
    pub search: SearchOptions,

    /// Fixed RNG seed; entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_ms: DEFAULT_TICK_MS,
            face_delay_ms: DEFAULT_FACE_DELAY_MS,
            arrival_pause_ms: DEFAULT_ARRIVAL_PAUSE_MS,
            canvas_width: DEFAULT_CANVAS_WIDTH,
            canvas_height: DEFAULT_CANVAS_HEIGHT,
            base_pitch: DEFAULT_BASE_PITCH,
            road_color: RoadColorRange::default(),
            search: SearchOptions::default(),
            seed: None,
        }
    }
}

impl SessionConfig {
    pub fn canvas_layout(&self) -> crate::surface::Layout {
        crate::surface::Layout::Canvas { width: self.canvas_width, height: self.canvas_height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_browser_timings() {
        let c = SessionConfig::default();
        assert_eq!(c.tick_ms, 250);
        assert_eq!(c.face_delay_ms, 150);
        assert_eq!(c.arrival_pause_ms, 1000);
        assert_eq!((c.canvas_width, c.canvas_height, c.base_pitch), (1000, 700, 40));
        assert_eq!(c.road_color, RoadColorRange { min: 90, max: 150 });
        assert_eq!(c.search.mode, SearchMode::Live);
    }

    #[test]
    fn deserializes_with_defaults_when_missing_fields() {
        let v = json!({ "tick_ms": 10, "search": { "mode": "cached" } });
        let c: SessionConfig = serde_json::from_value(v).unwrap();
        assert_eq!(c.tick_ms, 10);
        assert_eq!(c.search.mode, SearchMode::Cached);
        assert_eq!(c.search.max_expansions, DEFAULT_MAX_EXPANSIONS);
        assert_eq!(c.arrival_pause_ms, DEFAULT_ARRIVAL_PAUSE_MS);
        assert!(c.seed.is_none());
    }

    #[test]
    fn search_mode_parses_aliases() {
        assert_eq!("LIVE".parse::<SearchMode>().unwrap(), SearchMode::Live);
        assert_eq!("grid".parse::<SearchMode>().unwrap(), SearchMode::Cached);
        assert!("fast".parse::<SearchMode>().is_err());
    }
}
