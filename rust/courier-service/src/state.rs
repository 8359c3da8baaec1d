use courier_core::{ControlState, Phase, Presenter, RenderFrame, SessionSnapshot, Tile, TileGrid};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::driver::DriverHandle;

#[derive(Clone)]
pub struct AppState {
    pub driver: DriverHandle,
}

/// What `/state` returns: the last frame and status the session pushed out,
/// plus clock and grid facts read from the session after each batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub phase: Phase,
    pub status: String,
    pub frame: Option<RenderFrame>,
    pub controls: ControlState,
    pub completions: u64,
    pub ticks: u64,
    pub now_ms: u64,
    pub pitch: Option<u32>,
    pub columns: Option<u32>,
    pub rows: Option<u32>,
}

impl SessionView {
    pub fn absorb(&mut self, snap: SessionSnapshot) {
        self.phase = snap.phase;
        self.ticks = snap.ticks;
        self.now_ms = snap.now_ms;
        self.pitch = snap.pitch;
        self.columns = snap.columns;
        self.rows = snap.rows;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridView {
    pub pitch: u32,
    pub columns: u32,
    pub rows: u32,
    pub roads: Vec<Tile>,
    pub non_roads: Vec<Tile>,
}

impl From<&TileGrid> for GridView {
    fn from(g: &TileGrid) -> Self {
        Self {
            pitch: g.pitch(),
            columns: g.columns(),
            rows: g.rows(),
            roads: g.roads().iter().copied().collect(),
            non_roads: g.non_roads().iter().copied().collect(),
        }
    }
}

/// Presenter that folds session output into a [`SessionView`].
#[derive(Debug, Default)]
pub struct ViewPresenter {
    pub view: SessionView,
}

impl Presenter for ViewPresenter {
    fn render(&mut self, frame: &RenderFrame) {
        self.view.frame = Some(*frame);
    }

    fn status(&mut self, message: &str) {
        self.view.status = message.to_string();
    }

    fn controls(&mut self, controls: ControlState) {
        self.view.controls = controls;
    }

    fn journey_complete(&mut self) {
        self.view.completions += 1;
        info!(completions = self.view.completions, "celebration");
    }
}
