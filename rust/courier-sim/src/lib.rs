//! Headless driver: runs one courier round on a virtual clock.
//!
//! No wall time passes. The clock jumps straight to each next timer deadline,
//! so a round that would take a minute in the browser finishes instantly.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use courier_core::{
    Agent, ControlState, Layout, Phase, Presenter, RenderFrame, Session, SessionConfig, Surface, Tile,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct SimOptions {
    pub map: PathBuf,
    pub layout: Layout,
    /// Virtual time after which the run is abandoned.
    pub max_time: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Complete,
    /// No timer left to fire, e.g. the courier found no route.
    Stalled,
    TimeCap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub outcome: Outcome,
    pub phase: Phase,
    pub status: String,
    pub ticks: u64,
    pub elapsed_ms: u64,
    pub completed: bool,
    pub frames: u64,
    pub pitch: u32,
    pub columns: u32,
    pub rows: u32,
    pub agent: Option<Agent>,
    pub pickup: Option<Tile>,
    pub dropoff: Option<Tile>,
}

/// Presenter that turns session output into log lines.
#[derive(Debug, Default)]
pub struct TracingPresenter {
    pub frames: u64,
    pub completions: u64,
}

impl Presenter for TracingPresenter {
    fn render(&mut self, frame: &RenderFrame) {
        self.frames += 1;
        debug!(x = frame.agent.x, y = frame.agent.y, direction = frame.direction.as_str(), carrying = frame.carrying, "frame");
    }

    fn status(&mut self, message: &str) {
        info!(status = message);
    }

    fn controls(&mut self, controls: ControlState) {
        debug!(start = controls.start_enabled, randomize = controls.randomize_enabled, "controls");
    }

    fn journey_complete(&mut self) {
        self.completions += 1;
        info!("delivery celebrated");
    }
}

pub fn simulate(opts: &SimOptions, config: SessionConfig) -> Result<Summary> {
    let surface = Surface::open(&opts.map, opts.layout, config.base_pitch)
        .with_context(|| format!("loading map {}", opts.map.display()))?;
    let mut session = Session::new(config, TracingPresenter::default());
    session.load_surface(surface).context("placing the round")?;
    session.start().context("starting the round")?;

    let outcome = loop {
        if session.phase() == Phase::Complete {
            break Outcome::Complete;
        }
        let Some(deadline) = session.next_deadline() else {
            warn!(phase = session.phase().as_str(), "no timers left");
            break Outcome::Stalled;
        };
        if deadline > opts.max_time {
            session.advance_to(opts.max_time);
            warn!(max_ms = opts.max_time.as_millis() as u64, "time cap reached");
            break Outcome::TimeCap;
        }
        session.advance_to(deadline);
    };

    let snap = session.snapshot();
    let summary = Summary {
        outcome,
        phase: snap.phase,
        status: snap.status,
        ticks: snap.ticks,
        elapsed_ms: snap.now_ms,
        completed: snap.completed_rounds > 0,
        frames: session.presenter().frames,
        pitch: snap.pitch.unwrap_or_default(),
        columns: snap.columns.unwrap_or_default(),
        rows: snap.rows.unwrap_or_default(),
        agent: snap.agent,
        pickup: snap.pickup,
        dropoff: snap.dropoff,
    };
    info!(outcome = ?summary.outcome, ticks = summary.ticks, elapsed_ms = summary.elapsed_ms, "simulation finished");
    Ok(summary)
}

pub fn write_summary(path: &Path, summary: &Summary) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), summary)?;
    Ok(())
}

/// Parses `WIDTHxHEIGHT`, e.g. `1000x700`.
pub fn parse_canvas(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(|c: char| c == 'x' || c == 'X')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let w: u32 = w.trim().parse().map_err(|e| format!("bad width: {e}"))?;
    let h: u32 = h.trim().parse().map_err(|e| format!("bad height: {e}"))?;
    if w == 0 || h == 0 {
        return Err("canvas dimensions must be positive".into());
    }
    Ok((w, h))
}
