//! The journey controller.
//!
//! A [`Session`] owns the classified map, the current round (agent, pickup,
//! drop-off), the phase and a [`Scheduler`] holding the movement tick and the
//! two arrival timers. Time only moves through [`Session::advance_to`]; every
//! state change is pushed to the [`Presenter`] before the next timer fires.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::astar::{find_path, PathResult};
use crate::error::{CoreError, Result};
use crate::grid::{classify, LiveSampler, TileGrid};
use crate::models::{Agent, Direction, Placement, Tile};
use crate::options::{SearchMode, SessionConfig};
use crate::placement::place_entities;
use crate::presenter::{ControlState, Presenter, RenderFrame};
use crate::scheduler::{Scheduler, TaskHandle};
use crate::surface::{Layout, Surface};

pub const STATUS_WAITING: &str = "Waiting for the courier to start...";
pub const STATUS_TO_PICKUP: &str = "Courier is heading to the pickup point...";
pub const STATUS_TO_DROPOFF: &str = "Courier is heading to the drop-off point...";
pub const STATUS_AT_PICKUP: &str = "Courier reached the pickup point, collecting the package...";
pub const STATUS_AT_DROPOFF: &str = "Courier reached the drop-off point, handing over the package...";
pub const STATUS_DELIVERED: &str = "Package delivered!";
pub const STATUS_NO_ROUTE: &str = "No route available!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Placed but not started; the next leg goes to the pickup.
    #[default]
    Idle,
    MovingToPickup,
    ArrivedPickup,
    MovingToDropoff,
    ArrivedDropoff,
    Complete,
}

impl Phase {
    pub fn is_moving(self) -> bool {
        matches!(self, Phase::MovingToPickup | Phase::MovingToDropoff)
    }

    pub fn is_paused(self) -> bool {
        matches!(self, Phase::ArrivedPickup | Phase::ArrivedDropoff)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::MovingToPickup => "moving_to_pickup",
            Phase::ArrivedPickup => "arrived_pickup",
            Phase::MovingToDropoff => "moving_to_dropoff",
            Phase::ArrivedDropoff => "arrived_dropoff",
            Phase::Complete => "complete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    Tick,
    FaceTarget,
    FinishArrival,
}

#[derive(Debug)]
struct World {
    surface: Surface,
    grid: TileGrid,
}

#[derive(Debug, Clone, Copy)]
struct Round {
    agent: Agent,
    pickup: Tile,
    dropoff: Tile,
}

/// Serializable picture of a session at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub status: String,
    pub agent: Option<Agent>,
    pub pickup: Option<Tile>,
    pub dropoff: Option<Tile>,
    pub controls: ControlState,
    pub pitch: Option<u32>,
    pub columns: Option<u32>,
    pub rows: Option<u32>,
    pub ticks: u64,
    pub completed_rounds: u64,
    pub now_ms: u64,
}

pub struct Session<P: Presenter> {
    config: SessionConfig,
    world: Option<World>,
    round: Option<Round>,
    phase: Phase,
    status: String,
    controls: ControlState,
    scheduler: Scheduler<Timer>,
    movement: Option<TaskHandle>,
    face: Option<TaskHandle>,
    finish: Option<TaskHandle>,
    rng: StdRng,
    presenter: P,
    ticks: u64,
    completed_rounds: u64,
}

impl<P: Presenter> Session<P> {
    pub fn new(config: SessionConfig, presenter: P) -> Self {
        let rng = config.seed.map(StdRng::seed_from_u64).unwrap_or_else(StdRng::from_entropy);
        Self {
            config,
            world: None,
            round: None,
            phase: Phase::Idle,
            status: String::new(),
            controls: ControlState::default(),
            scheduler: Scheduler::new(),
            movement: None,
            face: None,
            finish: None,
            rng,
            presenter,
            ticks: 0,
            completed_rounds: 0,
        }
    }

    pub fn config(&self) -> &SessionConfig { &self.config }
    pub fn phase(&self) -> Phase { self.phase }
    pub fn status(&self) -> &str { &self.status }
    pub fn controls(&self) -> ControlState { self.controls }
    pub fn agent(&self) -> Option<Agent> { self.round.map(|r| r.agent) }
    pub fn grid(&self) -> Option<&TileGrid> { self.world.as_ref().map(|w| &w.grid) }
    pub fn surface(&self) -> Option<&Surface> { self.world.as_ref().map(|w| &w.surface) }
    pub fn ticks(&self) -> u64 { self.ticks }
    pub fn completed_rounds(&self) -> u64 { self.completed_rounds }
    pub fn presenter(&self) -> &P { &self.presenter }
    pub fn presenter_mut(&mut self) -> &mut P { &mut self.presenter }
    pub fn into_presenter(self) -> P { self.presenter }

    pub fn placement(&self) -> Option<Placement> {
        self.round.map(|r| Placement { agent: r.agent.tile, pickup: r.pickup, dropoff: r.dropoff })
    }

    pub fn now(&self) -> Duration { self.scheduler.now() }
    pub fn next_deadline(&self) -> Option<Duration> { self.scheduler.next_deadline() }
    pub fn active_timers(&self) -> usize { self.scheduler.active() }

    pub fn movement_active(&self) -> bool {
        self.movement.map(|h| self.scheduler.is_active(h)).unwrap_or(false)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let grid = self.grid();
        SessionSnapshot {
            phase: self.phase,
            status: self.status.clone(),
            agent: self.agent(),
            pickup: self.round.map(|r| r.pickup),
            dropoff: self.round.map(|r| r.dropoff),
            controls: self.controls,
            pitch: grid.map(|g| g.pitch()),
            columns: grid.map(|g| g.columns()),
            rows: grid.map(|g| g.rows()),
            ticks: self.ticks,
            completed_rounds: self.completed_rounds,
            now_ms: self.now().as_millis() as u64,
        }
    }

    /// Decodes an image, lays it out and loads it as the new map.
    pub fn load_image(&mut self, bytes: &[u8], layout: Layout) -> Result<Placement> {
        let surface = Surface::decode(bytes, layout, self.config.base_pitch)?;
        self.load_surface(surface)
    }

    /// Replaces the map and places a fresh round on it.
    ///
    /// Outstanding timers are always cancelled. If the new grid cannot host a
    /// round the previous agent and targets are kept.
    pub fn load_surface(&mut self, surface: Surface) -> Result<Placement> {
        let grid = classify(&surface, self.config.road_color);
        self.cancel_all();
        info!(
            width = surface.image().width(),
            height = surface.image().height(),
            pitch = grid.pitch(),
            roads = grid.roads().len(),
            non_roads = grid.non_roads().len(),
            "map loaded"
        );
        self.world = Some(World { surface, grid });
        let placed = self.randomize();
        if placed.is_err() && self.phase.is_paused() {
            self.resume_interrupted_pause();
        }
        placed
    }

    /// Places agent, pickup and drop-off again on the current map.
    pub fn randomize(&mut self) -> Result<Placement> {
        let world = self.world.as_ref().ok_or(CoreError::NotReady)?;
        let placement = match place_entities(&world.grid, &mut self.rng) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "placement skipped");
                return Err(e);
            }
        };
        self.apply_placement(placement)?;
        Ok(placement)
    }

    /// Starts a round from an explicit placement, abandoning whatever was in flight.
    ///
    /// The agent must stand on a road tile and both targets on non-road tiles
    /// of the current grid.
    pub fn apply_placement(&mut self, placement: Placement) -> Result<()> {
        let grid = self.grid().ok_or(CoreError::NotReady)?;
        let fits = grid.roads().contains(&placement.agent)
            && grid.non_roads().contains(&placement.pickup)
            && grid.non_roads().contains(&placement.dropoff);
        if !fits {
            return Err(CoreError::InvalidPlacement(placement));
        }
        self.cancel_all();
        self.round = Some(Round { agent: Agent::at(placement.agent), pickup: placement.pickup, dropoff: placement.dropoff });
        self.phase = Phase::Idle;
        info!(agent = ?placement.agent, pickup = ?placement.pickup, dropoff = ?placement.dropoff, "round placed");
        self.render();
        self.set_status(STATUS_WAITING);
        self.set_controls(ControlState { start_enabled: true, randomize_enabled: true });
        Ok(())
    }

    /// Begins the round, or restarts the movement timer of a round already under way.
    pub fn start(&mut self) -> Result<()> {
        if self.round.is_none() {
            return Err(CoreError::NotReady);
        }
        match self.phase {
            Phase::Complete => return Err(CoreError::StartDisabled),
            Phase::ArrivedPickup | Phase::ArrivedDropoff => {
                debug!(phase = self.phase.as_str(), "start ignored during arrival pause");
                return Ok(());
            }
            Phase::Idle => {
                self.phase = Phase::MovingToPickup;
                info!("journey started");
            }
            Phase::MovingToPickup | Phase::MovingToDropoff => {
                debug!(phase = self.phase.as_str(), "restarting movement");
            }
        }
        self.set_status(self.heading_status());
        self.arm_movement();
        Ok(())
    }

    pub fn advance(&mut self, by: Duration) {
        let until = self.now() + by;
        self.advance_to(until);
    }

    /// Fires every timer due up to `until`, in deadline order, then parks the clock there.
    pub fn advance_to(&mut self, until: Duration) {
        while let Some((handle, timer)) = self.scheduler.pop_due(until) {
            self.fire(handle, timer);
        }
        self.scheduler.set_now(until);
    }

    fn fire(&mut self, handle: TaskHandle, timer: Timer) {
        match timer {
            Timer::Tick => {
                if self.movement != Some(handle) {
                    debug!("stale tick dropped");
                    return;
                }
                self.tick();
            }
            Timer::FaceTarget => {
                if self.face == Some(handle) {
                    self.face = None;
                    self.face_target();
                }
            }
            Timer::FinishArrival => {
                if self.finish == Some(handle) {
                    self.finish = None;
                    self.finish_arrival();
                }
            }
        }
    }

    fn target(&self) -> Option<Tile> {
        let round = self.round.as_ref()?;
        match self.phase {
            Phase::Idle | Phase::MovingToPickup | Phase::ArrivedPickup => Some(round.pickup),
            Phase::MovingToDropoff | Phase::ArrivedDropoff => Some(round.dropoff),
            Phase::Complete => None,
        }
    }

    fn plan(&self, from: Tile, to: Tile) -> Option<PathResult> {
        let world = self.world.as_ref()?;
        let opts = &self.config.search;
        let result = match opts.mode {
            SearchMode::Live => {
                let live = LiveSampler::new(&world.surface, world.surface.pitch(), self.config.road_color);
                find_path(from, to, &live, opts)
            }
            SearchMode::Cached => find_path(from, to, &world.grid, opts),
        };
        Some(result)
    }

    fn tick(&mut self) {
        if !self.phase.is_moving() {
            return;
        }
        let (Some(round), Some(target)) = (self.round, self.target()) else { return };
        let from = round.agent.tile;
        self.ticks += 1;

        let path = self.plan(from, target).and_then(|r| {
            debug!(expanded = r.expanded, reason = ?r.reason, "path planned");
            r.path
        });
        let Some(path) = path else {
            let err = CoreError::NoPathFound { from, to: target };
            warn!(error = %err, phase = self.phase.as_str(), "courier stalled");
            disarm(&mut self.scheduler, &mut self.movement);
            self.set_status(STATUS_NO_ROUTE);
            return;
        };

        if let Some(&next) = path.first() {
            if let Some(round) = self.round.as_mut() {
                round.agent.direction = Direction::between(from, next);
                round.agent.tile = next;
            }
            debug!(x = next.x, y = next.y, remaining = path.len() - 1, "courier moved");
            self.render();
        }

        let at = self.round.map(|r| r.agent.tile).unwrap_or(from);
        if at.is_orthogonally_adjacent(target) {
            self.arrive();
        } else {
            self.set_status(self.heading_status());
        }
    }

    fn arrive(&mut self) {
        disarm(&mut self.scheduler, &mut self.movement);
        let status = match self.phase {
            Phase::MovingToPickup => {
                self.phase = Phase::ArrivedPickup;
                STATUS_AT_PICKUP
            }
            Phase::MovingToDropoff => {
                self.phase = Phase::ArrivedDropoff;
                STATUS_AT_DROPOFF
            }
            _ => return,
        };
        info!(phase = self.phase.as_str(), ticks = self.ticks, "courier arrived");
        self.set_status(status);

        let face_delay = Duration::from_millis(self.config.face_delay_ms);
        let pause = Duration::from_millis(self.config.arrival_pause_ms);
        let face = self.scheduler.schedule_once(face_delay, Timer::FaceTarget);
        rearm(&mut self.scheduler, &mut self.face, face);
        let finish = self.scheduler.schedule_once(pause, Timer::FinishArrival);
        rearm(&mut self.scheduler, &mut self.finish, finish);
    }

    fn face_target(&mut self) {
        if !self.phase.is_paused() {
            return;
        }
        let Some(target) = self.target() else { return };
        if let Some(round) = self.round.as_mut() {
            round.agent.direction = Direction::between(round.agent.tile, target);
        }
        self.render();
    }

    fn finish_arrival(&mut self) {
        match self.phase {
            Phase::ArrivedPickup => {
                self.phase = Phase::MovingToDropoff;
                if let Some(round) = self.round.as_mut() {
                    round.agent.carrying = true;
                }
                self.render();
                self.set_status(STATUS_TO_DROPOFF);
                self.arm_movement();
            }
            Phase::ArrivedDropoff => {
                self.phase = Phase::Complete;
                if let Some(round) = self.round.as_mut() {
                    round.agent.carrying = false;
                }
                self.completed_rounds += 1;
                info!(ticks = self.ticks, completed_rounds = self.completed_rounds, "journey complete");
                self.render();
                self.set_status(STATUS_DELIVERED);
                self.set_controls(ControlState { start_enabled: false, randomize_enabled: true });
                self.presenter.journey_complete();
            }
            _ => {}
        }
    }

    /// A reload dropped the arrival timers, so the pause can never end. Fall back
    /// to the leg it interrupted; the next start arrives again and re-arms them.
    fn resume_interrupted_pause(&mut self) {
        self.phase = match self.phase {
            Phase::ArrivedPickup => Phase::MovingToPickup,
            Phase::ArrivedDropoff => Phase::MovingToDropoff,
            other => other,
        };
        info!(phase = self.phase.as_str(), "arrival pause interrupted by reload");
        self.set_status(self.heading_status());
    }

    fn arm_movement(&mut self) {
        let period = Duration::from_millis(self.config.tick_ms);
        let handle = self.scheduler.schedule_every(period, Timer::Tick);
        rearm(&mut self.scheduler, &mut self.movement, handle);
    }

    fn cancel_all(&mut self) {
        disarm(&mut self.scheduler, &mut self.movement);
        disarm(&mut self.scheduler, &mut self.face);
        disarm(&mut self.scheduler, &mut self.finish);
    }

    fn heading_status(&self) -> &'static str {
        match self.phase {
            Phase::MovingToDropoff | Phase::ArrivedDropoff => STATUS_TO_DROPOFF,
            _ => STATUS_TO_PICKUP,
        }
    }

    fn render(&mut self) {
        let Some(round) = self.round else { return };
        let pitch = self.world.as_ref().map(|w| w.grid.pitch()).unwrap_or(1);
        let frame = RenderFrame {
            agent: round.agent.tile,
            direction: round.agent.direction,
            carrying: round.agent.carrying,
            pickup: round.pickup,
            dropoff: round.dropoff,
            pitch,
        };
        self.presenter.render(&frame);
    }

    fn set_status(&mut self, message: &str) {
        self.status.clear();
        self.status.push_str(message);
        self.presenter.status(message);
    }

    fn set_controls(&mut self, controls: ControlState) {
        self.controls = controls;
        self.presenter.controls(controls);
    }
}

/// Cancel-and-replace: the previous task in `slot`, if any, never fires after this.
fn rearm(scheduler: &mut Scheduler<Timer>, slot: &mut Option<TaskHandle>, handle: TaskHandle) {
    if let Some(old) = slot.replace(handle) {
        scheduler.cancel(old);
    }
}

fn disarm(scheduler: &mut Scheduler<Timer>, slot: &mut Option<TaskHandle>) {
    if let Some(old) = slot.take() {
        scheduler.cancel(old);
    }
}
