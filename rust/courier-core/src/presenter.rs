use serde::{Deserialize, Serialize};

use crate::models::{Direction, Tile};

/// Everything a renderer needs to draw one frame of the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderFrame {
    pub agent: Tile,
    pub direction: Direction,
    pub carrying: bool,
    pub pickup: Tile,
    pub dropoff: Tile,
    pub pitch: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlState {
    pub start_enabled: bool,
    pub randomize_enabled: bool,
}

/// Outbound sinks of a session: drawing, status text, control affordances and
/// the once-per-round completion signal.
pub trait Presenter {
    fn render(&mut self, frame: &RenderFrame);
    fn status(&mut self, message: &str);
    fn controls(&mut self, controls: ControlState);
    fn journey_complete(&mut self);
}

impl<P: Presenter + ?Sized> Presenter for Box<P> {
    fn render(&mut self, frame: &RenderFrame) { (**self).render(frame) }
    fn status(&mut self, message: &str) { (**self).status(message) }
    fn controls(&mut self, controls: ControlState) { (**self).controls(controls) }
    fn journey_complete(&mut self) { (**self).journey_complete() }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PresenterEvent {
    Render(RenderFrame),
    Status { message: String },
    Controls(ControlState),
    JourneyComplete,
}

/// Records every presenter call in order.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub events: Vec<PresenterEvent>,
}

impl EventLog {
    pub fn new() -> Self { Self::default() }

    pub fn statuses(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|e| match e {
            PresenterEvent::Status { message } => Some(message.as_str()),
            _ => None,
        })
    }

    pub fn frames(&self) -> impl Iterator<Item = &RenderFrame> {
        self.events.iter().filter_map(|e| match e {
            PresenterEvent::Render(f) => Some(f),
            _ => None,
        })
    }

    pub fn last_status(&self) -> Option<&str> { self.statuses().last() }
    pub fn last_frame(&self) -> Option<&RenderFrame> { self.frames().last() }

    pub fn last_controls(&self) -> Option<ControlState> {
        self.events.iter().rev().find_map(|e| match e {
            PresenterEvent::Controls(c) => Some(*c),
            _ => None,
        })
    }

    pub fn completions(&self) -> usize {
        self.events.iter().filter(|e| matches!(e, PresenterEvent::JourneyComplete)).count()
    }

    pub fn clear(&mut self) { self.events.clear(); }
}

impl Presenter for EventLog {
    fn render(&mut self, frame: &RenderFrame) { self.events.push(PresenterEvent::Render(*frame)); }
    fn status(&mut self, message: &str) { self.events.push(PresenterEvent::Status { message: message.to_string() }); }
    fn controls(&mut self, controls: ControlState) { self.events.push(PresenterEvent::Controls(controls)); }
    fn journey_complete(&mut self) { self.events.push(PresenterEvent::JourneyComplete); }
}
