pub mod astar;
pub mod error;
pub mod grid;
pub mod models;
pub mod options;
pub mod placement;
pub mod presenter;
pub mod scheduler;
pub mod session;
pub mod surface;

pub use astar::{find_path, PathResult};
pub use error::{CoreError, Result};
pub use grid::{classify, LiveSampler, RoadColorRange, TileGrid, Traversability};
pub use models::{Agent, Direction, Placement, Tile};
pub use options::{SearchMode, SearchOptions, SessionConfig};
pub use placement::{find_nearest_non_road, place_entities};
pub use presenter::{ControlState, EventLog, Presenter, PresenterEvent, RenderFrame};
pub use scheduler::{Scheduler, TaskHandle};
pub use session::{Phase, Session, SessionSnapshot, Timer};
pub use surface::{Layout, Raster, Surface};

pub fn version() -> &'static str { env!("CARGO_PKG_VERSION") }
