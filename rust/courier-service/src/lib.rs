pub mod config;
pub mod driver;
pub mod errors;
pub mod routes;
pub mod state;

pub use driver::{spawn, DriverHandle, MapLayout};
pub use routes::build_router;
pub use state::{AppState, GridView, SessionView};
