/// Polarity: a tile platformer simulation core with switchable gravity.
///
/// Layers:
///   - `domain`  pure rules and data (grid, bodies, collision, fields, actors)
///   - `sim`     the level orchestrator, loader and per-tick `step`
///   - `ui`      optional terminal overlay (feature `viewer`)

pub mod config;
pub mod domain;
pub mod error;
pub mod sim;
#[cfg(feature = "viewer")]
pub mod ui;

pub use config::GameConfig;
pub use domain::entity::{ActorId, ActorKind, FrameInput};
pub use error::LevelError;
pub use sim::event::GameEvent;
pub use sim::level::{from_json_str, load_level, load_level_number};
pub use sim::step::step;
pub use sim::world::{Level, Tuning};
