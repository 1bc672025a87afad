//! Core data models: players, battles and their keys.

mod battle;
mod battle_time;
mod ids;
mod player;
mod tag;

pub use battle::*;
pub use battle_time::*;
pub use ids::*;
pub use player::*;
pub use tag::*;
