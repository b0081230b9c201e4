// Use cases layer: application workflows for the round engine.

pub mod game;
pub mod locations;
pub mod round;
pub mod scheduler;
pub mod session;
pub mod types;

pub use game::Pacing;
pub use locations::LocationStore;
pub use round::{RoundController, RoundResult, RoundSettings};
pub use session::{SessionError, SessionHandle, SessionSettings, spawn_session};
pub use types::{EngineEvent, MapCommand, MapCommandSink, RoundEvent};
