// Domain layer: core game types and rules.

pub mod coords;
pub mod errors;
pub mod floors;
pub mod location;
pub mod ports;
pub mod round;
pub mod scoring;

pub use coords::{ActualCoordinate, GeoPoint, GuessCoordinate};
pub use errors::{DataLoadError, FloorError, RoundError, SelectionError};
pub use floors::FloorTable;
pub use location::{ALL_PACK_NAME, Location, LocationId, MapPack, PackId, PackSelector};
pub use round::{RoundPhase, RoundState};
pub use scoring::ScoringEngine;
