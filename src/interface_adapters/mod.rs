// Interface adapters layer: wire protocol, dataset parsing and the map client.

pub mod bridge;
pub mod dataset;
pub mod map_client;
pub mod protocol;
pub mod utils;
