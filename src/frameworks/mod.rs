pub mod autoplay;
pub mod config;
pub mod runtime;
