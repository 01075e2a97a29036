//! Configuration system for Orrery bodies.
//!
//! Provides runtime-configurable LOD, sync, and logging settings that persist to
//! disk as RON files. Supports hot-reload detection and forward/backward
//! compatible serialization.

mod config;
mod error;

pub use config::{
    Config, DebugConfig, LodConfig, ResolutionBand, SyncConfig, TextureLodStrategy,
};
pub use error::ConfigError;
