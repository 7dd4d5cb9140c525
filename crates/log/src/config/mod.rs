//! Configuration types and presets
//!
//! - `base`: core configuration structs (`Config`, `Format`, `Level`, `Writer`)
//! - `presets`: pre-configured setups (development, production, test, env)

mod base;
mod presets;

pub use base::{Config, Format, Level, Writer};
