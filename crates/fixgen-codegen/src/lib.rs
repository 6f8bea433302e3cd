//! Turns compiled fixture definitions into bindings a host can install.

mod artifact;
pub mod config;
pub mod error;
mod materializer;
mod render;

pub use config::MaterializeConfig;
pub use error::MaterializeError;
pub use materializer::{MaterializedModule, Materializer};
pub use render::{fingerprint, render_listing};
