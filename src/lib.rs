//! Flight data recorder CSV replay and analysis.
//!
//! `data` turns a recorder CSV into a normalized, smoothed table with derived
//! channels; `replay` steps through it and hands frames to a renderer.

pub mod config;
pub mod data;
pub mod error;
pub mod replay;

pub use config::ViewerConfig;
pub use data::model::FlightLogTable;
pub use data::{prepare_log, PreparedLog};
