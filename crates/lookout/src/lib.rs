pub mod cli;
pub mod commands;
pub mod error;
pub mod replay;
pub mod render;

pub use lookout_core::{config, runtime, timeline, utils};
