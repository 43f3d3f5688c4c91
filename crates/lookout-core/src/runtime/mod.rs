//! Single-consumer runtime around the timeline reducer.
//!
//! Any number of [`TimelineHandle`]s may submit frames; one [`TimelineActor`]
//! task applies them in arrival order and publishes [`TimelineUpdate`]s.

pub mod actor;

pub use actor::{TimelineActor, TimelineHandle, TimelineUpdate, spawn};
