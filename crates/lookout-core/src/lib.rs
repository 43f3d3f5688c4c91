pub mod config;
pub mod error;
pub mod runtime;
pub mod timeline;
pub mod utils;

pub use config::{LookoutConfig, OutputFormat};
pub use error::{Error, Result};
pub use runtime::{TimelineHandle, TimelineUpdate};
pub use timeline::{Outcome, Rejection, TimelineReducer, TimelineSnapshot};
