//! Load and validate the solship step configuration.

pub mod step;

pub use step::{ConfigError, StepConfig};
