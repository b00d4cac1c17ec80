pub mod discovery;
pub mod error;
pub mod filters;
pub mod loader;
pub mod mapping;
pub mod outputs;
pub mod pipeline;
pub mod regularize;
pub mod state;

pub use error::{PipelineError, Result};
pub use regularize::{regularize_timestamps, RegularizeError, RegularizeResult};
