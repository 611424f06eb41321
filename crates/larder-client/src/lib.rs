pub mod commands;
pub mod config;
pub mod contracts;
pub mod error;
mod import;
pub mod pipeline;
mod report;

pub use config::{PipelineConfig, load_config};
pub use contracts::envelope::{FailureEnvelope, SuccessEnvelope};
pub use error::{ClientError, ClientResult};

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
