pub mod config;
pub mod data_utils;
pub mod error;
pub mod ingestion;
pub mod pipeline;
pub mod session;
pub mod storage;
pub mod transform;

pub use config::{EtlConfig, JoinKey, WeekdayConvention};
pub use error::{EtlError, Result};
pub use pipeline::{DatasetReport, PipelineDriver, PipelineReport};
pub use session::EngineSession;
pub use transform::Dataset;
