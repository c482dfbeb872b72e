//! Engine session: the one handle every dataset step runs against.

use crate::config::{AwsCredentials, EtlConfig};
use crate::error::Result;
use crate::storage::StorageLocation;
use tracing::info;

#[derive(Debug, Clone)]
pub struct EngineSession {
    input: StorageLocation,
    output: StorageLocation,
}

impl EngineSession {
    /// Build a session from configuration. Credentials are passed to the
    /// storage backends directly.
    pub fn connect(config: &EtlConfig) -> Result<Self> {
        let credentials = config.credentials();
        Self::open(config.base_path()?, config.output_path()?, credentials.as_ref())
    }

    pub fn open(
        input_location: &str,
        output_location: &str,
        credentials: Option<&AwsCredentials>,
    ) -> Result<Self> {
        let input = StorageLocation::open(input_location, credentials)?;
        let output = if output_location == input_location {
            input.clone()
        } else {
            StorageLocation::open(output_location, credentials)?
        };

        info!("engine session ready: input={} output={}", input.url(), output.url());
        Ok(Self { input, output })
    }

    pub fn input(&self) -> &StorageLocation {
        &self.input
    }

    pub fn output(&self) -> &StorageLocation {
        &self.output
    }
}
