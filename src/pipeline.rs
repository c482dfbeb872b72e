//! Pipeline driver
//!
//! Runs dataset transforms against an [`EngineSession`]: read the input file,
//! transform it on a blocking worker, encode Parquet, and overwrite
//! `{output}/{dataset}/`.

use crate::config::{EtlConfig, InputFiles};
use crate::error::Result;
use crate::ingestion::ColumnarWriter;
use crate::session::EngineSession;
use crate::transform::{transformer_for, Dataset, TransformOptions, TransformOutput};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Instant;
use tracing::{info, instrument};
use uuid::Uuid;

/// Outcome of one dataset step
#[derive(Debug, Clone, Serialize)]
pub struct DatasetReport {
    pub dataset: Dataset,
    pub input: String,
    pub output: String,
    pub rows_read: usize,
    pub rows_written: usize,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub city_collisions: Vec<String>,
}

/// Outcome of a pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub input: String,
    pub output: String,
    pub parallel: bool,
    pub datasets: Vec<DatasetReport>,
}

impl PipelineReport {
    pub fn dataset(&self, dataset: Dataset) -> Option<&DatasetReport> {
        self.datasets.iter().find(|r| r.dataset == dataset)
    }

    pub fn rows_written(&self) -> usize {
        self.datasets.iter().map(|r| r.rows_written).sum()
    }
}

pub struct PipelineDriver {
    session: EngineSession,
    inputs: InputFiles,
    options: TransformOptions,
    parallel: bool,
}

impl PipelineDriver {
    pub fn new(session: EngineSession, inputs: InputFiles, options: TransformOptions) -> Self {
        Self {
            session,
            inputs,
            options,
            parallel: false,
        }
    }

    pub fn from_config(session: EngineSession, config: &EtlConfig) -> Self {
        let options = TransformOptions {
            join_key: config.pipeline.demographics_join_key,
            weekday: config.pipeline.weekday,
        };
        Self::new(session, config.inputs.clone(), options).with_parallel(config.pipeline.parallel)
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run every dataset in the default order
    pub async fn run_all(&self) -> Result<PipelineReport> {
        self.run(&Dataset::ALL).await
    }

    /// Run the given datasets. Duplicates are run once. Any failure aborts
    /// the run; outputs already written by earlier steps are left in place.
    pub async fn run(&self, datasets: &[Dataset]) -> Result<PipelineReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        let mut selected: Vec<Dataset> = Vec::new();
        for dataset in datasets {
            if !selected.contains(dataset) {
                selected.push(*dataset);
            }
        }

        info!(
            "pipeline run {} starting: {} dataset(s), parallel={}",
            run_id,
            selected.len(),
            self.parallel
        );

        let reports = if self.parallel {
            futures::future::try_join_all(selected.iter().map(|d| self.run_dataset(*d))).await?
        } else {
            let mut reports = Vec::with_capacity(selected.len());
            for dataset in &selected {
                reports.push(self.run_dataset(*dataset).await?);
            }
            reports
        };

        let report = PipelineReport {
            run_id,
            started_at,
            input: self.session.input().display(&[]),
            output: self.session.output().display(&[]),
            parallel: self.parallel,
            datasets: reports,
        };
        info!(
            "pipeline run {} finished: {} rows written",
            run_id,
            report.rows_written()
        );
        Ok(report)
    }

    #[instrument(skip_all, fields(dataset = %dataset))]
    pub async fn run_dataset(&self, dataset: Dataset) -> Result<DatasetReport> {
        let started = Instant::now();
        let input_file = dataset.input_file(&self.inputs).to_string();
        let input = self.session.input().display(&[input_file.as_str()]);
        info!("reading {}", input);

        let content = self.session.input().read(&input_file).await?;

        let transform = transformer_for(dataset, self.options);
        let (output, payload) =
            tokio::task::spawn_blocking(move || -> Result<(TransformOutput, Vec<u8>)> {
                let mut output = transform.transform(content)?;
                let payload = ColumnarWriter::new().encode(&mut output.frame)?;
                Ok((output, payload))
            })
            .await??;

        let output_file = dataset.output_file();
        let bytes_written = payload.len();
        self.session
            .output()
            .overwrite(dataset.name(), &output_file, payload)
            .await?;
        let output_location = self.session.output().display(&[dataset.name(), output_file.as_str()]);

        let report = DatasetReport {
            dataset,
            input,
            output: output_location,
            rows_read: output.rows_read,
            rows_written: output.frame.height(),
            elapsed_ms: started.elapsed().as_millis() as u64,
            city_collisions: output.city_collisions,
        };
        info!(
            "wrote {} rows ({} bytes) to {} in {} ms",
            report.rows_written, bytes_written, report.output, report.elapsed_ms
        );
        Ok(report)
    }
}
