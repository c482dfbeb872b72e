//! Dataset transformers
//!
//! Each dataset turns the raw bytes of one input file into the frame that is
//! written to `{output}/{dataset}/{dataset}.parquet`.

pub mod accident;
pub mod demographics;
pub mod income;
pub mod weather;

pub use accident::AccidentTransform;
pub use demographics::DemographicsTransform;
pub use income::IncomeTransform;
pub use weather::WeatherTransform;

use crate::config::{InputFiles, JoinKey, WeekdayConvention};
use crate::error::Result;
use bytes::Bytes;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    Demographics,
    Accident,
    Weather,
    Income,
}

impl Dataset {
    /// Run order used by the pipeline driver
    pub const ALL: [Dataset; 4] = [
        Dataset::Demographics,
        Dataset::Accident,
        Dataset::Weather,
        Dataset::Income,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Dataset::Demographics => "demographics",
            Dataset::Accident => "accident",
            Dataset::Weather => "weather",
            Dataset::Income => "income",
        }
    }

    pub fn output_file(&self) -> String {
        format!("{}.parquet", self.name())
    }

    /// Accident and weather both read the accidents file
    pub fn input_file<'a>(&self, inputs: &'a InputFiles) -> &'a str {
        match self {
            Dataset::Demographics => &inputs.demographics,
            Dataset::Accident | Dataset::Weather => &inputs.accidents,
            Dataset::Income => &inputs.income,
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Source column -> output column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    pub source: &'static str,
    pub target: &'static str,
}

impl ColumnMapping {
    pub const fn new(source: &'static str, target: &'static str) -> Self {
        Self { source, target }
    }
}

pub fn source_columns(mapping: &[ColumnMapping]) -> Vec<&'static str> {
    mapping.iter().map(|m| m.source).collect()
}

/// Project `df` onto the mapped columns, renamed, in mapping order
pub fn select_renamed(df: DataFrame, mapping: &[ColumnMapping]) -> Result<DataFrame> {
    let exprs = mapping
        .iter()
        .map(|m| col(m.source).alias(m.target))
        .collect::<Vec<_>>();
    Ok(df.lazy().select(exprs).collect()?)
}

/// Knobs that change transform semantics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformOptions {
    pub join_key: JoinKey,
    pub weekday: WeekdayConvention,
}

/// Result of transforming one dataset
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub frame: DataFrame,
    pub rows_read: usize,
    /// City names that were collapsed across states (demographics only)
    pub city_collisions: Vec<String>,
}

impl TransformOutput {
    pub fn new(frame: DataFrame, rows_read: usize) -> Self {
        Self {
            frame,
            rows_read,
            city_collisions: Vec::new(),
        }
    }
}

pub trait DatasetTransform: Send {
    /// Transform the full contents of the dataset's input file
    fn transform(&self, content: Bytes) -> Result<TransformOutput>;

    /// Column lineage, for `plan` output
    fn column_plan(&self) -> Vec<ColumnMapping>;
}

pub fn transformer_for(dataset: Dataset, options: TransformOptions) -> Box<dyn DatasetTransform> {
    match dataset {
        Dataset::Demographics => Box::new(DemographicsTransform::new(options.join_key)),
        Dataset::Accident => Box::new(AccidentTransform::new(options.weekday)),
        Dataset::Weather => Box::new(WeatherTransform),
        Dataset::Income => Box::new(IncomeTransform),
    }
}

/// Column lineage of every dataset, keyed by dataset name
pub fn column_plans(options: TransformOptions) -> BTreeMap<&'static str, Vec<ColumnMapping>> {
    Dataset::ALL
        .iter()
        .map(|dataset| {
            let transform = transformer_for(*dataset, options);
            (dataset.name(), transform.column_plan())
        })
        .collect()
}
