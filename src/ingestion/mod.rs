//! Ingestion Module
//!
//! Turns raw bytes fetched from storage into DataFrames and back:
//! - CSV decoding into nullable text columns
//! - Legacy packed-column demographics adapter
//! - Parquet encoding

pub mod columnar_writer;
pub mod csv_connector;
pub mod legacy_demographics;

pub use columnar_writer::ColumnarWriter;
pub use csv_connector::CsvConnector;
pub use legacy_demographics::{DemographicRecord, LegacyDemographicsAdapter};
