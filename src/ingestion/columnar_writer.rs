//! Columnar Writer - Encode DataFrames as Parquet

use crate::error::Result;
use polars::prelude::*;

/// Columnar Writer
///
/// Encodes a whole frame into one in-memory Parquet file. Output bytes depend
/// only on the frame contents, so identical frames encode identically.
pub struct ColumnarWriter;

impl ColumnarWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(&self, df: &mut DataFrame) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        ParquetWriter::new(&mut buffer).finish(df)?;
        Ok(buffer)
    }
}

impl Default for ColumnarWriter {
    fn default() -> Self {
        Self::new()
    }
}
