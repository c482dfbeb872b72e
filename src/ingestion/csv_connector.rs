//! CSV Connector - Reads delimited text fetched from storage into string columns

use crate::data_utils::non_empty;
use crate::error::{EtlError, Result};
use bytes::Bytes;
use csv::{ByteRecord, ReaderBuilder};
use polars::prelude::{DataFrame, NamedFrom, Series};

/// CSV Connector - Wraps raw CSV bytes and exposes selected columns as text.
///
/// Every value is kept as text; empty fields become null. Rows shorter than
/// the header are padded with nulls.
pub struct CsvConnector {
    source_id: String,
    content: Bytes,
}

impl CsvConnector {
    pub fn new(source_id: impl Into<String>, content: Bytes) -> Self {
        Self {
            source_id: source_id.into(),
            content,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    fn reader(&self) -> csv::Reader<&[u8]> {
        ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(self.content.as_ref())
    }

    /// Header names, trimmed
    pub fn headers(&self) -> Result<Vec<String>> {
        let mut rdr = self.reader();
        let headers = rdr
            .byte_headers()?
            .iter()
            .map(|h| String::from_utf8_lossy(h).trim().to_string())
            .collect();
        Ok(headers)
    }

    /// Position of each requested column in the header
    fn column_indices(&self, columns: &[&str]) -> Result<Vec<usize>> {
        let headers = self.headers()?;
        columns
            .iter()
            .map(|wanted| {
                headers
                    .iter()
                    .position(|h| h == wanted)
                    .ok_or_else(|| EtlError::MissingColumn {
                        dataset: self.source_id.clone(),
                        column: wanted.to_string(),
                    })
            })
            .collect()
    }

    /// Visit every data row as raw fields
    pub fn for_each_record<F>(&self, mut visit: F) -> Result<usize>
    where
        F: FnMut(&ByteRecord) -> Result<()>,
    {
        let mut rdr = self.reader();
        let mut record = ByteRecord::new();
        let mut rows = 0;
        while rdr.read_byte_record(&mut record)? {
            visit(&record)?;
            rows += 1;
        }
        Ok(rows)
    }

    /// Read the named columns into a DataFrame of nullable strings, keeping
    /// the source column names.
    pub fn read_columns(&self, columns: &[&str]) -> Result<DataFrame> {
        let indices = self.column_indices(columns)?;
        let mut values: Vec<Vec<Option<String>>> = vec![Vec::new(); columns.len()];

        self.for_each_record(|record| {
            for (slot, idx) in indices.iter().enumerate() {
                let cell = record
                    .get(*idx)
                    .map(|raw| String::from_utf8_lossy(raw))
                    .and_then(|text| non_empty(&text));
                values[slot].push(cell);
            }
            Ok(())
        })?;

        let series = columns
            .iter()
            .zip(values)
            .map(|(name, column)| Series::new(*name, column))
            .collect::<Vec<_>>();

        Ok(DataFrame::new(series)?)
    }
}
