//! Legacy wide-format ingestion for the city demographics file.
//!
//! The source file carries every field packed into one semicolon-joined
//! column. This adapter unpacks it into the twelve-field
//! [`DemographicRecord`] and is the only place that knows about the packing.

use crate::data_utils::{lenient_int, non_empty};
use crate::error::{EtlError, Result};
use crate::ingestion::csv_connector::CsvConnector;
use polars::prelude::*;

/// Header of the packed column
pub const PACKED_HEADER: &str = "City;State;Median Age;Male Population;Female Population;\
Total Population;Number of Veterans;Foreign-born;Average Household Size;State Code;Race;Count";

pub const PACKED_SEPARATOR: char = ';';

/// Output names of the unpacked fields, in packing order
pub const FIELD_NAMES: [&str; 12] = [
    "city",
    "state",
    "median_age",
    "male_population",
    "female_population",
    "total_population",
    "number_of_veterans",
    "foreign_born",
    "average_household_size",
    "state_code",
    "race",
    "count",
];

/// One unpacked city x race row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemographicRecord {
    pub city: Option<String>,
    pub state: Option<String>,
    pub median_age: Option<i32>,
    pub male_population: Option<i32>,
    pub female_population: Option<i32>,
    pub total_population: Option<i32>,
    pub number_of_veterans: Option<i32>,
    pub foreign_born: Option<i32>,
    pub average_household_size: Option<i32>,
    pub state_code: Option<String>,
    pub race: Option<String>,
    pub count: Option<i32>,
}

impl DemographicRecord {
    /// Split one packed value. Missing trailing fields are null; numeric
    /// fields that do not parse are null.
    pub fn from_packed(packed: &str) -> Self {
        let mut parts = packed.split(PACKED_SEPARATOR);
        let mut text = || parts.next().and_then(non_empty);

        let city = text();
        let state = text();
        let median_age = text();
        let male_population = text();
        let female_population = text();
        let total_population = text();
        let number_of_veterans = text();
        let foreign_born = text();
        let average_household_size = text();
        let state_code = text();
        let race = text();
        let count = text();

        let int = |value: Option<String>| value.as_deref().and_then(lenient_int);

        Self {
            city,
            state,
            median_age: int(median_age),
            male_population: int(male_population),
            female_population: int(female_population),
            total_population: int(total_population),
            number_of_veterans: int(number_of_veterans),
            foreign_born: int(foreign_born),
            average_household_size: int(average_household_size),
            state_code,
            race,
            count: int(count),
        }
    }
}

pub struct LegacyDemographicsAdapter {
    connector: CsvConnector,
}

impl LegacyDemographicsAdapter {
    pub fn new(connector: CsvConnector) -> Self {
        Self { connector }
    }

    fn packed_column_index(&self) -> Result<usize> {
        self.connector
            .headers()?
            .iter()
            .position(|h| h == PACKED_HEADER)
            .ok_or_else(|| EtlError::MissingColumn {
                dataset: self.connector.source_id().to_string(),
                column: PACKED_HEADER.to_string(),
            })
    }

    /// Unpack every row of the source file
    pub fn records(&self) -> Result<Vec<DemographicRecord>> {
        let idx = self.packed_column_index()?;
        let mut records = Vec::new();

        self.connector.for_each_record(|record| {
            // Unquoted commas inside the packed text split the CSV row; rejoin them.
            let packed = record
                .iter()
                .skip(idx)
                .map(|field| String::from_utf8_lossy(field))
                .collect::<Vec<_>>()
                .join(",");
            records.push(DemographicRecord::from_packed(&packed));
            Ok(())
        })?;

        Ok(records)
    }

    /// Build the twelve-column frame from unpacked records
    pub fn to_frame(records: &[DemographicRecord]) -> Result<DataFrame> {
        let text = |f: fn(&DemographicRecord) -> &Option<String>| {
            records.iter().map(|r| f(r).clone()).collect::<Vec<_>>()
        };
        let int = |f: fn(&DemographicRecord) -> Option<i32>| {
            records.iter().map(f).collect::<Vec<_>>()
        };

        let df = DataFrame::new(vec![
            Series::new("city", text(|r| &r.city)),
            Series::new("state", text(|r| &r.state)),
            Series::new("median_age", int(|r| r.median_age)),
            Series::new("male_population", int(|r| r.male_population)),
            Series::new("female_population", int(|r| r.female_population)),
            Series::new("total_population", int(|r| r.total_population)),
            Series::new("number_of_veterans", int(|r| r.number_of_veterans)),
            Series::new("foreign_born", int(|r| r.foreign_born)),
            Series::new("average_household_size", int(|r| r.average_household_size)),
            Series::new("state_code", text(|r| &r.state_code)),
            Series::new("race", text(|r| &r.race)),
            Series::new("count", int(|r| r.count)),
        ])?;

        Ok(df)
    }
}
