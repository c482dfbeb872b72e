//! City demographics: unpack, pivot race counts wide, and join them back onto
//! the per-city attributes.

use super::{ColumnMapping, Dataset, DatasetTransform, TransformOutput};
use crate::config::JoinKey;
use crate::error::Result;
use crate::ingestion::legacy_demographics::{
    DemographicRecord, FIELD_NAMES, PACKED_HEADER, PACKED_SEPARATOR,
};
use crate::ingestion::{CsvConnector, LegacyDemographicsAdapter};
use bytes::Bytes;
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Race category -> pivot column
pub const RACE_COLUMNS: [ColumnMapping; 5] = [
    ColumnMapping::new("Hispanic or Latino", "Hispanic_or_Latino"),
    ColumnMapping::new("White", "White"),
    ColumnMapping::new("Black or African-American", "Black_or_African_American"),
    ColumnMapping::new("American Indian and Alaska Native", "American_Indian_and_Alaska_Native"),
    ColumnMapping::new("Asian", "Asian"),
];

/// Per-city attributes that are deduplicated before the join
pub const ATTRIBUTE_COLUMNS: [&str; 10] = [
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
];

/// Output attribute order; race columns follow
pub const OUTPUT_ATTRIBUTES: [&str; 10] = [
    "city",
    "state",
    "state_code",
    "median_age",
    "male_population",
    "female_population",
    "total_population",
    "number_of_veterans",
    "foreign_born",
    "average_household_size",
];

pub struct DemographicsTransform {
    join_key: JoinKey,
}

impl DemographicsTransform {
    pub fn new(join_key: JoinKey) -> Self {
        Self { join_key }
    }
}

/// City names that appear with more than one state, sorted
pub fn cross_state_cities(records: &[DemographicRecord]) -> Vec<String> {
    let mut states: BTreeMap<&str, BTreeSet<Option<&str>>> = BTreeMap::new();
    for record in records {
        if let Some(city) = record.city.as_deref() {
            states
                .entry(city)
                .or_default()
                .insert(record.state.as_deref());
        }
    }

    states
        .into_iter()
        .filter(|(_, seen)| seen.len() > 1)
        .map(|(city, _)| city.to_string())
        .collect()
}

/// One aggregation per race: sum of `count` over that race's rows, null when
/// the group has no non-null count for it. Counts are widened to Int64 before
/// summing.
fn race_aggregations() -> Vec<Expr> {
    RACE_COLUMNS
        .iter()
        .map(|race| {
            let counts = col("count")
                .cast(DataType::Int64)
                .filter(col("race").eq(lit(race.source)));
            when(counts.clone().count().gt(lit(0)))
                .then(counts.sum())
                .otherwise(lit(NULL).cast(DataType::Int64))
                .alias(race.target)
        })
        .collect()
}

/// Pivot races wide by `join_key`, deduplicate attributes by the same key
/// (first occurrence wins), and left-join the pivot onto them.
pub fn pivot_and_join(df: DataFrame, join_key: JoinKey) -> Result<DataFrame> {
    let keys = join_key.columns().iter().map(|c| col(c)).collect::<Vec<_>>();
    let subset = join_key
        .columns()
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>();

    let pivot = df
        .clone()
        .lazy()
        .group_by_stable(keys.clone())
        .agg(race_aggregations());

    let attributes = df
        .lazy()
        .select(ATTRIBUTE_COLUMNS.iter().map(|c| col(c)).collect::<Vec<_>>())
        .unique_stable(Some(subset), UniqueKeepStrategy::First);

    let output = OUTPUT_ATTRIBUTES
        .iter()
        .map(|c| col(c))
        .chain(RACE_COLUMNS.iter().map(|race| col(race.target)))
        .collect::<Vec<_>>();

    let joined = pivot
        .join(attributes, keys.clone(), keys, JoinArgs::new(JoinType::Left))
        .select(output)
        .collect()?;

    Ok(joined)
}

impl DatasetTransform for DemographicsTransform {
    fn transform(&self, content: Bytes) -> Result<TransformOutput> {
        let connector = CsvConnector::new(Dataset::Demographics.name(), content);
        let records = LegacyDemographicsAdapter::new(connector).records()?;
        let rows_read = records.len();

        let city_collisions = match self.join_key {
            JoinKey::City => cross_state_cities(&records),
            JoinKey::CityState => Vec::new(),
        };
        if !city_collisions.is_empty() {
            warn!(
                "{} city names occur in more than one state and are merged into one row each \
                 (join key 'city'): {}",
                city_collisions.len(),
                city_collisions.join(", ")
            );
        }

        let unpacked = LegacyDemographicsAdapter::to_frame(&records)?;
        let frame = pivot_and_join(unpacked, self.join_key)?;
        info!(
            "demographics: {} city x race rows pivoted into {} rows",
            rows_read,
            frame.height()
        );

        Ok(TransformOutput {
            frame,
            rows_read,
            city_collisions,
        })
    }

    fn column_plan(&self) -> Vec<ColumnMapping> {
        let packed = PACKED_HEADER
            .split(PACKED_SEPARATOR)
            .zip(FIELD_NAMES)
            .filter(|(_, target)| OUTPUT_ATTRIBUTES.contains(target))
            .map(|(source, target)| ColumnMapping::new(source, target));
        let races = RACE_COLUMNS
            .iter()
            .map(|race| ColumnMapping::new(race.source, race.target));
        packed.chain(races).collect()
    }
}
