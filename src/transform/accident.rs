use super::{select_renamed, source_columns, ColumnMapping, Dataset, DatasetTransform, TransformOutput};
use crate::config::WeekdayConvention;
use crate::data_utils::{parse_timestamp, string_column, CalendarParts};
use crate::error::Result;
use crate::ingestion::CsvConnector;
use bytes::Bytes;
use polars::prelude::*;

pub const ACCIDENT_COLUMNS: [ColumnMapping; 8] = [
    ColumnMapping::new("ID", "accident_id"),
    ColumnMapping::new("Street", "street"),
    ColumnMapping::new("City", "city"),
    ColumnMapping::new("County", "county"),
    ColumnMapping::new("State", "state"),
    ColumnMapping::new("Zipcode", "zipcode"),
    ColumnMapping::new("Airport_Code", "airport_code_id"),
    ColumnMapping::new("Weather_Timestamp", "weather_timestamp"),
];

/// Columns derived from `weather_timestamp`
pub const DERIVED_COLUMNS: [&str; 5] = ["timestamp", "hour", "month", "weekday", "year"];

/// Accident location and time, with calendar fields derived from the
/// weather timestamp
pub struct AccidentTransform {
    weekday: WeekdayConvention,
}

impl AccidentTransform {
    pub fn new(weekday: WeekdayConvention) -> Self {
        Self { weekday }
    }
}

/// Append `timestamp`, `hour`, `month`, `weekday` and `year`.
///
/// A malformed or missing `weather_timestamp` leaves all five null.
pub fn derive_calendar_fields(df: &mut DataFrame, convention: WeekdayConvention) -> Result<()> {
    let parsed = string_column(df, "weather_timestamp")?
        .into_iter()
        .map(|value| value.and_then(parse_timestamp))
        .collect::<Vec<_>>();

    let micros = parsed
        .iter()
        .map(|ts| ts.map(|t| t.and_utc().timestamp_micros()))
        .collect::<Vec<_>>();
    let parts = parsed
        .iter()
        .map(|ts| ts.map(|t| CalendarParts::from_timestamp(&t, convention)))
        .collect::<Vec<_>>();

    let field = |f: fn(&CalendarParts) -> i32| {
        parts.iter().map(|p| p.as_ref().map(f)).collect::<Vec<Option<i32>>>()
    };

    let timestamp = Series::new("timestamp", micros)
        .cast(&DataType::Datetime(TimeUnit::Microseconds, None))?;

    df.with_column(timestamp)?;
    df.with_column(Series::new("hour", field(|p| p.hour)))?;
    df.with_column(Series::new("month", field(|p| p.month)))?;
    df.with_column(Series::new("weekday", field(|p| p.weekday)))?;
    df.with_column(Series::new("year", field(|p| p.year)))?;
    Ok(())
}

impl DatasetTransform for AccidentTransform {
    fn transform(&self, content: Bytes) -> Result<TransformOutput> {
        let raw = CsvConnector::new(Dataset::Accident.name(), content)
            .read_columns(&source_columns(&ACCIDENT_COLUMNS))?;
        let rows_read = raw.height();

        let mut frame = select_renamed(raw, &ACCIDENT_COLUMNS)?;
        derive_calendar_fields(&mut frame, self.weekday)?;

        let unparsed = frame.column("timestamp")?.null_count()
            - frame.column("weather_timestamp")?.null_count();
        if unparsed > 0 {
            tracing::warn!("{} accident rows have a malformed weather timestamp", unparsed);
        }

        Ok(TransformOutput::new(frame, rows_read))
    }

    fn column_plan(&self) -> Vec<ColumnMapping> {
        let mut plan = ACCIDENT_COLUMNS.to_vec();
        plan.extend(
            DERIVED_COLUMNS
                .iter()
                .map(|name| ColumnMapping::new("Weather_Timestamp", *name)),
        );
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "ID,Source,Street,City,County,State,Zipcode,Airport_Code,Weather_Timestamp";

    fn transform(body: &str, weekday: WeekdayConvention) -> TransformOutput {
        let csv = format!("{}\n{}", HEADER, body);
        AccidentTransform::new(weekday)
            .transform(Bytes::from(csv))
            .unwrap()
    }

    fn int_at(df: &DataFrame, column: &str, row: usize) -> Option<i32> {
        df.column(column).unwrap().i32().unwrap().get(row)
    }

    #[test]
    fn test_derives_calendar_fields() {
        let out = transform(
            "A-1,MapQuest,I-70 E,Dayton,Montgomery,OH,45424,KFFO,2020-01-15 13:45:00\n",
            WeekdayConvention::Iso,
        );
        let df = &out.frame;

        assert_eq!(
            df.get_column_names(),
            vec![
                "accident_id", "street", "city", "county", "state", "zipcode",
                "airport_code_id", "weather_timestamp", "timestamp", "hour", "month",
                "weekday", "year",
            ]
        );
        assert_eq!(int_at(df, "hour", 0), Some(13));
        assert_eq!(int_at(df, "month", 0), Some(1));
        assert_eq!(int_at(df, "weekday", 0), Some(3));
        assert_eq!(int_at(df, "year", 0), Some(2020));
        assert_eq!(
            df.column("timestamp").unwrap().dtype(),
            &DataType::Datetime(TimeUnit::Microseconds, None)
        );
    }

    #[test]
    fn test_sunday_first_weekday() {
        let out = transform(
            "A-1,MapQuest,I-70 E,Dayton,Montgomery,OH,45424,KFFO,2020-01-15 13:45:00\n\
             A-2,MapQuest,Main St,Dayton,Montgomery,OH,45424,KFFO,2020-01-19 08:00:00\n",
            WeekdayConvention::SundayFirst,
        );
        assert_eq!(int_at(&out.frame, "weekday", 0), Some(4));
        assert_eq!(int_at(&out.frame, "weekday", 1), Some(1));
    }

    #[test]
    fn test_malformed_timestamp_yields_nulls() {
        let out = transform(
            "A-1,MapQuest,I-70 E,Dayton,Montgomery,OH,45424,KFFO,not a time\n\
             A-2,MapQuest,I-70 E,Dayton,Montgomery,OH,45424,KFFO,\n\
             A-3,MapQuest,I-70 E,Dayton,Montgomery,OH,45424,KFFO,2016-02-08 05:58:00\n",
            WeekdayConvention::Iso,
        );
        let df = &out.frame;

        assert_eq!(df.height(), 3);
        assert_eq!(df.column("timestamp").unwrap().null_count(), 2);
        for column in ["hour", "month", "weekday", "year"] {
            assert_eq!(int_at(df, column, 0), None);
            assert_eq!(int_at(df, column, 1), None);
        }
        assert_eq!(int_at(df, "hour", 2), Some(5));

        let raw = df.column("weather_timestamp").unwrap().str().unwrap();
        assert_eq!(raw.get(0), Some("not a time"));
    }

    #[test]
    fn test_zipcode_kept_as_text() {
        let out = transform(
            "A-1,Bing,Elm St,Boston,Suffolk,MA,02116-4301,KBOS,2020-06-01 00:00:00\n",
            WeekdayConvention::Iso,
        );
        let zip = out.frame.column("zipcode").unwrap().str().unwrap();
        assert_eq!(zip.get(0), Some("02116-4301"));
    }
}
