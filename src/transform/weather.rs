use super::{select_renamed, source_columns, ColumnMapping, Dataset, DatasetTransform, TransformOutput};
use crate::error::Result;
use crate::ingestion::CsvConnector;
use bytes::Bytes;

pub const WEATHER_COLUMNS: [ColumnMapping; 13] = [
    ColumnMapping::new("ID", "accident_id"),
    ColumnMapping::new("Temperature(F)", "temperature"),
    ColumnMapping::new("Wind_Chill(F)", "wind_chill"),
    ColumnMapping::new("Humidity(%)", "humidity"),
    ColumnMapping::new("Pressure(in)", "pressure"),
    ColumnMapping::new("Visibility(mi)", "visibility"),
    ColumnMapping::new("Wind_Direction", "wind_direction"),
    ColumnMapping::new("Wind_Speed(mph)", "wind_speed"),
    ColumnMapping::new("Precipitation(in)", "precipitation"),
    ColumnMapping::new("Weather_Condition", "weather_condition"),
    ColumnMapping::new("Bump", "bump"),
    ColumnMapping::new("Crossing", "crossing"),
    ColumnMapping::new("Sunrise_Sunset", "sunrise_sunset"),
];

/// Weather conditions at each accident, read from the accidents file.
/// Projection only, values stay text.
pub struct WeatherTransform;

impl DatasetTransform for WeatherTransform {
    fn transform(&self, content: Bytes) -> Result<TransformOutput> {
        let raw = CsvConnector::new(Dataset::Weather.name(), content)
            .read_columns(&source_columns(&WEATHER_COLUMNS))?;
        let rows_read = raw.height();
        let frame = select_renamed(raw, &WEATHER_COLUMNS)?;
        Ok(TransformOutput::new(frame, rows_read))
    }

    fn column_plan(&self) -> Vec<ColumnMapping> {
        WEATHER_COLUMNS.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EtlError;

    const HEADER: &str = "ID,Temperature(F),Wind_Chill(F),Humidity(%),Pressure(in),Visibility(mi),\
Wind_Direction,Wind_Speed(mph),Precipitation(in),Weather_Condition,Bump,Crossing,Sunrise_Sunset";

    #[test]
    fn test_weather_projection() {
        let csv = format!(
            "{}\nA-1,36.9,,91.0,29.68,10.0,Calm,,0.02,Light Rain,False,False,Night\n\
             A-2,37.9,,100.0,29.65,10.0,Calm,,0.0,Overcast,False,True,Day\n",
            HEADER
        );
        let out = WeatherTransform.transform(Bytes::from(csv)).unwrap();

        assert_eq!(out.frame.height(), out.rows_read);
        assert_eq!(out.frame.width(), 13);
        let condition = out.frame.column("weather_condition").unwrap().str().unwrap();
        assert_eq!(condition.get(0), Some("Light Rain"));
        let crossing = out.frame.column("crossing").unwrap().str().unwrap();
        assert_eq!(crossing.get(1), Some("True"));
        let wind_chill = out.frame.column("wind_chill").unwrap().str().unwrap();
        assert_eq!(wind_chill.get(0), None);
    }

    #[test]
    fn test_missing_source_column() {
        let csv = "ID,Temperature(F)\nA-1,36.9\n";
        let result = WeatherTransform.transform(Bytes::from(csv));
        assert!(matches!(result, Err(EtlError::MissingColumn { .. })));
    }
}
