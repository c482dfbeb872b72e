use super::{select_renamed, source_columns, ColumnMapping, Dataset, DatasetTransform, TransformOutput};
use crate::error::Result;
use crate::ingestion::CsvConnector;
use bytes::Bytes;

pub const INCOME_COLUMNS: [ColumnMapping; 4] = [
    ColumnMapping::new("Zip", "zip"),
    ColumnMapping::new("Median_income", "median_income"),
    ColumnMapping::new("Mean_income", "mean_income"),
    ColumnMapping::new("Population", "population"),
];

/// Zip-code income statistics: projection only, values stay text
pub struct IncomeTransform;

impl DatasetTransform for IncomeTransform {
    fn transform(&self, content: Bytes) -> Result<TransformOutput> {
        let raw = CsvConnector::new(Dataset::Income.name(), content)
            .read_columns(&source_columns(&INCOME_COLUMNS))?;
        let rows_read = raw.height();
        let frame = select_renamed(raw, &INCOME_COLUMNS)?;
        Ok(TransformOutput::new(frame, rows_read))
    }

    fn column_plan(&self) -> Vec<ColumnMapping> {
        INCOME_COLUMNS.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_income_projection() {
        let csv = "Zip,Median_income,Mean_income,Population,Extra\n\
                   1001,56662.5735,66687.7509,16445,x\n\
                   1002,49853.4177,75062.6343,28069,y\n\
                   1003,,,8491,z\n";
        let out = IncomeTransform.transform(Bytes::from(csv)).unwrap();

        assert_eq!(out.rows_read, 3);
        assert_eq!(out.frame.height(), 3);
        assert_eq!(
            out.frame.get_column_names(),
            vec!["zip", "median_income", "mean_income", "population"]
        );
        let zip = out.frame.column("zip").unwrap().str().unwrap();
        assert_eq!(zip.get(0), Some("1001"));
        let median = out.frame.column("median_income").unwrap().str().unwrap();
        assert_eq!(median.get(2), None);
    }

    #[test]
    fn test_duplicate_rows_are_kept() {
        let csv = "Zip,Median_income,Mean_income,Population\n1001,1,2,3\n1001,1,2,3\n";
        let out = IncomeTransform.transform(Bytes::from(csv)).unwrap();
        assert_eq!(out.frame.height(), 2);
    }
}
