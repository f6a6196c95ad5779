use std::collections::BTreeMap;
use std::io::Read;

use landcost_core::{
    Category, ComputingMethod, CostService, IndicatorEdit, RecalculationError,
    RecalculationReport, RecalculationRequest, is_valid_serial,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading indicator values.
#[derive(Debug, Error)]
pub enum IndicatorLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("row {row}: category must be between 1 and 4, got {category}")]
    InvalidCategory { row: usize, category: i32 },

    #[error("row {row}: invalid serial number '{serial}'")]
    InvalidSerial { row: usize, serial: String },

    #[error("row {row}: either serial_number or indicator_name is required")]
    MissingTarget { row: usize },

    #[error("category {category}: {source}")]
    Recalculation {
        category: Category,
        #[source]
        source: RecalculationError,
    },
}

impl From<csv::Error> for IndicatorLoaderError {
    fn from(err: csv::Error) -> Self {
        IndicatorLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from an indicator values CSV file.
///
/// - `category`: 1 to 4
/// - `serial_number`: dotted serial such as `1.2`; may be empty when
///   `indicator_name` is given
/// - `indicator_name`: optional label, used only when `serial_number` is empty
/// - `value`: the new indicator value
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct IndicatorRecord {
    pub category: i32,
    #[serde(deserialize_with = "deserialize_optional_string")]
    pub serial_number: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_string")]
    pub indicator_name: Option<String>,
    pub value: Decimal,
}

fn deserialize_optional_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

impl IndicatorRecord {
    fn to_edit(&self) -> Option<IndicatorEdit> {
        match (&self.serial_number, &self.indicator_name) {
            (Some(serial), _) => Some(IndicatorEdit::by_serial(serial.clone(), self.value)),
            (None, Some(name)) => Some(IndicatorEdit::by_name(name.clone(), self.value)),
            (None, None) => None,
        }
    }
}

/// Bulk input update from CSV.
///
/// Rows are grouped by category; each group is applied as one bulk edit
/// followed by that category's recalculation.
pub struct IndicatorLoader;

impl IndicatorLoader {
    /// Parse and validate indicator records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<IndicatorRecord>, IndicatorLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for (index, result) in csv_reader.deserialize().enumerate() {
            let record: IndicatorRecord = result?;
            // header is line 1
            let row = index + 2;

            if Category::from_id(record.category).is_none() {
                return Err(IndicatorLoaderError::InvalidCategory {
                    row,
                    category: record.category,
                });
            }
            match &record.serial_number {
                Some(serial) if !is_valid_serial(serial) => {
                    return Err(IndicatorLoaderError::InvalidSerial {
                        row,
                        serial: serial.clone(),
                    });
                }
                None if record.indicator_name.is_none() => {
                    return Err(IndicatorLoaderError::MissingTarget { row });
                }
                _ => {}
            }
            records.push(record);
        }

        Ok(records)
    }

    /// Apply the records through `service`, one category at a time in
    /// ascending order so the contingency line sees fresh subtotals.
    ///
    /// `method` selects the category-1 formula; other categories ignore it.
    pub async fn load(
        service: &CostService,
        records: &[IndicatorRecord],
        method: ComputingMethod,
    ) -> Result<Vec<RecalculationReport>, IndicatorLoaderError> {
        let mut groups: BTreeMap<Category, Vec<IndicatorEdit>> = BTreeMap::new();
        for (index, record) in records.iter().enumerate() {
            let row = index + 2;
            let category = Category::from_id(record.category).ok_or(
                IndicatorLoaderError::InvalidCategory {
                    row,
                    category: record.category,
                },
            )?;
            let edit = record
                .to_edit()
                .ok_or(IndicatorLoaderError::MissingTarget { row })?;
            groups.entry(category).or_default().push(edit);
        }

        let mut reports = Vec::with_capacity(groups.len());
        for (category, edits) in groups {
            let request = RecalculationRequest::new(category, method);
            let report = service
                .apply_edits(request, &edits)
                .await
                .map_err(|source| IndicatorLoaderError::Recalculation { category, source })?;
            reports.push(report);
        }

        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const TEST_CSV: &str = "category,serial_number,indicator_name,value
1,1,,100
1,,平均综合补偿标准（万元/亩）,2
2,1.1,砖混结构房屋面积（平方米）,1200
";

    #[test]
    fn test_parse_valid_csv() {
        let records = IndicatorLoader::parse(TEST_CSV.as_bytes()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(
            records[0],
            IndicatorRecord {
                category: 1,
                serial_number: Some("1".to_string()),
                indicator_name: None,
                value: dec!(100),
            }
        );
        assert_eq!(records[1].serial_number, None);
        assert_eq!(records[2].value, dec!(1200));
    }

    #[test]
    fn test_serial_takes_precedence_over_name() {
        let records = IndicatorLoader::parse(TEST_CSV.as_bytes()).unwrap();

        assert_eq!(
            records[2].to_edit(),
            Some(IndicatorEdit::by_serial("1.1", dec!(1200)))
        );
        assert_eq!(
            records[1].to_edit(),
            Some(IndicatorEdit::by_name("平均综合补偿标准（万元/亩）", dec!(2)))
        );
    }

    #[test]
    fn test_indicator_name_column_is_optional() {
        let csv = "category,serial_number,value\n3,1,200\n";

        let records = IndicatorLoader::parse(csv.as_bytes()).unwrap();

        assert_eq!(records[0].indicator_name, None);
    }

    #[test]
    fn test_parse_rejects_invalid_category() {
        let csv = "category,serial_number,value\n1,1,5\n5,1,5\n";

        let result = IndicatorLoader::parse(csv.as_bytes());

        assert!(matches!(
            result,
            Err(IndicatorLoaderError::InvalidCategory { row: 3, category: 5 })
        ));
    }

    #[test]
    fn test_parse_rejects_malformed_serial() {
        let csv = "category,serial_number,value\n1,1.a,5\n";

        let result = IndicatorLoader::parse(csv.as_bytes());

        assert!(matches!(
            result,
            Err(IndicatorLoaderError::InvalidSerial { row: 2, ref serial }) if serial == "1.a"
        ));
    }

    #[test]
    fn test_parse_requires_a_target() {
        let csv = "category,serial_number,indicator_name,value\n1,,,5\n";

        let result = IndicatorLoader::parse(csv.as_bytes());

        assert!(matches!(result, Err(IndicatorLoaderError::MissingTarget { row: 2 })));
    }

    #[test]
    fn test_parse_rejects_non_numeric_value() {
        let csv = "category,serial_number,value\n1,1,many\n";

        let result = IndicatorLoader::parse(csv.as_bytes());

        assert!(matches!(result, Err(IndicatorLoaderError::CsvParse(_))));
    }
}
