use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Category;

/// One named input quantity (area, unit standard, headcount, rate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorInput {
    pub id: i64,
    pub category: Category,
    pub serial_number: String,
    pub indicator_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    pub remark: Option<String>,
    pub basis: Option<String>,
    pub source_url: Option<String>,
}

impl IndicatorInput {
    pub fn key(&self) -> IndicatorKey {
        IndicatorKey::new(self.category, self.serial_number.clone())
    }
}

/// Identity of an indicator row: category plus dotted serial number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndicatorKey {
    pub category: Category,
    pub serial_number: String,
}

impl IndicatorKey {
    pub fn new(
        category: Category,
        serial_number: impl Into<String>,
    ) -> Self {
        Self {
            category,
            serial_number: serial_number.into(),
        }
    }
}

impl fmt::Display for IndicatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "indicator {}/{}", self.category, self.serial_number)
    }
}

/// Row selection for indicator reads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IndicatorFilter {
    #[default]
    All,
    SerialPrefix(String),
    Serial(String),
    Name(String),
    Id(i64),
}

impl IndicatorFilter {
    pub fn matches(
        &self,
        indicator: &IndicatorInput,
    ) -> bool {
        match self {
            Self::All => true,
            Self::SerialPrefix(prefix) => indicator.serial_number.starts_with(prefix.as_str()),
            Self::Serial(serial) => indicator.serial_number == *serial,
            Self::Name(name) => indicator.indicator_name == *name,
            Self::Id(id) => indicator.id == *id,
        }
    }
}

/// How a bulk edit addresses its indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditTarget {
    Serial(String),
    Name(String),
    Id(i64),
}

impl fmt::Display for EditTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serial(serial) => write!(f, "serial '{serial}'"),
            Self::Name(name) => write!(f, "name '{name}'"),
            Self::Id(id) => write!(f, "id {id}"),
        }
    }
}

/// A raw edit to one indicator value within a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorEdit {
    pub target: EditTarget,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
}

impl IndicatorEdit {
    pub fn by_serial(
        serial: impl Into<String>,
        value: Decimal,
    ) -> Self {
        Self {
            target: EditTarget::Serial(serial.into()),
            value,
        }
    }

    pub fn by_name(
        name: impl Into<String>,
        value: Decimal,
    ) -> Self {
        Self {
            target: EditTarget::Name(name.into()),
            value,
        }
    }
}

/// Returns true for dotted numeric serials such as `7`, `1.2` or `6.1.3`.
pub fn is_valid_serial(serial: &str) -> bool {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^\d+(\.\d+)*$").ok())
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(serial))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn indicator(serial: &str, name: &str) -> IndicatorInput {
        IndicatorInput {
            id: 7,
            category: Category::LandCompensation,
            serial_number: serial.to_string(),
            indicator_name: name.to_string(),
            value: dec!(1),
            remark: None,
            basis: None,
            source_url: None,
        }
    }

    #[test]
    fn serial_prefix_does_not_match_parent_row() {
        let filter = IndicatorFilter::SerialPrefix("1.".to_string());

        assert!(filter.matches(&indicator("1.3", "园地面积")));
        assert!(!filter.matches(&indicator("1", "征收土地总面积")));
        assert!(!filter.matches(&indicator("10", "耕地占用税标准")));
    }

    #[test]
    fn name_and_id_filters_match_exactly() {
        let row = indicator("2", "平均综合补偿标准");

        assert!(IndicatorFilter::Name("平均综合补偿标准".to_string()).matches(&row));
        assert!(!IndicatorFilter::Name("平均".to_string()).matches(&row));
        assert!(IndicatorFilter::Id(7).matches(&row));
        assert!(!IndicatorFilter::Id(8).matches(&row));
    }

    #[test]
    fn serial_validation() {
        assert!(is_valid_serial("1"));
        assert!(is_valid_serial("6.1"));
        assert!(is_valid_serial("10.2.3"));
        assert!(!is_valid_serial(""));
        assert!(!is_valid_serial("1."));
        assert!(!is_valid_serial("a.1"));
        assert!(!is_valid_serial("1..2"));
    }
}
