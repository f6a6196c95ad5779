use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Category;

/// Role of a row in the estimate table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// A priced cost item.
    Item,
    /// Sum of the items sharing this row's serial as a prefix.
    GroupSubtotal,
    /// The one row per category that carries the category's total.
    Subtotal,
    /// Sum of the four category subtotals.
    GrandTotal,
}

impl LineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::GroupSubtotal => "group_subtotal",
            Self::Subtotal => "subtotal",
            Self::GrandTotal => "grand_total",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "item" => Some(Self::Item),
            "group_subtotal" => Some(Self::GroupSubtotal),
            "subtotal" => Some(Self::Subtotal),
            "grand_total" => Some(Self::GrandTotal),
            _ => None,
        }
    }
}

/// One row of the output cost table. Amounts are in 万元.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateLine {
    pub id: i64,
    pub category: Category,
    pub serial_number: String,
    pub project_name: String,
    pub unit: String,
    pub kind: LineKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
}

impl EstimateLine {
    pub fn key(&self) -> LineKey {
        LineKey::new(self.category, self.serial_number.clone())
    }

    pub fn values(&self) -> LineValues {
        LineValues {
            value: self.value,
            unit_price: self.unit_price,
            cost: self.cost,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineKey {
    pub category: Category,
    pub serial_number: String,
}

impl LineKey {
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

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "estimate line {}/{}", self.category, self.serial_number)
    }
}

/// The engine-owned columns of an estimate line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineValues {
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub cost: Decimal,
}

/// Selection used by cost aggregation. Empty fields match everything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CostFilter {
    pub category: Option<Category>,
    pub serial_prefix: Option<String>,
    pub kind: Option<LineKind>,
}

impl CostFilter {
    pub fn category(category: Category) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    pub fn with_prefix(
        mut self,
        prefix: impl Into<String>,
    ) -> Self {
        self.serial_prefix = Some(prefix.into());
        self
    }

    pub fn with_kind(
        mut self,
        kind: LineKind,
    ) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn matches(
        &self,
        line: &EstimateLine,
    ) -> bool {
        self.category.is_none_or(|c| c == line.category)
            && self
                .serial_prefix
                .as_deref()
                .is_none_or(|p| line.serial_number.starts_with(p))
            && self.kind.is_none_or(|k| k == line.kind)
    }
}

impl fmt::Display for CostFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let category = self
            .category
            .map_or_else(|| "*".to_string(), |c| c.to_string());
        let prefix = self.serial_prefix.as_deref().unwrap_or("*");
        let kind = self.kind.map_or("*", |k| k.as_str());
        write!(f, "lines[category={category}, prefix={prefix}, kind={kind}]")
    }
}
