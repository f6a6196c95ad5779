mod category;
mod estimate_line;
mod indicator;

pub use category::{Category, ComputingMethod};
pub use estimate_line::{CostFilter, EstimateLine, LineKey, LineKind, LineValues};
pub use indicator::{
    EditTarget, IndicatorEdit, IndicatorFilter, IndicatorInput, IndicatorKey, is_valid_serial,
};

/// A single write produced by a recalculation or a bulk edit.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum CellUpdate {
    Indicator {
        key: IndicatorKey,
        #[serde(with = "rust_decimal::serde::float")]
        value: rust_decimal::Decimal,
    },
    Line {
        key: LineKey,
        values: LineValues,
    },
}
