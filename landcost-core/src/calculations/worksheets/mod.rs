//! Per-category worksheets.
//!
//! Each worksheet contributes an ordered list of [`Step`]s. The shared
//! building blocks here cover the three shapes every category uses: a priced
//! line (quantity × rate), a group row summing a serial prefix, and the
//! category subtotal.

pub mod contingency;
pub mod demolition;
pub mod land;
pub mod resettlement;

use rust_decimal::Decimal;

use super::catalog::subtotal_line;
use super::common::RateUnit;
use super::pipeline::{Dependency, Step};
use super::sheet::CellKey;
use super::RecalculationError;
use crate::models::{
    Category, ComputingMethod, CostFilter, IndicatorKey, LineKey, LineKind, LineValues,
};

/// A line priced from one quantity indicator and one rate indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub line: &'static str,
    pub quantity: &'static str,
    pub rate: &'static str,
    pub unit: RateUnit,
}

impl PricedLine {
    pub const fn new(
        line: &'static str,
        quantity: &'static str,
        rate: &'static str,
        unit: RateUnit,
    ) -> Self {
        Self {
            line,
            quantity,
            rate,
            unit,
        }
    }
}

/// The worksheet steps for `category`. `method` only affects category 1.
pub fn category_steps(
    category: Category,
    method: ComputingMethod,
) -> Vec<Step> {
    match category {
        Category::LandCompensation => land::steps(method),
        Category::Demolition => demolition::steps(),
        Category::Resettlement => resettlement::steps(),
        Category::Contingency => contingency::steps(),
    }
}

/// value = quantity, unit_price and cost according to the line's rate unit.
pub(crate) fn priced_line_step(
    prefix: &str,
    category: Category,
    priced: PricedLine,
) -> Step {
    let quantity = IndicatorKey::new(category, priced.quantity);
    let rate = IndicatorKey::new(category, priced.rate);
    let line = LineKey::new(category, priced.line);

    Step::new(
        format!("{prefix}.line_{}", priced.line),
        vec![
            Dependency::indicator(category, priced.quantity),
            Dependency::indicator(category, priced.rate),
        ],
        vec![CellKey::line(category, priced.line)],
        move |sheet| {
            let quantity = sheet.indicator(&quantity)?;
            let rate = sheet.indicator(&rate)?;
            let cost = priced
                .unit
                .cost(quantity, rate)
                .ok_or_else(|| RecalculationError::Overflow(line.to_string()))?;
            sheet.set_line(
                &line,
                LineValues {
                    value: quantity,
                    unit_price: priced.unit.unit_price(rate),
                    cost,
                },
            )
        },
    )
}

/// Writes the sum of every line cost under `serial.` into the group row `serial`.
pub(crate) fn group_subtotal_step(
    prefix: &str,
    category: Category,
    serial: &'static str,
) -> Step {
    let filter = CostFilter::category(category).with_prefix(format!("{serial}."));
    let line = LineKey::new(category, serial);

    Step::new(
        format!("{prefix}.group_{serial}"),
        vec![Dependency::Lines(filter.clone())],
        vec![CellKey::line(category, serial)],
        move |sheet| {
            let cost = sheet.sum_line_costs(&filter)?;
            sheet.set_line_cost(&line, cost)
        },
    )
}

/// Writes the sum of the category's item lines into its subtotal line.
pub(crate) fn subtotal_step(
    prefix: &str,
    category: Category,
) -> Step {
    let filter = CostFilter::category(category).with_kind(LineKind::Item);
    let line = subtotal_line(category);
    let cell = CellKey::Line(line.clone());

    Step::new(
        format!("{prefix}.subtotal"),
        vec![Dependency::Lines(filter.clone())],
        vec![cell],
        move |sheet| {
            let cost = sheet.sum_line_costs(&filter)?;
            sheet.set_line_cost(&line, cost)
        },
    )
}

/// Writes `sum` into indicator `target`, where `sum` adds every indicator under `prefix`.
pub(crate) fn derived_sum_step(
    name: &str,
    category: Category,
    prefix: &'static str,
    target: &'static str,
) -> Step {
    let key = IndicatorKey::new(category, target);

    Step::new(
        name,
        vec![Dependency::indicators(category, prefix)],
        vec![CellKey::indicator(category, target)],
        move |sheet| {
            let total = sheet.sum_indicators(category, prefix)?;
            sheet.set_indicator(&key, total)
        },
    )
}

/// Writes `factor × source` into indicator `target`.
pub(crate) fn derived_scale_step(
    name: &str,
    category: Category,
    source: &'static str,
    factor: Decimal,
    target: &'static str,
) -> Step {
    let source_key = IndicatorKey::new(category, source);
    let target_key = IndicatorKey::new(category, target);

    Step::new(
        name,
        vec![Dependency::indicator(category, source)],
        vec![CellKey::indicator(category, target)],
        move |sheet| {
            let value = sheet
                .indicator(&source_key)?
                .checked_mul(factor)
                .ok_or_else(|| RecalculationError::Overflow(target_key.to_string()))?;
            sheet.set_indicator(&target_key, value)
        },
    )
}
