//! Category 4: unforeseen expenses (不可预见费) and the grand total.
//!
//! Line 1 applies the contingency percentage (indicator `1`) to the sum of
//! the category 1–3 subtotals. Line 2 carries the grand total, the sum of
//! the four subtotal-bearing lines; it is refreshed after every category.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::calculations::RecalculationError;
use crate::calculations::catalog::{grand_total_line, subtotal_line};
use crate::calculations::common::checked_sum;
use crate::calculations::pipeline::{Dependency, Step};
use crate::calculations::sheet::{CellKey, CostSheet};
use crate::models::{Category, IndicatorKey, LineKey, LineValues};

const CATEGORY: Category = Category::Contingency;

const PRICED_CATEGORIES: [Category; 3] = [
    Category::LandCompensation,
    Category::Demolition,
    Category::Resettlement,
];

pub fn steps() -> Vec<Step> {
    vec![contingency_step()]
}

fn contingency_step() -> Step {
    let rate = IndicatorKey::new(CATEGORY, "1");
    let line = subtotal_line(CATEGORY);

    let mut reads = vec![Dependency::indicator(CATEGORY, "1")];
    reads.extend(PRICED_CATEGORIES.map(|c| Dependency::Cell(CellKey::Line(subtotal_line(c)))));

    Step::new(
        "contingency.line_1",
        reads,
        vec![CellKey::Line(line.clone())],
        move |sheet| {
            let percentage = sheet.indicator(&rate)?;
            let base = subtotal_sum(sheet, &PRICED_CATEGORIES, &line)?;
            let cost = percentage
                .checked_mul(base)
                .and_then(|product| product.checked_div(dec!(100)))
                .ok_or_else(|| RecalculationError::Overflow(line.to_string()))?;
            sheet.set_line(
                &line,
                LineValues {
                    value: percentage,
                    unit_price: base,
                    cost,
                },
            )
        },
    )
}

/// Sums the four subtotal-bearing lines into the total cost line.
pub fn grand_total_step() -> Step {
    let total = grand_total_line();

    Step::new(
        "grand_total",
        Category::ALL
            .map(|c| Dependency::Cell(CellKey::Line(subtotal_line(c))))
            .to_vec(),
        vec![CellKey::Line(total.clone())],
        move |sheet| {
            let cost = subtotal_sum(sheet, &Category::ALL, &total)?;
            sheet.set_line_cost(&total, cost)
        },
    )
}

fn subtotal_sum(
    sheet: &CostSheet,
    categories: &[Category],
    target: &LineKey,
) -> Result<Decimal, RecalculationError> {
    let mut costs = Vec::with_capacity(categories.len());
    for category in categories {
        costs.push(sheet.line(&subtotal_line(*category))?.cost);
    }
    checked_sum(costs).ok_or_else(|| RecalculationError::Overflow(target.to_string()))
}
