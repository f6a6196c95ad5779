//! Category 1: land compensation (征地补偿费).
//!
//! # Worksheet Structure
//!
//! | Line | Item | Quantity | Rate |
//! |------|------|----------|------|
//! | 1    | 土地补偿费 | indicator 1 (mu) | indicator 2 (万元/mu) |
//! | 2    | 青苗补偿费 | indicator 3 | indicator 4 |
//! | 3    | 地上附着物补偿费 | indicator 5 | indicator 6 |
//! | 4    | 耕地开垦费 | indicator 7 | indicator 8 |
//! | 5    | 耕地占用税 | indicator 9 (mu) | indicator 10 (元/m²) |
//! | 6    | subtotal of lines 1–5 | | |
//!
//! # Computing Methods
//!
//! With [`ComputingMethod::Direct`] line 1 prices indicator 1 by indicator 2
//! as entered. With [`ComputingMethod::Itemized`] indicator 1 is first
//! rewritten as the sum of `1.1`–`1.4`, indicator 2 as the mean of
//! `2.1`–`2.4`, and the line cost is the per-sub-type sum
//! Σ(`1.i` × `2.i`), which is generally not `1` × `2`.

use rust_decimal::Decimal;

use crate::calculations::RecalculationError;
use crate::calculations::common::RateUnit;
use crate::calculations::pipeline::{Dependency, Step};
use crate::calculations::sheet::CellKey;
use crate::models::{Category, ComputingMethod, IndicatorKey, LineKey, LineValues};

use super::{PricedLine, derived_sum_step, priced_line_step, subtotal_step};

const CATEGORY: Category = Category::LandCompensation;
const PREFIX: &str = "land";

/// Sub-type (area, standard) pairs feeding the itemized land compensation line.
pub const SUB_TYPES: [(&str, &str); 4] = [
    ("1.1", "2.1"),
    ("1.2", "2.2"),
    ("1.3", "2.3"),
    ("1.4", "2.4"),
];

const COMPENSATION: PricedLine = PricedLine::new("1", "1", "2", RateUnit::TenThousandYuan);

const SHARED_LINES: [PricedLine; 4] = [
    PricedLine::new("2", "3", "4", RateUnit::TenThousandYuan),
    PricedLine::new("3", "5", "6", RateUnit::TenThousandYuan),
    PricedLine::new("4", "7", "8", RateUnit::TenThousandYuan),
    PricedLine::new("5", "9", "10", RateUnit::YuanPerSquareMeter),
];

pub fn steps(method: ComputingMethod) -> Vec<Step> {
    let mut steps = match method {
        ComputingMethod::Direct => vec![priced_line_step(PREFIX, CATEGORY, COMPENSATION)],
        ComputingMethod::Itemized => vec![
            derived_sum_step("land.total_area", CATEGORY, "1.", "1"),
            average_standard_step(),
            itemized_compensation_step(),
        ],
    };
    steps.extend(SHARED_LINES.map(|priced| priced_line_step(PREFIX, CATEGORY, priced)));
    steps.push(subtotal_step(PREFIX, CATEGORY));
    steps
}

fn average_standard_step() -> Step {
    let target = IndicatorKey::new(CATEGORY, "2");

    Step::new(
        "land.average_standard",
        vec![Dependency::indicators(CATEGORY, "2.")],
        vec![CellKey::indicator(CATEGORY, "2")],
        move |sheet| {
            let average = sheet.average_indicators(CATEGORY, "2.")?;
            sheet.set_indicator(&target, average)
        },
    )
}

fn itemized_compensation_step() -> Step {
    let mut reads = vec![
        Dependency::indicator(CATEGORY, "1"),
        Dependency::indicator(CATEGORY, "2"),
    ];
    for (area, standard) in SUB_TYPES {
        reads.push(Dependency::indicator(CATEGORY, area));
        reads.push(Dependency::indicator(CATEGORY, standard));
    }
    let line = LineKey::new(CATEGORY, COMPENSATION.line);

    Step::new(
        "land.line_1",
        reads,
        vec![CellKey::line(CATEGORY, COMPENSATION.line)],
        move |sheet| {
            let total_area = sheet.indicator(&IndicatorKey::new(CATEGORY, "1"))?;
            let average_standard = sheet.indicator(&IndicatorKey::new(CATEGORY, "2"))?;
            let mut products = Vec::with_capacity(SUB_TYPES.len());
            for (area, standard) in SUB_TYPES {
                let area = sheet.indicator(&IndicatorKey::new(CATEGORY, area))?;
                let standard = sheet.indicator(&IndicatorKey::new(CATEGORY, standard))?;
                products.push(area.checked_mul(standard));
            }
            let cost = products
                .into_iter()
                .try_fold(Decimal::ZERO, |sum, product| sum.checked_add(product?))
                .ok_or_else(|| RecalculationError::Overflow(line.to_string()))?;
            sheet.set_line(
                &line,
                LineValues {
                    value: total_area,
                    unit_price: average_standard,
                    cost,
                },
            )
        },
    )
}
