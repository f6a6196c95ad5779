//! Category 3: personnel and enterprise resettlement (人员及企业安置补偿费).
//!
//! # Worksheet Structure
//!
//! The rural household-registration count (indicator `1`) drives two derived
//! headcounts: labor-eligible population `2` = 0.5 × `1` and excess-transfer
//! population `3` = 0.2 × `1`. Eleven item lines are then priced:
//!
//! | Line | Quantity | Rate | Rate unit |
//! |------|----------|------|-----------|
//! | 1.1  | 2  | 4  | 万元/person |
//! | 1.2  | 3  | 5  | 万元/person |
//! | 1.3  | 1  | 6  | 元 |
//! | 2    | 7  | 8  | 元 |
//! | 3    | 9  | 10 | 元 |
//! | 4    | 11 | 12 | 元 |
//! | 5    | 13 | 14 | 元 |
//! | 6.1  | 15 | 16 | 元 |
//! | 6.2  | 17 | 18 | 元 |
//! | 7.1  | 19 | 20 | 元 |
//! | 7.2  | 21 | 22 | 元 |
//!
//! Group rows `1`, `6` and `7` sum the items under their prefix. The
//! subtotal on line `8` sums item lines only, so group rows never count an
//! item a second time.

use rust_decimal_macros::dec;

use crate::calculations::common::RateUnit;
use crate::calculations::pipeline::Step;
use crate::models::Category;

use super::{
    PricedLine, derived_scale_step, group_subtotal_step, priced_line_step, subtotal_step,
};

const CATEGORY: Category = Category::Resettlement;
const PREFIX: &str = "resettlement";

const LINES: [PricedLine; 11] = [
    // Headcount subsidies are quoted in 万元 per person.
    PricedLine::new("1.1", "2", "4", RateUnit::TenThousandYuan),
    PricedLine::new("1.2", "3", "5", RateUnit::TenThousandYuan),
    PricedLine::new("1.3", "1", "6", RateUnit::Yuan),
    PricedLine::new("2", "7", "8", RateUnit::Yuan),
    PricedLine::new("3", "9", "10", RateUnit::Yuan),
    PricedLine::new("4", "11", "12", RateUnit::Yuan),
    PricedLine::new("5", "13", "14", RateUnit::Yuan),
    PricedLine::new("6.1", "15", "16", RateUnit::Yuan),
    PricedLine::new("6.2", "17", "18", RateUnit::Yuan),
    PricedLine::new("7.1", "19", "20", RateUnit::Yuan),
    PricedLine::new("7.2", "21", "22", RateUnit::Yuan),
];

const GROUPS: [&str; 3] = ["1", "6", "7"];

pub fn steps() -> Vec<Step> {
    let mut steps = vec![
        derived_scale_step("resettlement.labor_population", CATEGORY, "1", dec!(0.5), "2"),
        derived_scale_step("resettlement.transfer_population", CATEGORY, "1", dec!(0.2), "3"),
    ];
    steps.extend(LINES.map(|priced| priced_line_step(PREFIX, CATEGORY, priced)));
    steps.extend(GROUPS.map(|serial| group_subtotal_step(PREFIX, CATEGORY, serial)));
    steps.push(subtotal_step(PREFIX, CATEGORY));
    steps
}
