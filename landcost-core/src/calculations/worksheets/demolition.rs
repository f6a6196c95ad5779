//! Category 2: demolition compensation (拆迁补偿费).
//!
//! Indicator `1` is the total demolition area, rewritten from `1.1`–`1.5`
//! on every pass. Each structure type `i` prices area `1.i` at standard
//! `2.i` (元/m²) on line `i`; line 6 carries the subtotal.

use crate::calculations::common::RateUnit;
use crate::calculations::pipeline::Step;
use crate::models::Category;

use super::{PricedLine, derived_sum_step, priced_line_step, subtotal_step};

const CATEGORY: Category = Category::Demolition;
const PREFIX: &str = "demolition";

const LINES: [PricedLine; 5] = [
    PricedLine::new("1", "1.1", "2.1", RateUnit::Yuan),
    PricedLine::new("2", "1.2", "2.2", RateUnit::Yuan),
    PricedLine::new("3", "1.3", "2.3", RateUnit::Yuan),
    PricedLine::new("4", "1.4", "2.4", RateUnit::Yuan),
    PricedLine::new("5", "1.5", "2.5", RateUnit::Yuan),
];

pub fn steps() -> Vec<Step> {
    let mut steps = vec![derived_sum_step("demolition.total_area", CATEGORY, "1.", "1")];
    steps.extend(LINES.map(|priced| priced_line_step(PREFIX, CATEGORY, priced)));
    steps.push(subtotal_step(PREFIX, CATEGORY));
    steps
}
