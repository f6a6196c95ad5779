//! Per-invocation working copy of the indicator and estimate tables.
//!
//! A [`CostSheet`] is built from fresh store reads at the start of every
//! recalculation. Worksheet steps read and write through it, so a value
//! derived by one step is visible to the next without touching the store,
//! and every write is recorded for a single commit at the end.

use std::collections::{HashMap, HashSet};
use std::fmt;

use rust_decimal::Decimal;

use super::RecalculationError;
use super::common::checked_sum;
use crate::models::{
    Category, CellUpdate, CostFilter, EditTarget, EstimateLine, IndicatorFilter, IndicatorInput,
    IndicatorKey, LineKey, LineValues,
};

/// Address of one writable cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellKey {
    Indicator(IndicatorKey),
    Line(LineKey),
}

impl CellKey {
    pub fn indicator(
        category: Category,
        serial: &str,
    ) -> Self {
        Self::Indicator(IndicatorKey::new(category, serial))
    }

    pub fn line(
        category: Category,
        serial: &str,
    ) -> Self {
        Self::Line(LineKey::new(category, serial))
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Indicator(key) => key.fmt(f),
            Self::Line(key) => key.fmt(f),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CostSheet {
    indicators: Vec<IndicatorInput>,
    indicator_index: HashMap<IndicatorKey, usize>,
    lines: Vec<EstimateLine>,
    line_index: HashMap<LineKey, usize>,
    touched: Vec<CellKey>,
    touched_set: HashSet<CellKey>,
}

impl CostSheet {
    /// Indexes both tables, rejecting duplicate keys.
    pub fn new(
        indicators: Vec<IndicatorInput>,
        lines: Vec<EstimateLine>,
    ) -> Result<Self, RecalculationError> {
        let mut indicator_index = HashMap::with_capacity(indicators.len());
        for (position, indicator) in indicators.iter().enumerate() {
            let key = indicator.key();
            if indicator_index.insert(key.clone(), position).is_some() {
                return Err(RecalculationError::DuplicateIndicator(key));
            }
        }

        let mut line_index = HashMap::with_capacity(lines.len());
        for (position, line) in lines.iter().enumerate() {
            let key = line.key();
            if line_index.insert(key.clone(), position).is_some() {
                return Err(RecalculationError::DuplicateLine(key));
            }
        }

        Ok(Self {
            indicators,
            indicator_index,
            lines,
            line_index,
            touched: Vec::new(),
            touched_set: HashSet::new(),
        })
    }

    pub fn contains(
        &self,
        cell: &CellKey,
    ) -> bool {
        match cell {
            CellKey::Indicator(key) => self.indicator_index.contains_key(key),
            CellKey::Line(key) => self.line_index.contains_key(key),
        }
    }

    // ── indicators ───────────────────────────────────────────────────────

    pub fn indicator(
        &self,
        key: &IndicatorKey,
    ) -> Result<Decimal, RecalculationError> {
        self.indicator_index
            .get(key)
            .map(|&position| self.indicators[position].value)
            .ok_or_else(|| RecalculationError::MissingIndicator(key.clone()))
    }

    pub fn indicators_matching<'a>(
        &'a self,
        category: Category,
        filter: &'a IndicatorFilter,
    ) -> impl Iterator<Item = &'a IndicatorInput> + 'a {
        self.indicators
            .iter()
            .filter(move |i| i.category == category && filter.matches(i))
    }

    /// Sum of the indicator values under `prefix`; fails when nothing matches.
    pub fn sum_indicators(
        &self,
        category: Category,
        prefix: &str,
    ) -> Result<Decimal, RecalculationError> {
        let (sum, _) = self.fold_prefix(category, prefix)?;
        Ok(sum)
    }

    /// Arithmetic mean of the indicator values under `prefix`.
    pub fn average_indicators(
        &self,
        category: Category,
        prefix: &str,
    ) -> Result<Decimal, RecalculationError> {
        let (sum, count) = self.fold_prefix(category, prefix)?;
        Ok(sum / Decimal::from(count))
    }

    fn fold_prefix(
        &self,
        category: Category,
        prefix: &str,
    ) -> Result<(Decimal, usize), RecalculationError> {
        let filter = IndicatorFilter::SerialPrefix(prefix.to_string());
        let describe = || format!("indicators[category={category}, prefix={prefix}]");
        let values: Vec<Decimal> = self
            .indicators_matching(category, &filter)
            .map(|i| i.value)
            .collect();
        if values.is_empty() {
            return Err(RecalculationError::EmptyAggregate(describe()));
        }
        let count = values.len();
        let sum = checked_sum(values).ok_or_else(|| RecalculationError::Overflow(describe()))?;
        Ok((sum, count))
    }

    pub fn set_indicator(
        &mut self,
        key: &IndicatorKey,
        value: Decimal,
    ) -> Result<(), RecalculationError> {
        let position = *self
            .indicator_index
            .get(key)
            .ok_or_else(|| RecalculationError::MissingIndicator(key.clone()))?;
        self.indicators[position].value = value;
        self.touch(CellKey::Indicator(key.clone()));
        Ok(())
    }

    /// Resolves a bulk-edit target to the key of exactly one indicator in `category`.
    pub fn resolve_edit(
        &self,
        category: Category,
        target: &EditTarget,
    ) -> Result<IndicatorKey, RecalculationError> {
        let filter = match target {
            EditTarget::Serial(serial) => IndicatorFilter::Serial(serial.clone()),
            EditTarget::Name(name) => IndicatorFilter::Name(name.clone()),
            EditTarget::Id(id) => IndicatorFilter::Id(*id),
        };
        let mut matches = self.indicators_matching(category, &filter);
        let first = matches
            .next()
            .ok_or_else(|| RecalculationError::UnknownEditTarget {
                category,
                target: target.clone(),
            })?;
        if matches.next().is_some() {
            return Err(RecalculationError::AmbiguousIndicatorName {
                category,
                name: first.indicator_name.clone(),
            });
        }
        Ok(first.key())
    }

    // ── estimate lines ───────────────────────────────────────────────────

    pub fn line(
        &self,
        key: &LineKey,
    ) -> Result<&EstimateLine, RecalculationError> {
        self.line_index
            .get(key)
            .map(|&position| &self.lines[position])
            .ok_or_else(|| RecalculationError::MissingLine(key.clone()))
    }

    pub fn lines(&self) -> &[EstimateLine] {
        &self.lines
    }

    /// Sum of `cost` over the lines matching `filter`; fails when nothing matches.
    pub fn sum_line_costs(
        &self,
        filter: &CostFilter,
    ) -> Result<Decimal, RecalculationError> {
        let mut matched = self.lines.iter().filter(|l| filter.matches(l)).peekable();
        if matched.peek().is_none() {
            return Err(RecalculationError::EmptyAggregate(filter.to_string()));
        }
        checked_sum(matched.map(|l| l.cost))
            .ok_or_else(|| RecalculationError::Overflow(filter.to_string()))
    }

    pub fn set_line(
        &mut self,
        key: &LineKey,
        values: LineValues,
    ) -> Result<(), RecalculationError> {
        let line = self.line_mut(key)?;
        line.value = values.value;
        line.unit_price = values.unit_price;
        line.cost = values.cost;
        self.touch(CellKey::Line(key.clone()));
        Ok(())
    }

    /// Overwrites only the cost column, as aggregate rows do.
    pub fn set_line_cost(
        &mut self,
        key: &LineKey,
        cost: Decimal,
    ) -> Result<(), RecalculationError> {
        self.line_mut(key)?.cost = cost;
        self.touch(CellKey::Line(key.clone()));
        Ok(())
    }

    fn line_mut(
        &mut self,
        key: &LineKey,
    ) -> Result<&mut EstimateLine, RecalculationError> {
        let position = *self
            .line_index
            .get(key)
            .ok_or_else(|| RecalculationError::MissingLine(key.clone()))?;
        Ok(&mut self.lines[position])
    }

    // ── recorded writes ──────────────────────────────────────────────────

    fn touch(&mut self, cell: CellKey) {
        if self.touched_set.insert(cell.clone()) {
            self.touched.push(cell);
        }
    }

    /// Every written cell with its final value, in first-write order.
    pub fn updates(&self) -> Vec<CellUpdate> {
        self.touched
            .iter()
            .filter_map(|cell| match cell {
                CellKey::Indicator(key) => {
                    self.indicator_index
                        .get(key)
                        .map(|&position| CellUpdate::Indicator {
                            key: key.clone(),
                            value: self.indicators[position].value,
                        })
                }
                CellKey::Line(key) => self.line_index.get(key).map(|&position| {
                    CellUpdate::Line {
                        key: key.clone(),
                        values: self.lines[position].values(),
                    }
                }),
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::catalog;
    use crate::models::LineKind;

    pub(crate) fn catalog_sheet() -> CostSheet {
        CostSheet::new(catalog::indicator_rows(), catalog::estimate_rows())
            .expect("catalog rows are unique")
    }

    fn land(serial: &str) -> IndicatorKey {
        IndicatorKey::new(Category::LandCompensation, serial)
    }

    #[test]
    fn duplicate_indicator_keys_are_rejected_at_load() {
        let mut indicators = catalog::indicator_rows();
        indicators.push(indicators[0].clone());

        let result = CostSheet::new(indicators, catalog::estimate_rows());

        assert_eq!(
            result.err(),
            Some(RecalculationError::DuplicateIndicator(land("1")))
        );
    }

    #[test]
    fn writes_are_visible_to_later_reads() {
        let mut sheet = catalog_sheet();

        sheet.set_indicator(&land("1.2"), dec!(12.5)).unwrap();

        assert_eq!(sheet.indicator(&land("1.2")), Ok(dec!(12.5)));
        assert_eq!(
            sheet.sum_indicators(Category::LandCompensation, "1."),
            Ok(dec!(12.5))
        );
    }

    #[test]
    fn average_divides_by_matched_row_count() {
        let mut sheet = catalog_sheet();
        for (serial, value) in [("2.1", dec!(4)), ("2.2", dec!(2)), ("2.3", dec!(3)), ("2.4", dec!(1))] {
            sheet.set_indicator(&land(serial), value).unwrap();
        }

        assert_eq!(
            sheet.average_indicators(Category::LandCompensation, "2."),
            Ok(dec!(2.5))
        );
    }

    #[test]
    fn empty_prefix_aggregate_is_an_error() {
        let sheet = catalog_sheet();

        let result = sheet.sum_indicators(Category::Contingency, "9.");

        assert!(matches!(result, Err(RecalculationError::EmptyAggregate(_))));
    }

    #[test]
    fn missing_line_is_a_lookup_error() {
        let mut sheet = catalog_sheet();
        let key = LineKey::new(Category::Demolition, "42");

        assert_eq!(
            sheet.set_line_cost(&key, dec!(1)),
            Err(RecalculationError::MissingLine(key))
        );
    }

    #[test]
    fn updates_are_deduplicated_in_first_write_order() {
        let mut sheet = catalog_sheet();
        let subtotal = LineKey::new(Category::Demolition, "6");

        sheet.set_line_cost(&subtotal, dec!(1)).unwrap();
        sheet.set_indicator(&land("1"), dec!(3)).unwrap();
        sheet.set_line_cost(&subtotal, dec!(2)).unwrap();

        let updates = sheet.updates();

        assert_eq!(updates.len(), 2);
        assert_eq!(
            updates[0],
            CellUpdate::Line {
                key: subtotal,
                values: LineValues {
                    value: dec!(0),
                    unit_price: dec!(0),
                    cost: dec!(2),
                },
            }
        );
        assert_eq!(
            updates[1],
            CellUpdate::Indicator {
                key: land("1"),
                value: dec!(3),
            }
        );
    }

    #[test]
    fn sum_line_costs_respects_kind() {
        let mut sheet = catalog_sheet();
        sheet
            .set_line_cost(&LineKey::new(Category::Resettlement, "2"), dec!(5))
            .unwrap();
        sheet
            .set_line_cost(&LineKey::new(Category::Resettlement, "1"), dec!(100))
            .unwrap();

        let items = CostFilter::category(Category::Resettlement).with_kind(LineKind::Item);

        assert_eq!(sheet.sum_line_costs(&items), Ok(dec!(5)));
    }

    #[test]
    fn resolve_edit_by_serial_name_and_id() {
        let sheet = catalog_sheet();
        let category = Category::LandCompensation;

        assert_eq!(
            sheet.resolve_edit(category, &EditTarget::Serial("1.3".to_string())),
            Ok(land("1.3"))
        );
        assert_eq!(
            sheet.resolve_edit(category, &EditTarget::Name("林地面积（亩）".to_string())),
            Ok(land("1.3"))
        );
        assert_eq!(sheet.resolve_edit(category, &EditTarget::Id(4)), Ok(land("1.3")));
    }

    #[test]
    fn resolve_edit_is_scoped_to_the_category() {
        let sheet = catalog_sheet();
        // id 1 is a category-1 row
        let result = sheet.resolve_edit(Category::Demolition, &EditTarget::Id(1));

        assert!(matches!(
            result,
            Err(RecalculationError::UnknownEditTarget { .. })
        ));
    }

    #[test]
    fn resolve_edit_rejects_ambiguous_names() {
        let mut indicators = catalog::indicator_rows();
        indicators[1].indicator_name = indicators[2].indicator_name.clone();
        let sheet = CostSheet::new(indicators, catalog::estimate_rows()).unwrap();

        let result = sheet.resolve_edit(
            Category::LandCompensation,
            &EditTarget::Name("园地面积（亩）".to_string()),
        );

        assert!(matches!(
            result,
            Err(RecalculationError::AmbiguousIndicatorName { .. })
        ));
    }
}
