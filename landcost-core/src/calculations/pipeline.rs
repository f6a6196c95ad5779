//! Ordered pipeline of named worksheet steps.
//!
//! Each [`Step`] declares what it reads and which cells it writes. A
//! [`Pipeline`] refuses to be built when a step reads something that a later
//! step writes, so a formula can never observe a value that is about to be
//! recomputed in the same pass.

use std::fmt;

use tracing::debug;

use super::RecalculationError;
use super::sheet::{CellKey, CostSheet};
use crate::models::{Category, CostFilter};

/// Something a step reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    /// One exact cell. Must exist in the sheet before the pipeline runs.
    Cell(CellKey),
    /// Every indicator of `category` whose serial starts with `prefix`.
    Indicators { category: Category, prefix: String },
    /// Every estimate line selected by the filter.
    Lines(CostFilter),
}

impl Dependency {
    pub fn indicator(
        category: Category,
        serial: &str,
    ) -> Self {
        Self::Cell(CellKey::indicator(category, serial))
    }

    pub fn line(
        category: Category,
        serial: &str,
    ) -> Self {
        Self::Cell(CellKey::line(category, serial))
    }

    pub fn indicators(
        category: Category,
        prefix: &str,
    ) -> Self {
        Self::Indicators {
            category,
            prefix: prefix.to_string(),
        }
    }

    /// Whether writing `cell` could change what this dependency reads.
    ///
    /// Line kinds are not part of a cell key, so a `Lines` filter is matched on
    /// category and prefix only.
    pub fn covers(
        &self,
        cell: &CellKey,
    ) -> bool {
        match (self, cell) {
            (Self::Cell(own), _) => own == cell,
            (Self::Indicators { category, prefix }, CellKey::Indicator(key)) => {
                key.category == *category && key.serial_number.starts_with(prefix.as_str())
            }
            (Self::Lines(filter), CellKey::Line(key)) => {
                filter.category.is_none_or(|c| c == key.category)
                    && filter
                        .serial_prefix
                        .as_deref()
                        .is_none_or(|p| key.serial_number.starts_with(p))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cell(cell) => cell.fmt(f),
            Self::Indicators { category, prefix } => {
                write!(f, "indicators[category={category}, prefix={prefix}]")
            }
            Self::Lines(filter) => filter.fmt(f),
        }
    }
}

type StepFn = Box<dyn Fn(&mut CostSheet) -> Result<(), RecalculationError> + Send + Sync>;

pub struct Step {
    name: String,
    reads: Vec<Dependency>,
    writes: Vec<CellKey>,
    run: StepFn,
}

impl Step {
    pub fn new(
        name: impl Into<String>,
        reads: Vec<Dependency>,
        writes: Vec<CellKey>,
        run: impl Fn(&mut CostSheet) -> Result<(), RecalculationError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            reads,
            writes,
            run: Box::new(run),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn reads(&self) -> &[Dependency] {
        &self.reads
    }

    pub fn writes(&self) -> &[CellKey] {
        &self.writes
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("reads", &self.reads)
            .field("writes", &self.writes)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct Pipeline {
    steps: Vec<Step>,
}

impl Pipeline {
    /// Builds a pipeline, checking that no step reads a cell written by a
    /// step after it.
    pub fn new(steps: Vec<Step>) -> Result<Self, RecalculationError> {
        for (position, step) in steps.iter().enumerate() {
            for later in &steps[position + 1..] {
                for cell in &later.writes {
                    if let Some(read) = step.reads.iter().find(|dep| dep.covers(cell)) {
                        return Err(RecalculationError::StepOrder {
                            step: step.name.clone(),
                            cell: match read {
                                Dependency::Cell(_) => cell.to_string(),
                                _ => format!("{cell} (via {read})"),
                            },
                            writer: later.name.clone(),
                        });
                    }
                }
            }
        }
        Ok(Self { steps })
    }

    /// Checks every exact cell the pipeline names against `sheet`.
    pub fn validate_against(
        &self,
        sheet: &CostSheet,
    ) -> Result<(), RecalculationError> {
        let exact_reads = self.steps.iter().flat_map(|s| {
            s.reads.iter().filter_map(|dep| match dep {
                Dependency::Cell(cell) => Some(cell),
                _ => None,
            })
        });
        let writes = self.steps.iter().flat_map(|s| s.writes.iter());

        match exact_reads.chain(writes).find(|cell| !sheet.contains(cell)) {
            Some(CellKey::Indicator(key)) => Err(RecalculationError::MissingIndicator(key.clone())),
            Some(CellKey::Line(key)) => Err(RecalculationError::MissingLine(key.clone())),
            None => Ok(()),
        }
    }

    /// Runs every step in order, stopping at the first failure.
    pub fn run(
        &self,
        sheet: &mut CostSheet,
    ) -> Result<Vec<String>, RecalculationError> {
        let mut executed = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            debug!(step = %step.name, "Running worksheet step");
            (step.run)(sheet)?;
            executed.push(step.name.clone());
        }
        Ok(executed)
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(Step::name).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::calculations::sheet::tests::catalog_sheet;
    use crate::models::IndicatorKey;

    const CAT: Category = Category::Demolition;

    fn copy_step(name: &str, from: &str, to: &str) -> Step {
        let source = IndicatorKey::new(CAT, from);
        let target = IndicatorKey::new(CAT, to);
        Step::new(
            name,
            vec![Dependency::indicator(CAT, from)],
            vec![CellKey::indicator(CAT, to)],
            move |sheet| {
                let value = sheet.indicator(&source)?;
                sheet.set_indicator(&target, value + dec!(1))
            },
        )
    }

    #[test]
    fn steps_run_in_declared_order() {
        let pipeline = Pipeline::new(vec![
            copy_step("first", "1.1", "1.2"),
            copy_step("second", "1.2", "1.3"),
        ])
        .unwrap();
        let mut sheet = catalog_sheet();

        let executed = pipeline.run(&mut sheet).unwrap();

        assert_eq!(executed, vec!["first", "second"]);
        assert_eq!(sheet.indicator(&IndicatorKey::new(CAT, "1.3")), Ok(dec!(2)));
    }

    #[test]
    fn reading_a_cell_written_later_is_rejected() {
        let result = Pipeline::new(vec![
            copy_step("consumer", "1.2", "1.3"),
            copy_step("producer", "1.1", "1.2"),
        ]);

        assert_eq!(
            result.err(),
            Some(RecalculationError::StepOrder {
                step: "consumer".to_string(),
                cell: "indicator 2/1.2".to_string(),
                writer: "producer".to_string(),
            })
        );
    }

    #[test]
    fn prefix_reads_are_checked_against_later_writes() {
        let sum = Step::new(
            "sum",
            vec![Dependency::indicators(CAT, "1.")],
            vec![CellKey::indicator(CAT, "1")],
            |_| Ok(()),
        );

        let result = Pipeline::new(vec![sum, copy_step("late", "2.1", "1.4")]);

        assert!(matches!(
            result,
            Err(RecalculationError::StepOrder { ref writer, .. }) if writer == "late"
        ));
    }

    #[test]
    fn line_filters_cover_by_category_and_prefix() {
        let dep = Dependency::Lines(CostFilter::category(Category::Resettlement).with_prefix("6."));

        assert!(dep.covers(&CellKey::line(Category::Resettlement, "6.2")));
        assert!(!dep.covers(&CellKey::line(Category::Resettlement, "6")));
        assert!(!dep.covers(&CellKey::line(Category::Demolition, "6.1")));
        assert!(!dep.covers(&CellKey::indicator(Category::Resettlement, "6.1")));
    }

    #[test]
    fn missing_cells_are_reported_before_any_step_runs() {
        let pipeline = Pipeline::new(vec![copy_step("ghost", "9.9", "1.1")]).unwrap();
        let sheet = catalog_sheet();

        assert_eq!(
            pipeline.validate_against(&sheet),
            Err(RecalculationError::MissingIndicator(IndicatorKey::new(CAT, "9.9")))
        );
    }

    #[test]
    fn a_failing_step_stops_the_pipeline() {
        let failing = Step::new("failing", Vec::new(), Vec::new(), |sheet| {
            sheet.sum_indicators(CAT, "7.").map(|_| ())
        });
        let pipeline = Pipeline::new(vec![failing, copy_step("never", "1.1", "1.2")]).unwrap();
        let mut sheet = catalog_sheet();

        let result = pipeline.run(&mut sheet);

        assert!(matches!(result, Err(RecalculationError::EmptyAggregate(_))));
        assert!(sheet.updates().is_empty());
    }
}
