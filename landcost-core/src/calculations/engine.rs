//! The recalculation entry point.
//!
//! A recalculation loads a fresh [`CostSheet`] from the store, runs the
//! requested category's worksheet followed by the grand total, and commits
//! every write in one [`CostRepository::apply_updates`] batch. Nothing is
//! written unless every step succeeded.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use super::RecalculationError;
use super::catalog::{grand_total_line, subtotal_line};
use super::pipeline::Pipeline;
use super::sheet::CostSheet;
use super::worksheets::{category_steps, contingency::grand_total_step};
use crate::db::CostRepository;
use crate::models::{Category, CellUpdate, ComputingMethod, IndicatorEdit, IndicatorFilter};

/// A validated recalculation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecalculationRequest {
    pub category: Category,
    pub method: ComputingMethod,
}

impl RecalculationRequest {
    pub fn new(
        category: Category,
        method: ComputingMethod,
    ) -> Self {
        Self { category, method }
    }

    /// Validates raw identifiers as received from a caller.
    ///
    /// Category 1 requires method 1 or 2. Every other category ignores the
    /// method, whatever its value.
    pub fn parse(
        category: i32,
        method: i32,
    ) -> Result<Self, RecalculationError> {
        let category =
            Category::from_id(category).ok_or(RecalculationError::InvalidCategory(category))?;
        let method = match category {
            Category::LandCompensation => ComputingMethod::from_id(method)
                .ok_or(RecalculationError::InvalidComputingMethod(method))?,
            _ => ComputingMethod::default(),
        };
        Ok(Self { category, method })
    }

    /// The category's worksheet steps followed by the grand total.
    pub fn pipeline(&self) -> Result<Pipeline, RecalculationError> {
        let mut steps = category_steps(self.category, self.method);
        steps.push(grand_total_step());
        Pipeline::new(steps)
    }

    fn reported_method(&self) -> Option<ComputingMethod> {
        (self.category == Category::LandCompensation).then_some(self.method)
    }
}

/// Outcome of a committed recalculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecalculationReport {
    pub category: Category,
    pub method: Option<ComputingMethod>,
    pub steps: Vec<String>,
    pub updates: Vec<CellUpdate>,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub grand_total: Decimal,
    pub completed_at: DateTime<Utc>,
}

pub struct Recalculator<'a> {
    repo: &'a dyn CostRepository,
}

impl<'a> Recalculator<'a> {
    pub fn new(repo: &'a dyn CostRepository) -> Self {
        Self { repo }
    }

    /// Reads both tables in full. Never cached between calls.
    pub async fn load_sheet(&self) -> Result<CostSheet, RecalculationError> {
        let indicators = self
            .repo
            .list_indicators(None, &IndicatorFilter::All)
            .await?;
        let lines = self.repo.list_estimate_lines(None).await?;
        CostSheet::new(indicators, lines)
    }

    /// Runs `request` against `sheet` without touching the store.
    ///
    /// Every exact key the pipeline names is checked before the first step,
    /// so a missing row fails the call with the sheet unchanged.
    pub fn evaluate(
        request: &RecalculationRequest,
        sheet: &mut CostSheet,
    ) -> Result<Vec<String>, RecalculationError> {
        let pipeline = request.pipeline()?;
        pipeline.validate_against(sheet)?;
        pipeline.run(sheet)
    }

    pub async fn recalculate(
        &self,
        request: RecalculationRequest,
    ) -> Result<RecalculationReport, RecalculationError> {
        self.recalculate_with_edits(request, &[]).await
    }

    /// Stages `edits` into the request's category, recalculates, and commits
    /// the edits together with the recalculated values.
    ///
    /// Failures are returned, not logged; the caller decides how to report them.
    pub async fn recalculate_with_edits(
        &self,
        request: RecalculationRequest,
        edits: &[IndicatorEdit],
    ) -> Result<RecalculationReport, RecalculationError> {
        let mut sheet = self.load_sheet().await?;

        let pipeline = request.pipeline()?;
        pipeline.validate_against(&sheet)?;

        for edit in edits {
            let key = sheet.resolve_edit(request.category, &edit.target)?;
            sheet.set_indicator(&key, edit.value)?;
        }

        let steps = pipeline.run(&mut sheet)?;
        let updates = sheet.updates();
        self.repo.apply_updates(&updates).await?;

        let subtotal = sheet.line(&subtotal_line(request.category))?.cost;
        let grand_total = sheet.line(&grand_total_line())?.cost;

        info!(
            category = %request.category,
            edits = edits.len(),
            updates = updates.len(),
            %subtotal,
            %grand_total,
            "Recalculation committed"
        );

        Ok(RecalculationReport {
            category: request.category,
            method: request.reported_method(),
            steps,
            updates,
            subtotal,
            grand_total,
            completed_at: Utc::now(),
        })
    }
}
