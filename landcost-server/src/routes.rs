//! Request handlers. Every JSON response uses the `{status, msg, data}` envelope.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use landcost_core::calculations::catalog::{grand_total_line, subtotal_line};
use landcost_core::{
    Category, CostFilter, EditTarget, EstimateLine, IndicatorEdit, IndicatorFilter,
    IndicatorInput, LineKind, RecalculationError, RecalculationReport, RecalculationRequest,
};
use landcost_data::EstimateExporter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;

pub const SUCCESS_STATUS: i32 = 0;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status: i32,
    pub msg: String,
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            status: SUCCESS_STATUS,
            msg: "success".to_string(),
            data,
        })
    }
}

type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

// Extractor rejections are turned into `ApiError` so they get the failure envelope.
type JsonBody<T> = Result<Json<T>, JsonRejection>;
type QueryParams<T> = Result<Query<T>, QueryRejection>;

#[derive(Debug, Default, Deserialize)]
pub struct CategoryQuery {
    pub category: Option<i32>,
}

impl CategoryQuery {
    fn category(&self) -> Result<Option<Category>, ApiError> {
        self.category
            .map(|id| Category::from_id(id).ok_or(RecalculationError::InvalidCategory(id)))
            .transpose()
            .map_err(ApiError::from)
    }
}

/// One estimate line under the column names the front-end renders.
#[derive(Debug, Clone, Serialize)]
pub struct LandCostItem {
    #[serde(rename = "序号")]
    pub serial_number: String,
    #[serde(rename = "项目名称")]
    pub project_name: String,
    #[serde(rename = "单位")]
    pub unit: String,
    #[serde(rename = "数量", with = "rust_decimal::serde::float")]
    pub value: Decimal,
    #[serde(rename = "单价（万元）", with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
    #[serde(rename = "成本（万元）", with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    pub line_kind: LineKind,
}

impl From<EstimateLine> for LandCostItem {
    fn from(line: EstimateLine) -> Self {
        Self {
            serial_number: line.serial_number,
            project_name: line.project_name,
            unit: line.unit,
            value: line.value,
            unit_price: line.unit_price,
            cost: line.cost,
            line_kind: line.kind,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LandCostList {
    pub items: Vec<LandCostItem>,
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn list_land_costs(
    State(state): State<AppState>,
    query: QueryParams<CategoryQuery>,
) -> ApiResult<LandCostList> {
    let Query(query) = query?;
    let category = query.category()?;
    let lines = state
        .service
        .repository()
        .list_estimate_lines(category)
        .await?;
    Ok(Envelope::ok(LandCostList {
        items: lines.into_iter().map(LandCostItem::from).collect(),
    }))
}

pub async fn export_land_costs(
    State(state): State<AppState>,
    query: QueryParams<CategoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let category = query.category()?;
    let mut body = Vec::new();
    let rows = EstimateExporter::export(state.service.repository(), category, &mut body).await?;

    let filename = match category {
        Some(category) => format!("land_cost_{}.csv", category.id()),
        None => "land_cost.csv".to_string(),
    };
    info!(rows, %filename, "Exported estimate lines");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct IndicatorQuery {
    pub category: Option<i32>,
    pub serial_prefix: Option<String>,
    pub name: Option<String>,
}

pub async fn list_indicators(
    State(state): State<AppState>,
    query: QueryParams<IndicatorQuery>,
) -> ApiResult<Vec<IndicatorInput>> {
    let Query(query) = query?;
    let category = CategoryQuery {
        category: query.category,
    }
    .category()?;
    let filter = match (query.serial_prefix, query.name) {
        (Some(_), Some(_)) => {
            return Err(ApiError::BadRequest(
                "serial_prefix and name cannot be combined".to_string(),
            ));
        }
        (Some(prefix), None) => IndicatorFilter::SerialPrefix(prefix),
        (None, Some(name)) => IndicatorFilter::Name(name),
        (None, None) => IndicatorFilter::All,
    };

    let indicators = state
        .service
        .repository()
        .list_indicators(category, &filter)
        .await?;
    Ok(Envelope::ok(indicators))
}

fn default_method() -> i32 {
    1
}

/// One edit as posted by the front-end. Exactly one target field must be set.
#[derive(Debug, Deserialize)]
pub struct EditBody {
    pub serial_number: Option<String>,
    pub indicator_name: Option<String>,
    pub id: Option<i64>,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
}

impl EditBody {
    fn into_edit(self) -> Result<IndicatorEdit, ApiError> {
        let target = match (self.serial_number, self.indicator_name, self.id) {
            (Some(serial), None, None) => EditTarget::Serial(serial),
            (None, Some(name), None) => EditTarget::Name(name),
            (None, None, Some(id)) => EditTarget::Id(id),
            _ => {
                return Err(ApiError::BadRequest(
                    "each edit needs exactly one of serial_number, indicator_name or id"
                        .to_string(),
                ));
            }
        };
        Ok(IndicatorEdit {
            target,
            value: self.value,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct BulkEditBody {
    pub category: i32,
    #[serde(default = "default_method")]
    pub computing_method: i32,
    pub edits: Vec<EditBody>,
}

pub async fn update_indicators(
    State(state): State<AppState>,
    body: JsonBody<BulkEditBody>,
) -> ApiResult<RecalculationReport> {
    let Json(body) = body?;
    let request = RecalculationRequest::parse(body.category, body.computing_method)?;
    let edits = body
        .edits
        .into_iter()
        .map(EditBody::into_edit)
        .collect::<Result<Vec<_>, _>>()?;

    let report = state.service.apply_edits(request, &edits).await?;
    Ok(Envelope::ok(report))
}

#[derive(Debug, Deserialize)]
pub struct RecalculateBody {
    pub category: i32,
    #[serde(default = "default_method")]
    pub computing_method: i32,
}

pub async fn recalculate(
    State(state): State<AppState>,
    body: JsonBody<RecalculateBody>,
) -> ApiResult<RecalculationReport> {
    let Json(body) = body?;
    let request = RecalculationRequest::parse(body.category, body.computing_method)?;
    let report = state.service.recalculate(request).await?;
    Ok(Envelope::ok(report))
}

#[derive(Debug, Serialize)]
pub struct CategorySummary {
    pub category: Category,
    pub label: &'static str,
    /// Sum of the category's item lines.
    #[serde(with = "rust_decimal::serde::float")]
    pub item_cost: Decimal,
    /// The stored subtotal line.
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub categories: Vec<CategorySummary>,
    #[serde(with = "rust_decimal::serde::float")]
    pub grand_total: Decimal,
}

pub async fn summary(State(state): State<AppState>) -> ApiResult<Summary> {
    let repo = state.service.repository();

    let mut categories = Vec::with_capacity(Category::ALL.len());
    for category in Category::ALL {
        let item_cost = repo
            .sum_estimate_cost(&CostFilter::category(category).with_kind(LineKind::Item))
            .await?;
        let subtotal = repo.get_estimate_line(&subtotal_line(category)).await?.cost;
        categories.push(CategorySummary {
            category,
            label: category.label(),
            item_cost,
            subtotal,
        });
    }
    let grand_total = repo.get_estimate_line(&grand_total_line()).await?.cost;

    Ok(Envelope::ok(Summary {
        categories,
        grand_total,
    }))
}
