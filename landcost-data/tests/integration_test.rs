//! Integration tests for indicator loading and estimate export.

use std::path::Path;
use std::sync::Arc;

use landcost_core::calculations::round_half_up;
use landcost_core::db::MemoryRepository;
use landcost_core::{
    Category, ComputingMethod, CostRepository, CostService, LineKey, RecalculationError,
};
use landcost_data::{EstimateExporter, IndicatorLoader, IndicatorLoaderError};
use landcost_db_sqlite::SqliteRepository;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

const SAMPLE_CSV: &str = include_str!("../test-data/indicators_sample.csv");

async fn setup_sqlite() -> SqliteRepository {
    let repo = SqliteRepository::new(":memory:")
        .await
        .expect("Failed to create in-memory database");
    repo.run_migrations()
        .await
        .expect("Failed to run migrations");
    repo.run_seeds(&Path::new(env!("CARGO_MANIFEST_DIR")).join("../landcost-db-sqlite/seeds"))
        .await
        .expect("Failed to run seeds");
    repo
}

#[tokio::test]
async fn test_load_sample_recalculates_every_category() {
    let service = CostService::new(Arc::new(MemoryRepository::seeded()));
    let records = IndicatorLoader::parse(SAMPLE_CSV.as_bytes()).expect("Failed to parse CSV");

    let reports = IndicatorLoader::load(&service, &records, ComputingMethod::Direct)
        .await
        .expect("Failed to load indicators");

    let subtotals: Vec<_> = reports.iter().map(|r| (r.category, r.subtotal)).collect();
    assert_eq!(
        subtotals,
        vec![
            (Category::LandCompensation, dec!(1098.000000000006)),
            (Category::Demolition, dec!(736.6)),
            (Category::Resettlement, dec!(5330)),
            (Category::Contingency, dec!(358.2300000000003)),
        ]
    );
    assert_eq!(
        reports.last().map(|r| round_half_up(r.grand_total)),
        Some(dec!(7522.83))
    );
}

#[tokio::test]
async fn test_load_sample_with_itemized_method() {
    let service = CostService::new(Arc::new(MemoryRepository::seeded()));
    let records = IndicatorLoader::parse(SAMPLE_CSV.as_bytes()).expect("Failed to parse CSV");

    IndicatorLoader::load(&service, &records, ComputingMethod::Itemized)
        .await
        .expect("Failed to load indicators");

    let line = service
        .repository()
        .get_estimate_line(&LineKey::new(Category::LandCompensation, "1"))
        .await
        .unwrap();
    assert_eq!(line.value, dec!(120));
    assert_eq!(line.unit_price, dec!(5));
    assert_eq!(line.cost, dec!(760));
}

#[tokio::test]
async fn test_load_into_sqlite_and_export() {
    let service = CostService::new(Arc::new(setup_sqlite().await));
    let records = IndicatorLoader::parse(SAMPLE_CSV.as_bytes()).expect("Failed to parse CSV");
    IndicatorLoader::load(&service, &records, ComputingMethod::Direct)
        .await
        .expect("Failed to load indicators");

    let mut out = Vec::new();
    let written = EstimateExporter::export(service.repository(), Some(Category::Demolition), &mut out)
        .await
        .expect("Failed to export");

    assert_eq!(written, 6);
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines[0], "序号,项目名称,单位,数量,单价（万元）,成本（万元）");
    assert_eq!(lines[1], "1,砖混结构房屋补偿费,平方米,1500,0.32,480");
    assert_eq!(lines[6], "6,拆迁补偿费小计,万元,0,0,736.6");
}

#[tokio::test]
async fn test_unknown_name_aborts_that_category() {
    let service = CostService::new(Arc::new(MemoryRepository::seeded()));
    let csv = "category,serial_number,indicator_name,value\n2,,不存在的指标,5\n";
    let records = IndicatorLoader::parse(csv.as_bytes()).unwrap();

    let result = IndicatorLoader::load(&service, &records, ComputingMethod::Direct).await;

    assert!(matches!(
        result,
        Err(IndicatorLoaderError::Recalculation {
            category: Category::Demolition,
            source: RecalculationError::UnknownEditTarget { .. },
        })
    ));
    let subtotal = service
        .repository()
        .sum_estimate_cost(&landcost_core::CostFilter::category(Category::Demolition))
        .await
        .unwrap();
    assert_eq!(subtotal, dec!(0));
}
