//! Shared test utilities for `PTrab Inteligente`.
//!
//! This module provides common helper functions for setting up test databases
//! and building plans and expense records with sensible defaults.

use crate::{
    core::{
        category::{
            ExpensePayload, FuelPayload, FuelType, ItemListPayload, LineItem, ProcurementRef,
            RationPayload, compute,
        },
        ptrab,
        record::{ExpenseRecord, NewExpenseRecord},
    },
    entities,
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates a test plan with sensible defaults.
///
/// # Defaults
/// * `number`: "Minuta"
/// * `om_name`: "1º Batalhão de Infantaria de Selva", UG "160001"
/// * period: 2025-03-01 to 2025-03-10
pub async fn create_test_ptrab(
    db: &DatabaseConnection,
    operation_name: &str,
) -> Result<entities::ptrab::Model> {
    ptrab::create_ptrab(
        db,
        "Minuta".to_string(),
        operation_name.to_string(),
        "1º Batalhão de Infantaria de Selva".to_string(),
        "160001".to_string(),
        date(2025, 3, 1),
        date(2025, 3, 10),
    )
    .await
}

/// Sets up a complete test environment with one plan.
/// Returns (db, ptrab) for common test scenarios.
pub async fn setup_with_ptrab() -> Result<(DatabaseConnection, entities::ptrab::Model)> {
    let db = setup_test_db().await?;
    let ptrab = create_test_ptrab(&db, "Operação Ágata").await?;
    Ok((db, ptrab))
}

/// Builds a date for tests; panics on an invalid date.
#[allow(clippy::expect_used)]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// Diesel payload used by most record tests: 2 vehicles, 100 km/day, 4 km/l, R$ 6,50/l.
pub fn diesel_payload() -> ExpensePayload {
    ExpensePayload::Fuel(FuelPayload {
        fuel_type: FuelType::Diesel,
        vehicles: 2,
        km_per_day: 100.0,
        km_per_liter: 4.0,
        price_per_liter: 6.5,
        procurement: Some(ProcurementRef {
            tender_number: "90001/2025".to_string(),
            uasg: "160001".to_string(),
        }),
    })
}

/// Ration payload with QS R$ 9,00 and QR R$ 6,00.
pub fn ration_payload() -> ExpensePayload {
    ExpensePayload::Ration(RationPayload {
        qs_unit_value: 9.0,
        qr_unit_value: 6.0,
        intermediate_meals: 0,
        procurement: None,
    })
}

/// Service payload with a single item.
pub fn service_payload(description: &str, quantity: f64, unit_value: f64) -> ExpensePayload {
    ExpensePayload::Service(ItemListPayload {
        items: vec![LineItem {
            description: description.to_string(),
            quantity,
            unit_value,
        }],
        procurement: None,
    })
}

/// Diesel payload of [`diesel_payload`] (500 l over 10 days) priced so that it
/// computes to `total`.
pub fn diesel_payload_totaling(total: f64) -> ExpensePayload {
    match diesel_payload() {
        ExpensePayload::Fuel(fuel) => ExpensePayload::Fuel(FuelPayload {
            price_per_liter: total / 500.0,
            ..fuel
        }),
        other => other,
    }
}

/// Builds a fuel record for saving, owned and held by the same OM.
///
/// # Defaults
/// * 10 days, 30 people, phase "Execução"
/// * diesel payload priced to compute to `total`
pub fn new_fuel_record(
    org: &str,
    ug: &str,
    total: f64,
    nd30: f64,
    nd39: f64,
) -> NewExpenseRecord {
    NewExpenseRecord {
        owning_org: org.to_string(),
        owning_ug: ug.to_string(),
        holding_org: org.to_string(),
        holding_ug: ug.to_string(),
        operation_days: 10,
        staffing: 30,
        activity_phase: "Execução".to_string(),
        payload: diesel_payload_totaling(total),
        total,
        nd30,
        nd39,
    }
}

/// Builds an in-memory record for engine tests whose money fields are what
/// `payload` computes to.
///
/// # Defaults
/// * holding OM equal to the owning OM
/// * phase "Execução"
/// * whole total on ND 30
pub fn record_with_payload(
    id: i64,
    org: &str,
    ug: &str,
    staffing: u32,
    days: u32,
    payload: ExpensePayload,
) -> ExpenseRecord {
    let total = compute(&payload, staffing, days).total();
    ExpenseRecord {
        id,
        owning_org: org.to_string(),
        owning_ug: ug.to_string(),
        holding_org: org.to_string(),
        holding_ug: ug.to_string(),
        operation_days: days,
        staffing,
        activity_phase: "Execução".to_string(),
        payload,
        total,
        nd30: total,
        nd39: 0.0,
        custom_narrative: None,
    }
}

/// Builds an in-memory record of 30 people totaling `total`, with a single
/// service item.
pub fn sample_record(id: i64, org: &str, ug: &str, days: u32, total: f64) -> ExpenseRecord {
    let payload = service_payload("Apoio logístico", 1.0, total);
    record_with_payload(id, org, ug, 30, days, payload)
}
