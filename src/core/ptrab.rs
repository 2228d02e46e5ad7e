//! P Trab business logic - Handles plan headers.
//!
//! Provides functions for creating and retrieving plans. Records are handled in
//! [`crate::core::record`].

use crate::{
    entities::{Ptrab, ptrab},
    errors::{Error, Result},
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::info;

/// Creates a new plan, performing input validation.
///
/// The operation name must not be blank and the period must not end before it
/// starts. Text fields are trimmed; a blank number becomes `"Minuta"`.
pub async fn create_ptrab(
    db: &DatabaseConnection,
    number: String,
    operation_name: String,
    om_name: String,
    om_ug: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<ptrab::Model> {
    if operation_name.trim().is_empty() {
        return Err(Error::Config {
            message: "Operation name cannot be empty".to_string(),
        });
    }

    if end_date < start_date {
        return Err(Error::Config {
            message: format!("Plan period ends ({end_date}) before it starts ({start_date})"),
        });
    }

    let number = match number.trim() {
        "" => "Minuta".to_string(),
        other => other.to_string(),
    };

    let plan = ptrab::ActiveModel {
        number: Set(number),
        operation_name: Set(operation_name.trim().to_string()),
        om_name: Set(om_name.trim().to_string()),
        om_ug: Set(om_ug.trim().to_string()),
        start_date: Set(start_date),
        end_date: Set(end_date),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = plan.insert(db).await?;
    info!(ptrab_id = result.id, operation = %result.operation_name, "P Trab created");
    Ok(result)
}

/// Finds a plan by its unique ID.
pub async fn get_ptrab_by_id(
    db: &DatabaseConnection,
    ptrab_id: i64,
) -> Result<Option<ptrab::Model>> {
    Ptrab::find_by_id(ptrab_id).one(db).await.map_err(Into::into)
}

/// Retrieves every plan, oldest first.
pub async fn get_all_ptrabs(db: &DatabaseConnection) -> Result<Vec<ptrab::Model>> {
    Ptrab::find()
        .order_by_asc(ptrab::Column::CreatedAt)
        .order_by_asc(ptrab::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Number of days the plan covers, both ends included.
#[must_use]
pub fn period_days(plan: &ptrab::Model) -> i64 {
    (plan.end_date - plan.start_date).num_days() + 1
}
