//! Expense record business logic - domain type and persistence.
//!
//! Records are created and edited through forms that keep their ND split
//! consistent with [`NdAllocation`]; the functions here are the save side of
//! those forms. A record whose ND 30 + ND 39 does not match its total is
//! rejected with [`Error::AllocationMismatch`] rather than stored, and one
//! whose total is not what its payload computes to with
//! [`Error::TotalMismatch`].

use crate::{
    core::{
        allocation::{ManualField, NdAllocation},
        category::{CategoryKind, ExpensePayload, compute},
        consolidation::GroupingKey,
        money::{approx_eq, round2},
    },
    entities::{Ptrab, expense_record},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// An expense record as the engines see it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseRecord {
    /// Opaque id
    pub id: i64,
    /// Name of the OM the expense is for
    pub owning_org: String,
    /// UG code of the OM the expense is for
    pub owning_ug: String,
    /// Name of the OM holding the budget
    pub holding_org: String,
    /// UG code of the OM holding the budget
    pub holding_ug: String,
    /// Days of operation
    pub operation_days: u32,
    /// Number of people
    pub staffing: u32,
    /// Activity phase label
    pub activity_phase: String,
    /// Category inputs
    pub payload: ExpensePayload,
    /// Total of the line
    pub total: f64,
    /// ND 33.90.30 portion
    pub nd30: f64,
    /// ND 33.90.39 portion
    pub nd39: f64,
    /// User-written memória replacing the generated one
    pub custom_narrative: Option<String>,
}

impl ExpenseRecord {
    /// Category of the record.
    #[must_use]
    pub const fn category(&self) -> CategoryKind {
        self.payload.kind()
    }

    /// Composite key this record consolidates under.
    #[must_use]
    pub fn grouping_key(&self) -> GroupingKey {
        GroupingKey {
            owning_org: self.owning_org.clone(),
            owning_ug: self.owning_ug.clone(),
            holding_org: self.holding_org.clone(),
            holding_ug: self.holding_ug.clone(),
            operation_days: self.operation_days,
            staffing: self.staffing,
            activity_phase: self.activity_phase.clone(),
        }
    }

    /// Allocation state for an edit form whose manual field is `manual`.
    #[must_use]
    pub fn allocation(&self, manual: ManualField) -> NdAllocation {
        NdAllocation::from_parts(manual, self.total, self.nd30, self.nd39)
    }

    /// The user override, if it has any content.
    #[must_use]
    pub fn custom_narrative(&self) -> Option<&str> {
        self.custom_narrative
            .as_deref()
            .filter(|text| !text.trim().is_empty())
    }
}

impl TryFrom<expense_record::Model> for ExpenseRecord {
    type Error = Error;

    fn try_from(model: expense_record::Model) -> Result<Self> {
        let payload = ExpensePayload::from_stored(&model.category, &model.payload)?;
        Ok(Self {
            id: model.id,
            owning_org: model.owning_org,
            owning_ug: model.owning_ug,
            holding_org: model.holding_org,
            holding_ug: model.holding_ug,
            operation_days: u32::try_from(model.operation_days)?,
            staffing: u32::try_from(model.staffing)?,
            activity_phase: model.activity_phase,
            payload,
            total: model.total,
            nd30: model.nd30,
            nd39: model.nd39,
            custom_narrative: model.custom_narrative,
        })
    }
}

/// Values a form submits when saving a record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpenseRecord {
    /// Name of the OM the expense is for
    pub owning_org: String,
    /// UG code of the OM the expense is for
    pub owning_ug: String,
    /// Name of the OM holding the budget
    pub holding_org: String,
    /// UG code of the OM holding the budget
    pub holding_ug: String,
    /// Days of operation
    pub operation_days: u32,
    /// Number of people
    pub staffing: u32,
    /// Activity phase label
    pub activity_phase: String,
    /// Category inputs
    pub payload: ExpensePayload,
    /// Total of the line
    pub total: f64,
    /// ND 33.90.30 portion
    pub nd30: f64,
    /// ND 33.90.39 portion
    pub nd39: f64,
}

impl NewExpenseRecord {
    /// Takes the money fields from a form's allocation state.
    #[must_use]
    pub fn with_allocation(mut self, allocation: &NdAllocation) -> Self {
        self.total = allocation.total();
        self.nd30 = allocation.nd30();
        self.nd39 = allocation.nd39();
        self
    }
}

/// Checks the money fields of a record before it is written.
///
/// Amounts must be finite and non-negative, the ND split must match the
/// total within one centavo, and the total must match what the payload
/// computes to for the record's staffing and days, so the memória and the
/// money fields never disagree.
pub fn validate_new_record(record: &NewExpenseRecord) -> Result<()> {
    for amount in [record.total, record.nd30, record.nd39] {
        if !amount.is_finite() || amount < 0.0 {
            return Err(Error::InvalidAmount { amount });
        }
    }

    let allocation =
        NdAllocation::from_parts(ManualField::Nd30, record.total, record.nd30, record.nd39);
    if !allocation.is_allocation_correct() {
        return Err(Error::AllocationMismatch {
            total: record.total,
            nd30: record.nd30,
            nd39: record.nd39,
        });
    }

    let computed = compute(&record.payload, record.staffing, record.operation_days).total();
    if !approx_eq(record.total, computed) {
        return Err(Error::TotalMismatch {
            total: record.total,
            computed,
        });
    }

    Ok(())
}

fn days_and_staffing(record: &NewExpenseRecord) -> Result<(i32, i32)> {
    Ok((
        i32::try_from(record.operation_days)?,
        i32::try_from(record.staffing)?,
    ))
}

/// Saves a new record under an existing plan.
pub async fn create_record(
    db: &DatabaseConnection,
    ptrab_id: i64,
    record: NewExpenseRecord,
) -> Result<ExpenseRecord> {
    validate_new_record(&record)?;
    let (operation_days, staffing) = days_and_staffing(&record)?;
    let payload = record.payload.to_json()?;

    let txn = db.begin().await?;

    Ptrab::find_by_id(ptrab_id)
        .one(&txn)
        .await?
        .ok_or(Error::PtrabNotFound { id: ptrab_id })?;

    let now = chrono::Utc::now();
    let model = expense_record::ActiveModel {
        ptrab_id: Set(ptrab_id),
        category: Set(record.payload.kind().tag().to_string()),
        owning_org: Set(record.owning_org.trim().to_string()),
        owning_ug: Set(record.owning_ug.trim().to_string()),
        holding_org: Set(record.holding_org.trim().to_string()),
        holding_ug: Set(record.holding_ug.trim().to_string()),
        operation_days: Set(operation_days),
        staffing: Set(staffing),
        activity_phase: Set(record.activity_phase.trim().to_string()),
        payload: Set(payload),
        total: Set(round2(record.total)),
        nd30: Set(round2(record.nd30)),
        nd39: Set(round2(record.nd39)),
        custom_narrative: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let inserted = model.insert(&txn).await?;
    txn.commit().await?;

    info!(
        ptrab_id,
        record_id = inserted.id,
        category = %inserted.category,
        total = inserted.total,
        "expense record created"
    );
    inserted.try_into()
}

/// Replaces the values of a record, keeping its custom narrative.
pub async fn update_record_values(
    db: &DatabaseConnection,
    record_id: i64,
    record: NewExpenseRecord,
) -> Result<ExpenseRecord> {
    validate_new_record(&record)?;
    let (operation_days, staffing) = days_and_staffing(&record)?;
    let payload = record.payload.to_json()?;

    let txn = db.begin().await?;

    let existing = expense_record::Entity::find_by_id(record_id)
        .one(&txn)
        .await?
        .ok_or(Error::RecordNotFound { id: record_id })?;

    let mut model: expense_record::ActiveModel = existing.into();
    model.category = Set(record.payload.kind().tag().to_string());
    model.owning_org = Set(record.owning_org.trim().to_string());
    model.owning_ug = Set(record.owning_ug.trim().to_string());
    model.holding_org = Set(record.holding_org.trim().to_string());
    model.holding_ug = Set(record.holding_ug.trim().to_string());
    model.operation_days = Set(operation_days);
    model.staffing = Set(staffing);
    model.activity_phase = Set(record.activity_phase.trim().to_string());
    model.payload = Set(payload);
    model.total = Set(round2(record.total));
    model.nd30 = Set(round2(record.nd30));
    model.nd39 = Set(round2(record.nd39));
    model.updated_at = Set(chrono::Utc::now());

    let updated = model.update(&txn).await?;
    txn.commit().await?;

    debug!(record_id, "expense record updated");
    updated.try_into()
}

/// Finds a record by id.
pub async fn get_record_by_id(
    db: &DatabaseConnection,
    record_id: i64,
) -> Result<Option<ExpenseRecord>> {
    expense_record::Entity::find_by_id(record_id)
        .one(db)
        .await?
        .map(ExpenseRecord::try_from)
        .transpose()
}

/// Loads every record of a plan in insertion order.
pub async fn get_records_for_ptrab(
    db: &DatabaseConnection,
    ptrab_id: i64,
) -> Result<Vec<ExpenseRecord>> {
    expense_record::Entity::find()
        .filter(expense_record::Column::PtrabId.eq(ptrab_id))
        .order_by_asc(expense_record::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(ExpenseRecord::try_from)
        .collect()
}

/// Deletes a record.
pub async fn delete_record(db: &DatabaseConnection, record_id: i64) -> Result<()> {
    let result = expense_record::Entity::delete_by_id(record_id)
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::RecordNotFound { id: record_id });
    }
    info!(record_id, "expense record deleted");
    Ok(())
}

/// Stores a user-written memória de cálculo for a record.
///
/// Blank text is the same as restoring the automatic narrative.
pub async fn save_custom_narrative(
    db: &DatabaseConnection,
    record_id: i64,
    text: &str,
) -> Result<ExpenseRecord> {
    let text = text.trim();
    let value = if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    };
    set_custom_narrative(db, record_id, value).await
}

/// Clears the user override so the memória is generated from current data again.
pub async fn restore_automatic_narrative(
    db: &DatabaseConnection,
    record_id: i64,
) -> Result<ExpenseRecord> {
    set_custom_narrative(db, record_id, None).await
}

async fn set_custom_narrative(
    db: &DatabaseConnection,
    record_id: i64,
    value: Option<String>,
) -> Result<ExpenseRecord> {
    let txn = db.begin().await?;

    let existing = expense_record::Entity::find_by_id(record_id)
        .one(&txn)
        .await?
        .ok_or(Error::RecordNotFound { id: record_id })?;

    let restoring = value.is_none();
    let mut model: expense_record::ActiveModel = existing.into();
    model.custom_narrative = Set(value);
    model.updated_at = Set(chrono::Utc::now());
    let updated = model.update(&txn).await?;

    txn.commit().await?;

    if restoring {
        info!(record_id, "custom narrative cleared");
    } else {
        info!(record_id, "custom narrative saved");
    }
    updated.try_into()
}
