//! P Trab entity - The header of a Plano de Trabalho.
//!
//! A plan names the operation, the unit that owns it and the period it covers.
//! Expense records hang off a plan; the plan itself carries no money.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// P Trab database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ptrabs")]
pub struct Model {
    /// Unique identifier for the plan
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Plan number, e.g. `"1/2025"`, or `"Minuta"` while drafting
    pub number: String,
    /// Name of the operation the plan funds
    pub operation_name: String,
    /// Organização Militar that owns the plan
    pub om_name: String,
    /// UG code of the owning OM
    pub om_ug: String,
    /// First day of the operation
    pub start_date: Date,
    /// Last day of the operation
    pub end_date: Date,
    /// When the plan was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between P Trab and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One plan has many expense records
    #[sea_orm(has_many = "super::expense_record::Entity")]
    ExpenseRecords,
}

impl Related<super::expense_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
