//! Expense record entity - One saved cost line of a plan.
//!
//! Records are stored flat. Grouping into consolidated blocks happens at read
//! time, so two records with the same `owning_org`, `owning_ug`, `holding_org`,
//! `holding_ug`, `operation_days`, `staffing` and `activity_phase` are still two
//! rows here. The category-specific inputs live in `payload` as JSON.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Expense record database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "expense_records")]
pub struct Model {
    /// Unique identifier for the record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Plan this record belongs to
    pub ptrab_id: i64,
    /// Category tag, e.g. `"genero"` or `"combustivel"`
    pub category: String,
    /// Name of the OM the expense is for
    pub owning_org: String,
    /// UG code of the OM the expense is for
    pub owning_ug: String,
    /// Name of the OM holding the budget
    pub holding_org: String,
    /// UG code of the OM holding the budget
    pub holding_ug: String,
    /// Days of operation
    pub operation_days: i32,
    /// Number of people
    pub staffing: i32,
    /// Activity phase label, e.g. `"Execução"`
    pub activity_phase: String,
    /// Category inputs as JSON
    #[sea_orm(column_type = "Text")]
    pub payload: String,
    /// Total of the line
    pub total: f64,
    /// ND 33.90.30 portion
    pub nd30: f64,
    /// ND 33.90.39 portion
    pub nd39: f64,
    /// User-written memória de cálculo replacing the generated one
    #[sea_orm(column_type = "Text", nullable)]
    pub custom_narrative: Option<String>,
    /// When the record was created
    pub created_at: DateTimeUtc,
    /// When the record was last changed
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between expense records and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each record belongs to one plan
    #[sea_orm(
        belongs_to = "super::ptrab::Entity",
        from = "Column::PtrabId",
        to = "super::ptrab::Column::Id"
    )]
    Ptrab,
}

impl Related<super::ptrab::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ptrab.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
