//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod expense_record;
pub mod ptrab;

// Re-export specific types to avoid conflicts
pub use expense_record::{
    Column as ExpenseRecordColumn, Entity as ExpenseRecord, Model as ExpenseRecordModel,
};
pub use ptrab::{Column as PtrabColumn, Entity as Ptrab, Model as PtrabModel};
