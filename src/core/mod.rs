//! Core business logic - framework-agnostic plan, record and reporting operations.
//!
//! The allocation, category, consolidation and narrative modules are pure
//! engines. The `ptrab`, `record` and `report` modules are the async
//! persistence side over a `SeaORM` connection.

/// ND 30 / ND 39 split kept consistent with the total while a form is edited
pub mod allocation;
/// Expense categories, their payloads and calculations
pub mod category;
/// Grouping of records that share a composite key
pub mod consolidation;
/// Decimal rounding and Brazilian currency formatting
pub mod money;
/// Memória de cálculo text generation
pub mod narrative;
/// Plan header persistence
pub mod ptrab;
/// Expense record domain type and persistence
pub mod record;
/// Plan reports
pub mod report;
