//! Report generation business logic.
//!
//! This module loads a plan's records, consolidates them per category and
//! totals them per ND. [`build_report`] is pure; [`generate_ptrab_report`]
//! is the database-backed entry point and [`render_report`] produces the
//! plain-text document.

use crate::{
    core::{
        category::CategoryKind,
        consolidation::{ConsolidatedGroup, consolidate},
        money::{format_brl, to_decimal, to_f64},
        ptrab::get_ptrab_by_id,
        record::{ExpenseRecord, get_records_for_ptrab},
    },
    entities::ptrab,
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::fmt::Write as _;
use tracing::{debug, info};

/// Consolidated groups of one category with their sums.
#[derive(Debug, Clone, PartialEq)]
pub struct CategorySection {
    /// Category of every record in the section
    pub kind: CategoryKind,
    /// Groups in report order
    pub groups: Vec<ConsolidatedGroup>,
    /// Sum of the group totals
    pub total: f64,
    /// Sum of the group ND 33.90.30 portions
    pub nd30: f64,
    /// Sum of the group ND 33.90.39 portions
    pub nd39: f64,
}

/// A complete plan report, ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct PtrabReport {
    /// The plan header
    pub ptrab: ptrab::Model,
    /// One section per category that has records
    pub sections: Vec<CategorySection>,
    /// Grand total
    pub total: f64,
    /// Grand total of ND 33.90.30
    pub nd30: f64,
    /// Grand total of ND 33.90.39
    pub nd39: f64,
}

impl PtrabReport {
    /// Number of records covered by the report.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|section| &section.groups)
            .map(|group| group.records.len())
            .sum()
    }
}

#[derive(Default)]
struct Sums {
    total: Decimal,
    nd30: Decimal,
    nd39: Decimal,
}

impl Sums {
    fn add(&mut self, total: f64, nd30: f64, nd39: f64) {
        self.total = self.total.saturating_add(to_decimal(total));
        self.nd30 = self.nd30.saturating_add(to_decimal(nd30));
        self.nd39 = self.nd39.saturating_add(to_decimal(nd39));
    }

    fn merge(&mut self, other: &Self) {
        self.total = self.total.saturating_add(other.total);
        self.nd30 = self.nd30.saturating_add(other.nd30);
        self.nd39 = self.nd39.saturating_add(other.nd39);
    }
}

/// Builds the report for `ptrab` from its records.
///
/// Sections follow [`CategoryKind::ALL`]; categories without records are left out.
#[must_use]
pub fn build_report(ptrab: ptrab::Model, records: &[ExpenseRecord]) -> PtrabReport {
    let mut grand = Sums::default();
    let mut sections = Vec::new();

    for kind in CategoryKind::ALL {
        let members: Vec<ExpenseRecord> = records
            .iter()
            .filter(|record| record.category() == kind)
            .cloned()
            .collect();
        if members.is_empty() {
            continue;
        }

        let groups = consolidate(&members);
        let mut sums = Sums::default();
        for group in &groups {
            sums.add(group.total, group.nd30, group.nd39);
        }
        grand.merge(&sums);

        debug!(category = kind.tag(), groups = groups.len(), "Section consolidated");
        sections.push(CategorySection {
            kind,
            groups,
            total: to_f64(sums.total),
            nd30: to_f64(sums.nd30),
            nd39: to_f64(sums.nd39),
        });
    }

    PtrabReport {
        ptrab,
        sections,
        total: to_f64(grand.total),
        nd30: to_f64(grand.nd30),
        nd39: to_f64(grand.nd39),
    }
}

/// Generates the report of a stored plan.
///
/// # Errors
/// Returns [`Error::PtrabNotFound`] when no plan has `ptrab_id`, or a load
/// error when a stored record cannot be read back.
pub async fn generate_ptrab_report(
    db: &DatabaseConnection,
    ptrab_id: i64,
) -> Result<PtrabReport> {
    let ptrab = get_ptrab_by_id(db, ptrab_id)
        .await?
        .ok_or(Error::PtrabNotFound { id: ptrab_id })?;

    let records = get_records_for_ptrab(db, ptrab_id).await?;
    let report = build_report(ptrab, &records);

    info!(
        ptrab_id,
        records = records.len(),
        sections = report.sections.len(),
        total = report.total,
        "P Trab report generated"
    );
    Ok(report)
}

/// Renders a report as plain text.
#[must_use]
pub fn render_report(report: &PtrabReport) -> String {
    let plan = &report.ptrab;
    let mut out = String::new();

    let _ = writeln!(out, "P TRAB Nº {} - {}", plan.number, plan.operation_name);
    let _ = writeln!(out, "OM: {} (UG {})", plan.om_name, plan.om_ug);
    let _ = writeln!(
        out,
        "Período: {} a {}",
        plan.start_date.format("%d/%m/%Y"),
        plan.end_date.format("%d/%m/%Y")
    );

    if report.sections.is_empty() {
        out.push_str("\nNenhum registro lançado.\n");
    }

    for section in &report.sections {
        let _ = writeln!(out, "\n== {} ==", section.kind.label());
        for group in &section.groups {
            render_group(&mut out, group);
        }
        let _ = writeln!(
            out,
            "\nTotal {}: {} (ND 33.90.30: {} | ND 33.90.39: {})",
            section.kind.label(),
            format_brl(section.total),
            format_brl(section.nd30),
            format_brl(section.nd39)
        );
    }

    let _ = writeln!(
        out,
        "\nTOTAL GERAL: {} (ND 33.90.30: {} | ND 33.90.39: {})",
        format_brl(report.total),
        format_brl(report.nd30),
        format_brl(report.nd39)
    );
    out
}

fn render_group(out: &mut String, group: &ConsolidatedGroup) {
    let key = &group.key;
    let _ = writeln!(out, "\nOM: {} (UG {})", key.owning_org, key.owning_ug);
    if group.is_transfer() {
        let _ = writeln!(
            out,
            "Recurso descentralizado por: {} (UG {})",
            key.holding_org, key.holding_ug
        );
    }
    if !key.activity_phase.is_empty() {
        let _ = writeln!(out, "Fase: {}", key.activity_phase);
    }
    let _ = writeln!(out, "Dias: {} | Efetivo: {}", key.operation_days, key.staffing);
    let _ = writeln!(
        out,
        "Valor: {} | ND 33.90.30: {} | ND 33.90.39: {}",
        format_brl(group.total),
        format_brl(group.nd30),
        format_brl(group.nd39)
    );
    out.push_str("Memória de cálculo:\n");
    out.push_str(&group.narrative());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::record::{NewExpenseRecord, create_record, save_custom_narrative},
        test_utils::*,
    };

    #[tokio::test]
    async fn test_generate_report_groups_and_totals() -> Result<()> {
        let (db, ptrab) = setup_with_ptrab().await?;

        let record = new_fuel_record("1º BIS", "160001", 3250.0, 3250.0, 0.0);
        create_record(&db, ptrab.id, record).await?;
        let record = new_fuel_record("1º BIS", "160001", 3250.0, 3000.0, 250.0);
        create_record(&db, ptrab.id, record).await?;
        create_record(
            &db,
            ptrab.id,
            NewExpenseRecord {
                payload: service_payload("Lavagem de viatura", 4.0, 150.0),
                ..new_fuel_record("Cia Com Sl", "160002", 600.0, 0.0, 600.0)
            },
        )
        .await?;

        let report = generate_ptrab_report(&db, ptrab.id).await?;

        assert_eq!(report.ptrab.id, ptrab.id);
        assert_eq!(report.record_count(), 3);
        let kinds: Vec<CategoryKind> = report.sections.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, vec![CategoryKind::Fuel, CategoryKind::Service]);

        let fuel = &report.sections[0];
        assert_eq!(fuel.groups.len(), 1);
        assert_eq!(fuel.total, 6500.0);
        assert_eq!(fuel.nd30, 6250.0);
        assert_eq!(fuel.nd39, 250.0);

        assert_eq!(report.total, 7100.0);
        assert_eq!(report.nd30, 6250.0);
        assert_eq!(report.nd39, 850.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_generate_report_unknown_ptrab() -> Result<()> {
        let db = setup_test_db().await?;
        let result = generate_ptrab_report(&db, 42).await;
        assert!(matches!(result.unwrap_err(), Error::PtrabNotFound { id: 42 }));
        Ok(())
    }

    #[tokio::test]
    async fn test_report_uses_anchor_custom_narrative() -> Result<()> {
        let (db, ptrab) = setup_with_ptrab().await?;
        let record = new_fuel_record("1º BIS", "160001", 3250.0, 3250.0, 0.0);
        let first = create_record(&db, ptrab.id, record.clone()).await?;
        create_record(&db, ptrab.id, record).await?;
        save_custom_narrative(&db, first.id, "Texto ajustado pelo usuário.").await?;

        let report = generate_ptrab_report(&db, ptrab.id).await?;
        let group = &report.sections[0].groups[0];
        assert_eq!(group.narrative(), "Texto ajustado pelo usuário.");
        Ok(())
    }

    #[test]
    fn test_build_report_empty() {
        let plan = ptrab::Model {
            id: 1,
            number: "Minuta".to_string(),
            operation_name: "Operação Ágata".to_string(),
            om_name: "1º BIS".to_string(),
            om_ug: "160001".to_string(),
            start_date: date(2025, 3, 1),
            end_date: date(2025, 3, 10),
            created_at: chrono::Utc::now(),
        };

        let report = build_report(plan, &[]);
        assert!(report.sections.is_empty());
        assert_eq!(report.total, 0.0);

        let text = render_report(&report);
        assert!(text.starts_with("P TRAB Nº Minuta - Operação Ágata\n"));
        assert!(text.contains("Período: 01/03/2025 a 10/03/2025"));
        assert!(text.contains("Nenhum registro lançado."));
        assert!(text.contains("TOTAL GERAL: R$ 0,00"));
    }

    #[tokio::test]
    async fn test_render_report_flags_transfers() -> Result<()> {
        let (db, ptrab) = setup_with_ptrab().await?;
        create_record(
            &db,
            ptrab.id,
            NewExpenseRecord {
                holding_org: "CMA".to_string(),
                holding_ug: "160500".to_string(),
                ..new_fuel_record("1º BIS", "160001", 3250.0, 3250.0, 0.0)
            },
        )
        .await?;
        let record = new_fuel_record("Cia Com Sl", "160002", 3250.0, 3250.0, 0.0);
        create_record(&db, ptrab.id, record).await?;

        let text = render_report(&generate_ptrab_report(&db, ptrab.id).await?);

        assert!(text.contains("== Classe III - Combustíveis =="));
        assert_eq!(text.matches("Recurso descentralizado por: CMA (UG 160500)").count(), 1);
        assert!(text.contains("Fase: Execução"));
        assert!(text.contains("Dias: 10 | Efetivo: 30"));
        assert!(text.contains("33.90.30 - Aquisição de Óleo Diesel"));
        assert!(text.contains(
            "TOTAL GERAL: R$ 6.500,00 (ND 33.90.30: R$ 6.500,00 | ND 33.90.39: R$ 0,00)"
        ));
        Ok(())
    }
}
