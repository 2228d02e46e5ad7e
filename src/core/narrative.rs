//! Memória de cálculo text generation.
//!
//! Turns a record's [`Calculation`] into the fixed prose that Brazilian budget
//! documents require. Output is deterministic: same record, same bytes.
//! Ration records produce a QS block and a QR block separated by
//! [`NARRATIVE_DIVIDER`].

use crate::core::{
    category::{Calculation, ExpensePayload, ProcurementRef, RationBlock, compute},
    consolidation::ConsolidatedGroup,
    money::{format_brl, format_decimal},
    record::ExpenseRecord,
};

/// Separator between the QS and QR blocks of a ration memória.
pub const NARRATIVE_DIVIDER: &str = "\n\n--- DIVISOR_MEMORIA ---\n\n";

/// Separator between members of a consolidated group.
const MEMBER_SEPARATOR: &str = "\n\n";

/// Generated memória for a record, ignoring any custom text.
#[must_use]
pub fn record_narrative(record: &ExpenseRecord) -> String {
    let calculation = compute(&record.payload, record.staffing, record.operation_days);
    let procurement = record.payload.procurement().and_then(procurement_line);
    let allocation = allocation_line(record);

    match (&record.payload, &calculation) {
        (ExpensePayload::Ration(payload), Calculation::Ration { qs, qr }) => {
            let meals = payload.intermediate_meals;
            let mut qs_block = ration_block(record, "QS", "subsistência", qs, meals);
            let mut qr_block = ration_block(record, "QR", "reforço", qr, meals);
            qr_block.push(allocation);
            if let Some(line) = procurement {
                qs_block.push(line.clone());
                qr_block.push(line);
            }
            format!(
                "{}{NARRATIVE_DIVIDER}{}",
                qs_block.join("\n"),
                qr_block.join("\n")
            )
        }
        _ => {
            let mut lines = body_lines(record, &calculation);
            lines.push(allocation);
            lines.extend(procurement);
            lines.join("\n")
        }
    }
}

/// Memória shown for a single record: its custom text when present.
#[must_use]
pub fn narrative_for(record: &ExpenseRecord) -> String {
    record
        .custom_narrative()
        .map_or_else(|| record_narrative(record), str::to_string)
}

/// Canonical memória of a group.
///
/// The anchor's custom text replaces the whole block; otherwise each member's
/// generated memória is concatenated in member order.
#[must_use]
pub fn group_narrative(group: &ConsolidatedGroup) -> String {
    if let Some(custom) = group.anchor().and_then(ExpenseRecord::custom_narrative) {
        return custom.to_string();
    }

    group
        .records
        .iter()
        .map(record_narrative)
        .collect::<Vec<_>>()
        .join(MEMBER_SEPARATOR)
}

fn context_clause(record: &ExpenseRecord) -> String {
    let days = plural(record.operation_days, "dia", "dias");
    if record.activity_phase.is_empty() {
        format!("durante {days}")
    } else {
        format!("durante {days} de {}", record.activity_phase)
    }
}

fn ration_block(
    record: &ExpenseRecord,
    short: &str,
    long: &str,
    block: &RationBlock,
    intermediate_meals: u32,
) -> Vec<String> {
    let people = plural(record.staffing, "militar", "militares");
    let days = plural(record.operation_days, "dia", "dias");
    let etapa = format_brl(block.unit_value);

    let mut lines = vec![
        format!(
            "33.90.30 - Aquisição de gêneros alimentícios ({short} - quantitativo de {long}) para {people} da OM {}, {}.",
            record.owning_org,
            context_clause(record)
        ),
        format!("Valor da etapa {short}: {etapa}."),
    ];

    if intermediate_meals > 0 {
        lines.push(format!(
            "Fórmula: Efetivo x Nº de dias x Valor da etapa x (1 + {intermediate_meals}/3 refeição intermediária)."
        ));
        lines.push(format!(
            "{people} x {days} x {etapa} x {} = {}.",
            format_decimal(block.daily_factor, 4),
            format_brl(block.total)
        ));
    } else {
        lines.push("Fórmula: Efetivo x Nº de dias x Valor da etapa.".to_string());
        lines.push(format!(
            "{people} x {days} x {etapa} = {}.",
            format_brl(block.total)
        ));
    }

    lines.push(format!("Total {short}: {}.", format_brl(block.total)));
    lines
}

fn body_lines(record: &ExpenseRecord, calculation: &Calculation) -> Vec<String> {
    let org = &record.owning_org;
    let context = context_clause(record);
    let people = plural(record.staffing, "militar", "militares");
    let days = plural(record.operation_days, "dia", "dias");

    match (&record.payload, calculation) {
        (ExpensePayload::Fuel(p), Calculation::Fuel { liters, total }) => {
            let vehicles = plural(p.vehicles, "viatura", "viaturas");
            vec![
                format!(
                    "33.90.30 - Aquisição de {} para {vehicles} da OM {org}, {context}.",
                    p.fuel_type.label()
                ),
                format!(
                    "Consumo: {vehicles} x {} km/dia x {days} ÷ {} km/l = {} l.",
                    format_quantity(p.km_per_day),
                    format_quantity(p.km_per_liter),
                    format_quantity(*liters)
                ),
                format!(
                    "Custo: {} l x {} = {}.",
                    format_quantity(*liters),
                    format_brl(p.price_per_liter),
                    format_brl(*total)
                ),
                format!("Total: {}.", format_brl(*total)),
            ]
        }
        (
            ExpensePayload::Service(_) | ExpensePayload::Materiel(_),
            Calculation::Items { lines, total },
        ) => {
            let header = if matches!(record.payload, ExpensePayload::Service(_)) {
                format!(
                    "33.90.39 - Contratação de serviços de terceiros para a OM {org}, {context}."
                )
            } else {
                format!("33.90.30 - Aquisição de material de consumo para a OM {org}, {context}.")
            };
            let mut out = vec![header];
            if lines.is_empty() {
                out.push("Nenhum item informado.".to_string());
            }
            out.extend(lines.iter().map(|line| {
                format!(
                    "- {}: {} x {} = {}.",
                    line.item.description,
                    format_quantity(line.item.quantity),
                    format_brl(line.item.unit_value),
                    format_brl(line.subtotal)
                )
            }));
            out.push(format!("Total: {}.", format_brl(*total)));
            out
        }
        (
            ExpensePayload::Utility(p),
            Calculation::Utility {
                consumption,
                total,
            },
        ) => {
            let unit = p.utility_type.unit();
            vec![
                format!(
                    "33.90.39 - Pagamento de {} para a OM {org}, {context}.",
                    p.utility_type.label()
                ),
                format!(
                    "Consumo: {} {unit}/dia x {days} = {} {unit}.",
                    format_quantity(p.daily_consumption),
                    format_quantity(*consumption)
                ),
                format!(
                    "Custo: {} {unit} x {} = {}.",
                    format_quantity(*consumption),
                    format_brl(p.tariff),
                    format_brl(*total)
                ),
                format!("Total: {}.", format_brl(*total)),
            ]
        }
        (
            ExpensePayload::Travel(p),
            Calculation::Travel {
                per_diem,
                allowance,
                total,
            },
        ) => {
            let mut out = vec![
                format!("Pagamento de diárias para {people} da OM {org}, {context}."),
                format!(
                    "Diárias: {people} x {days} x {} = {}.",
                    format_brl(p.daily_rate),
                    format_brl(*per_diem)
                ),
            ];
            if *allowance > 0.0 {
                out.push(format!(
                    "Adicional de deslocamento: {people} x {} = {}.",
                    format_brl(p.displacement_allowance),
                    format_brl(*allowance)
                ));
            }
            out.push(format!("Total: {}.", format_brl(*total)));
            out
        }
        // Payload and calculation always come from the same `compute` call.
        _ => vec![format!("Total: {}.", format_brl(calculation.total()))],
    }
}

fn allocation_line(record: &ExpenseRecord) -> String {
    format!(
        "ND 33.90.30: {} | ND 33.90.39: {}.",
        format_brl(record.nd30),
        format_brl(record.nd39)
    )
}

fn procurement_line(reference: &ProcurementRef) -> Option<String> {
    let tender = reference.tender_number.trim();
    let uasg = reference.uasg.trim();
    match (tender.is_empty(), uasg.is_empty()) {
        (false, false) => Some(format!("Pregão nº {tender} - UASG {uasg}.")),
        (false, true) => Some(format!("Pregão nº {tender}.")),
        (true, false) => Some(format!("UASG {uasg}.")),
        (true, true) => None,
    }
}

fn plural(count: u32, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Whole numbers print without decimals, anything else with two.
fn format_quantity(value: f64) -> String {
    if value.fract().abs() < f64::EPSILON {
        format_decimal(value, 0)
    } else {
        format_decimal(value, 2)
    }
}
