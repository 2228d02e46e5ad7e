//! Expense categories and their numeric computation.
//!
//! Each category carries its own payload (what the data-entry form collects)
//! and a pure computation that turns the payload plus staffing and operation
//! days into figures. Text formatting lives in [`crate::core::narrative`].

use crate::{
    core::money::{round_cents, sanitize, to_decimal, to_f64},
    errors::{Error, Result},
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

/// Expense category of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CategoryKind {
    /// Classe I - gêneros alimentícios (QS and QR rations)
    Ration,
    /// Classe III - combustíveis
    Fuel,
    /// Contracted services
    Service,
    /// Consumable materiel
    Materiel,
    /// Utility bills (água, energia)
    Utility,
    /// Per diem travel allowances
    Travel,
}

impl CategoryKind {
    /// All categories in report order.
    pub const ALL: [Self; 6] = [
        Self::Ration,
        Self::Fuel,
        Self::Service,
        Self::Materiel,
        Self::Utility,
        Self::Travel,
    ];

    /// Tag stored in the `category` column.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Ration => "genero",
            Self::Fuel => "combustivel",
            Self::Service => "servico",
            Self::Materiel => "material",
            Self::Utility => "concessionaria",
            Self::Travel => "diarias",
        }
    }

    /// Parses a stored tag.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Title used in reports and narratives.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ration => "Classe I - Gêneros Alimentícios",
            Self::Fuel => "Classe III - Combustíveis",
            Self::Service => "Serviços de Terceiros",
            Self::Materiel => "Material de Consumo",
            Self::Utility => "Concessionárias",
            Self::Travel => "Diárias",
        }
    }
}

/// Tender (pregão) and accounting unit a line is bought through.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcurementRef {
    /// Pregão number, e.g. `90001/2025`
    #[serde(default)]
    pub tender_number: String,
    /// UASG code of the purchasing unit
    #[serde(default)]
    pub uasg: String,
}

/// Classe I payload: daily ration values for QS and QR.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RationPayload {
    /// Value of one QS etapa (per person, per day)
    pub qs_unit_value: f64,
    /// Value of one QR etapa (per person, per day)
    pub qr_unit_value: f64,
    /// Intermediate meals per day, each worth one third of an etapa
    #[serde(default)]
    pub intermediate_meals: u32,
    /// Procurement reference, when the line is bought through a tender
    #[serde(default)]
    pub procurement: Option<ProcurementRef>,
}

/// Fuel kinds a Classe III line can be for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuelType {
    /// Óleo diesel
    Diesel,
    /// Gasolina comum
    Gasolina,
}

impl FuelType {
    /// Name used in narratives.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Diesel => "Óleo Diesel",
            Self::Gasolina => "Gasolina",
        }
    }
}

/// Classe III payload: vehicle usage and fuel price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelPayload {
    /// Fuel kind
    pub fuel_type: FuelType,
    /// Number of vehicles
    pub vehicles: u32,
    /// Distance each vehicle runs per day
    pub km_per_day: f64,
    /// Vehicle consumption factor
    pub km_per_liter: f64,
    /// Price of one liter
    pub price_per_liter: f64,
    /// Procurement reference
    #[serde(default)]
    pub procurement: Option<ProcurementRef>,
}

/// A single priced line of a service or materiel list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// What is bought
    pub description: String,
    /// How many units
    pub quantity: f64,
    /// Price of one unit
    pub unit_value: f64,
}

/// Payload for item-list categories (services and materiel).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemListPayload {
    /// Priced items
    #[serde(default)]
    pub items: Vec<LineItem>,
    /// Procurement reference
    #[serde(default)]
    pub procurement: Option<ProcurementRef>,
}

/// Utility kinds billed by concessionárias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityType {
    /// Água e esgoto
    Agua,
    /// Energia elétrica
    Energia,
}

impl UtilityType {
    /// Name used in narratives.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Agua => "Água e Esgoto",
            Self::Energia => "Energia Elétrica",
        }
    }

    /// Unit the consumption is measured in.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::Agua => "m³",
            Self::Energia => "kWh",
        }
    }
}

/// Utility payload: daily consumption and tariff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilityPayload {
    /// Utility kind
    pub utility_type: UtilityType,
    /// Consumption per day of operation
    pub daily_consumption: f64,
    /// Price of one consumption unit
    pub tariff: f64,
    /// Procurement reference
    #[serde(default)]
    pub procurement: Option<ProcurementRef>,
}

/// Travel payload: per diem rate and one-off displacement allowance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TravelPayload {
    /// Value of one diária
    pub daily_rate: f64,
    /// Adicional de deslocamento paid once per person
    #[serde(default)]
    pub displacement_allowance: f64,
    /// Procurement reference
    #[serde(default)]
    pub procurement: Option<ProcurementRef>,
}

/// Category-specific payload of an expense record.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpensePayload {
    /// Classe I
    Ration(RationPayload),
    /// Classe III
    Fuel(FuelPayload),
    /// Services
    Service(ItemListPayload),
    /// Materiel
    Materiel(ItemListPayload),
    /// Concessionárias
    Utility(UtilityPayload),
    /// Diárias
    Travel(TravelPayload),
}

impl ExpensePayload {
    /// Category of this payload.
    #[must_use]
    pub const fn kind(&self) -> CategoryKind {
        match self {
            Self::Ration(_) => CategoryKind::Ration,
            Self::Fuel(_) => CategoryKind::Fuel,
            Self::Service(_) => CategoryKind::Service,
            Self::Materiel(_) => CategoryKind::Materiel,
            Self::Utility(_) => CategoryKind::Utility,
            Self::Travel(_) => CategoryKind::Travel,
        }
    }

    /// Procurement reference, if the payload has one.
    #[must_use]
    pub const fn procurement(&self) -> Option<&ProcurementRef> {
        match self {
            Self::Ration(p) => p.procurement.as_ref(),
            Self::Fuel(p) => p.procurement.as_ref(),
            Self::Service(p) | Self::Materiel(p) => p.procurement.as_ref(),
            Self::Utility(p) => p.procurement.as_ref(),
            Self::Travel(p) => p.procurement.as_ref(),
        }
    }

    /// Serializes the payload body for the `payload` column.
    pub fn to_json(&self) -> Result<String> {
        let json = match self {
            Self::Ration(p) => serde_json::to_string(p)?,
            Self::Fuel(p) => serde_json::to_string(p)?,
            Self::Service(p) | Self::Materiel(p) => serde_json::to_string(p)?,
            Self::Utility(p) => serde_json::to_string(p)?,
            Self::Travel(p) => serde_json::to_string(p)?,
        };
        Ok(json)
    }

    /// Rebuilds a payload from the stored category tag and JSON body.
    pub fn from_stored(tag: &str, json: &str) -> Result<Self> {
        let kind = CategoryKind::from_tag(tag).ok_or_else(|| Error::UnknownCategory {
            tag: tag.to_string(),
        })?;

        let payload = match kind {
            CategoryKind::Ration => Self::Ration(serde_json::from_str(json)?),
            CategoryKind::Fuel => Self::Fuel(serde_json::from_str(json)?),
            CategoryKind::Service => Self::Service(serde_json::from_str(json)?),
            CategoryKind::Materiel => Self::Materiel(serde_json::from_str(json)?),
            CategoryKind::Utility => Self::Utility(serde_json::from_str(json)?),
            CategoryKind::Travel => Self::Travel(serde_json::from_str(json)?),
        };
        Ok(payload)
    }
}

/// One of the two ration sub-blocks (QS or QR).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RationBlock {
    /// Etapa value used
    pub unit_value: f64,
    /// Etapas per person per day, 1 plus a third per intermediate meal
    pub daily_factor: f64,
    /// Block result
    pub total: f64,
}

/// A priced item with its subtotal.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemLine {
    /// The item as entered
    pub item: LineItem,
    /// `quantity × unit_value`
    pub subtotal: f64,
}

/// Numeric result of a category computation, ready to be formatted.
#[derive(Debug, Clone, PartialEq)]
pub enum Calculation {
    /// QS and QR blocks
    Ration {
        /// Quantitativo de subsistência
        qs: RationBlock,
        /// Quantitativo de reforço
        qr: RationBlock,
    },
    /// Fuel usage
    Fuel {
        /// Liters needed for the whole operation
        liters: f64,
        /// Total cost
        total: f64,
    },
    /// Service or materiel list
    Items {
        /// Priced lines
        lines: Vec<ItemLine>,
        /// Sum of the lines
        total: f64,
    },
    /// Utility consumption
    Utility {
        /// Consumption over the operation
        consumption: f64,
        /// Total cost
        total: f64,
    },
    /// Per diem
    Travel {
        /// Diárias part
        per_diem: f64,
        /// Displacement allowance part
        allowance: f64,
        /// Total cost
        total: f64,
    },
}

impl Calculation {
    /// Total amount of the computation.
    #[must_use]
    pub fn total(&self) -> f64 {
        match self {
            Self::Ration { qs, qr } => {
                to_f64(to_decimal(qs.total).saturating_add(to_decimal(qr.total)))
            }
            Self::Fuel { total, .. }
            | Self::Items { total, .. }
            | Self::Utility { total, .. }
            | Self::Travel { total, .. } => *total,
        }
    }
}

/// Computes the figures of a payload for `staffing` people over `days` days.
///
/// Never fails: zero divisors and empty lists yield zero, and figures past
/// the `Decimal` range saturate instead of overflowing.
#[must_use]
pub fn compute(payload: &ExpensePayload, staffing: u32, days: u32) -> Calculation {
    let people = Decimal::from(staffing);
    let days = Decimal::from(days);

    match payload {
        ExpensePayload::Ration(p) => {
            // Each intermediate meal is worth a third of an etapa.
            let factor = Decimal::ONE + Decimal::from(p.intermediate_meals) / Decimal::from(3);
            let block = |unit_value: f64| {
                let unit = to_decimal(sanitize(unit_value));
                RationBlock {
                    unit_value: to_f64(unit),
                    daily_factor: factor.round_dp(4).to_f64().unwrap_or(1.0),
                    total: to_f64(
                        people
                            .saturating_mul(days)
                            .saturating_mul(unit)
                            .saturating_mul(factor),
                    ),
                }
            };
            Calculation::Ration {
                qs: block(p.qs_unit_value),
                qr: block(p.qr_unit_value),
            }
        }
        ExpensePayload::Fuel(p) => {
            let km_per_liter = to_decimal(sanitize(p.km_per_liter));
            let liters = if km_per_liter.is_zero() {
                Decimal::ZERO
            } else {
                Decimal::from(p.vehicles)
                    .saturating_mul(to_decimal(sanitize(p.km_per_day)))
                    .saturating_mul(days)
                    .checked_div(km_per_liter)
                    .unwrap_or(Decimal::MAX)
            };
            let liters = round_cents(liters);
            Calculation::Fuel {
                liters: to_f64(liters),
                total: to_f64(liters.saturating_mul(to_decimal(sanitize(p.price_per_liter)))),
            }
        }
        ExpensePayload::Service(p) | ExpensePayload::Materiel(p) => {
            let mut total = Decimal::ZERO;
            let lines = p
                .items
                .iter()
                .map(|item| {
                    let subtotal = round_cents(
                        to_decimal(sanitize(item.quantity))
                            .saturating_mul(to_decimal(sanitize(item.unit_value))),
                    );
                    total = total.saturating_add(subtotal);
                    ItemLine {
                        item: item.clone(),
                        subtotal: to_f64(subtotal),
                    }
                })
                .collect();
            Calculation::Items {
                lines,
                total: to_f64(total),
            }
        }
        ExpensePayload::Utility(p) => {
            let consumption =
                round_cents(to_decimal(sanitize(p.daily_consumption)).saturating_mul(days));
            Calculation::Utility {
                consumption: to_f64(consumption),
                total: to_f64(consumption.saturating_mul(to_decimal(sanitize(p.tariff)))),
            }
        }
        ExpensePayload::Travel(p) => {
            let per_diem = round_cents(
                people
                    .saturating_mul(days)
                    .saturating_mul(to_decimal(sanitize(p.daily_rate))),
            );
            let allowance = round_cents(
                people.saturating_mul(to_decimal(sanitize(p.displacement_allowance))),
            );
            Calculation::Travel {
                per_diem: to_f64(per_diem),
                allowance: to_f64(allowance),
                total: to_f64(per_diem.saturating_add(allowance)),
            }
        }
    }
}
