//! Reference price catalog loading from catalog.toml
//!
//! The catalog holds the unit values a unit negotiates once per fiscal year
//! (ration etapas, fuel prices, utility tariffs, diária rates) together with
//! the pregão they were bought through. Forms read it to pre-fill payloads so
//! that operators only type the operational quantities.

use crate::{
    core::category::{
        ExpensePayload, FuelPayload, FuelType, ProcurementRef, RationPayload, TravelPayload,
        UtilityPayload, UtilityType,
    },
    errors::{Error, Result},
};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// Catalog file used when `PTRAB_CATALOG` is not set.
pub const DEFAULT_CATALOG_PATH: &str = "catalog.toml";

/// Configuration structure representing the entire catalog.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Catalog {
    /// Ration etapa values
    pub ration: Option<RationRates>,
    /// Fuel prices, at most one per fuel type
    #[serde(default)]
    pub fuel: Vec<FuelPrice>,
    /// Utility tariffs, at most one per utility type
    #[serde(default)]
    pub utility: Vec<UtilityTariff>,
    /// Diária values
    pub travel: Option<TravelRates>,
}

/// Etapa values for Classe I.
#[derive(Debug, Clone, Deserialize)]
pub struct RationRates {
    /// Value of one QS etapa
    pub qs_unit_value: f64,
    /// Value of one QR etapa
    pub qr_unit_value: f64,
    /// Pregão number
    pub tender_number: Option<String>,
    /// UASG the pregão belongs to
    pub uasg: Option<String>,
}

/// Negotiated price of one fuel type.
#[derive(Debug, Clone, Deserialize)]
pub struct FuelPrice {
    /// Fuel kind, `"diesel"` or `"gasolina"`
    pub fuel_type: FuelType,
    /// Price of one liter
    pub price_per_liter: f64,
    /// Pregão number
    pub tender_number: Option<String>,
    /// UASG the pregão belongs to
    pub uasg: Option<String>,
}

/// Tariff of one utility type.
#[derive(Debug, Clone, Deserialize)]
pub struct UtilityTariff {
    /// Utility kind, `"agua"` or `"energia"`
    pub utility_type: UtilityType,
    /// Price of one consumption unit
    pub tariff: f64,
    /// Pregão number
    pub tender_number: Option<String>,
    /// UASG the pregão belongs to
    pub uasg: Option<String>,
}

/// Diária values.
#[derive(Debug, Clone, Deserialize)]
pub struct TravelRates {
    /// Value of one diária
    pub daily_rate: f64,
    /// Adicional de deslocamento
    #[serde(default)]
    pub displacement_allowance: f64,
}

/// Reference of a catalog entry; either half may be missing, as the memória
/// prints tender-only and UASG-only references too.
fn procurement(tender_number: Option<&str>, uasg: Option<&str>) -> Option<ProcurementRef> {
    let tender_number = tender_number.map(str::trim).unwrap_or_default();
    let uasg = uasg.map(str::trim).unwrap_or_default();
    if tender_number.is_empty() && uasg.is_empty() {
        return None;
    }
    Some(ProcurementRef {
        tender_number: tender_number.to_string(),
        uasg: uasg.to_string(),
    })
}

impl RationRates {
    /// Ration payload priced from the catalog.
    #[must_use]
    pub fn payload(&self, intermediate_meals: u32) -> ExpensePayload {
        ExpensePayload::Ration(RationPayload {
            qs_unit_value: self.qs_unit_value,
            qr_unit_value: self.qr_unit_value,
            intermediate_meals,
            procurement: procurement(self.tender_number.as_deref(), self.uasg.as_deref()),
        })
    }
}

impl FuelPrice {
    /// Fuel payload priced from the catalog.
    #[must_use]
    pub fn payload(&self, vehicles: u32, km_per_day: f64, km_per_liter: f64) -> ExpensePayload {
        ExpensePayload::Fuel(FuelPayload {
            fuel_type: self.fuel_type,
            vehicles,
            km_per_day,
            km_per_liter,
            price_per_liter: self.price_per_liter,
            procurement: procurement(self.tender_number.as_deref(), self.uasg.as_deref()),
        })
    }
}

impl UtilityTariff {
    /// Utility payload priced from the catalog.
    #[must_use]
    pub fn payload(&self, daily_consumption: f64) -> ExpensePayload {
        ExpensePayload::Utility(UtilityPayload {
            utility_type: self.utility_type,
            daily_consumption,
            tariff: self.tariff,
            procurement: procurement(self.tender_number.as_deref(), self.uasg.as_deref()),
        })
    }
}

impl TravelRates {
    /// Travel payload priced from the catalog.
    #[must_use]
    pub fn payload(&self) -> ExpensePayload {
        ExpensePayload::Travel(TravelPayload {
            daily_rate: self.daily_rate,
            displacement_allowance: self.displacement_allowance,
            procurement: None,
        })
    }
}

impl Catalog {
    /// Price entry for `fuel_type`, if the catalog has one.
    #[must_use]
    pub fn fuel_price(&self, fuel_type: FuelType) -> Option<&FuelPrice> {
        self.fuel.iter().find(|price| price.fuel_type == fuel_type)
    }

    /// Tariff entry for `utility_type`, if the catalog has one.
    #[must_use]
    pub fn utility_tariff(&self, utility_type: UtilityType) -> Option<&UtilityTariff> {
        self.utility
            .iter()
            .find(|tariff| tariff.utility_type == utility_type)
    }

    fn validate(&self) -> Result<()> {
        let mut amounts: Vec<(&str, f64)> = Vec::new();
        if let Some(ration) = &self.ration {
            amounts.push(("ration.qs_unit_value", ration.qs_unit_value));
            amounts.push(("ration.qr_unit_value", ration.qr_unit_value));
        }
        amounts.extend(self.fuel.iter().map(|p| ("fuel.price_per_liter", p.price_per_liter)));
        amounts.extend(self.utility.iter().map(|t| ("utility.tariff", t.tariff)));
        if let Some(travel) = &self.travel {
            amounts.push(("travel.daily_rate", travel.daily_rate));
            amounts.push(("travel.displacement_allowance", travel.displacement_allowance));
        }

        if let Some((field, value)) = amounts
            .into_iter()
            .find(|(_, value)| !value.is_finite() || *value < 0.0)
        {
            return Err(Error::Config {
                message: format!(
                    "Catalog field {field} must be a non-negative number, got {value}"
                ),
            });
        }

        for fuel_type in [FuelType::Diesel, FuelType::Gasolina] {
            if self.fuel.iter().filter(|p| p.fuel_type == fuel_type).count() > 1 {
                return Err(Error::Config {
                    message: format!("Catalog lists {} more than once", fuel_type.label()),
                });
            }
        }
        for utility_type in [UtilityType::Agua, UtilityType::Energia] {
            if self.utility.iter().filter(|t| t.utility_type == utility_type).count() > 1 {
                return Err(Error::Config {
                    message: format!("Catalog lists {} more than once", utility_type.label()),
                });
            }
        }
        Ok(())
    }
}

/// Parses catalog text and checks its values.
pub fn parse_catalog(contents: &str) -> Result<Catalog> {
    let catalog: Catalog = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse catalog: {e}"),
    })?;
    catalog.validate()?;
    Ok(catalog)
}

/// Loads the reference catalog from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A price is negative or a fuel/utility type is listed twice
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read catalog file {}: {e}", path.as_ref().display()),
    })?;

    let catalog = parse_catalog(&contents)?;
    info!(
        path = %path.as_ref().display(),
        fuel_prices = catalog.fuel.len(),
        utility_tariffs = catalog.utility.len(),
        "Catalog loaded"
    );
    Ok(catalog)
}

/// Loads the catalog named by `PTRAB_CATALOG`, or `./catalog.toml`.
///
/// A missing file yields an empty catalog; forms then start blank.
pub fn load_default_catalog() -> Result<Catalog> {
    let path = match std::env::var("PTRAB_CATALOG") {
        Ok(path) => path,
        Err(std::env::VarError::NotPresent) => DEFAULT_CATALOG_PATH.to_string(),
        Err(e) => return Err(e.into()),
    };
    if !Path::new(&path).exists() {
        warn!(path = %path, "Catalog file not found, starting with an empty catalog");
        return Ok(Catalog::default());
    }
    load_catalog(path)
}
