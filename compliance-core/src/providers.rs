//! External data providers consumed by the engine
//!
//! The engine never reaches out to the reporting database or the product
//! registry directly; it consumes these traits. All providers are
//! deterministic for a fixed snapshot.

use crate::{
    types::{CompliancePeriod, NaicsCode, ProductId, RegistrationPurpose},
    Error, Result,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Emission category an allocation is reported under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EmissionCategory {
    /// Flaring emissions
    Flaring,
    /// Fugitive emissions
    Fugitive,
    /// Industrial process emissions
    IndustrialProcess,
    /// On-site transportation
    OnSiteTransportation,
    /// Stationary fuel combustion
    StationaryCombustion,
    /// Venting (useful)
    VentingUseful,
    /// Venting (non-useful)
    VentingNonUseful,
    /// Waste emissions
    Waste,
    /// Wastewater emissions
    Wastewater,
    /// CO2 from excluded woody biomass
    WoodyBiomass,
    /// Other emissions from excluded biomass
    ExcludedBiomass,
    /// Emissions from excluded non-biomass fuels
    ExcludedNonBiomass,
}

/// Whether a category counts toward compliance or is reported only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CategoryKind {
    /// Compliance-relevant ("basic") category
    Basic,
    /// Reported but excluded from the compliance total
    ReportingOnly,
}

impl EmissionCategory {
    /// Classification of the category
    pub fn kind(&self) -> CategoryKind {
        match self {
            EmissionCategory::WoodyBiomass
            | EmissionCategory::ExcludedBiomass
            | EmissionCategory::ExcludedNonBiomass => CategoryKind::ReportingOnly,
            _ => CategoryKind::Basic,
        }
    }

    /// Industrial-process subset of the basic categories
    pub fn is_industrial_process(&self) -> bool {
        matches!(self, EmissionCategory::IndustrialProcess)
    }
}

/// One emission allocation line for a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmissionAllocation {
    /// Category the amount was allocated under
    pub category: EmissionCategory,
    /// Allocated amount in tCO2e
    pub amount: Decimal,
}

/// Per-product figures from the submitted report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductReport {
    /// Regulated product
    pub product_id: ProductId,
    /// Full-year production quantity
    pub annual_production: Decimal,
    /// April–December production quantity
    pub apr_dec_production: Decimal,
    /// Emission allocations by category
    pub allocations: Vec<EmissionAllocation>,
}

/// Immutable view of one submitted report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSnapshot {
    /// Report identifier
    pub report_id: Uuid,
    /// Operation that submitted the report
    pub operation_id: Uuid,
    /// Compliance period reported against
    pub period: CompliancePeriod,
    /// Registration purpose of the operation
    pub purpose: RegistrationPurpose,
    /// Industry classification used for regulatory-value resolution
    pub naics_code: NaicsCode,
    /// Per-product production and allocations
    pub products: Vec<ProductReport>,
    /// Operation-wide emissions not attributed to any product; folded into
    /// the reporting-only total at aggregate level
    pub unattributed_emissions: Decimal,
}

impl ReportSnapshot {
    /// Product figures by id
    pub fn product(&self, product_id: &ProductId) -> Option<&ProductReport> {
        self.products.iter().find(|p| &p.product_id == product_id)
    }
}

/// Read-only source of report snapshots
pub trait ReportDataProvider: Send + Sync {
    /// Snapshot for the given report id
    fn report_snapshot(&self, report_id: Uuid) -> Result<ReportSnapshot>;
}

/// Published emission intensities per regulated product
pub trait EmissionIntensityRegistry: Send + Sync {
    /// Current emission intensity for the product
    fn emission_intensity(&self, product_id: &ProductId) -> Result<Decimal>;
}

/// Dollars-per-tonne charge rate per compliance period
pub trait ChargeRateProvider: Send + Sync {
    /// Charge rate for the period
    fn charge_rate(&self, period: CompliancePeriod) -> Result<Decimal>;
}

/// In-memory report provider, loaded up front
#[derive(Debug, Default)]
pub struct InMemoryReportProvider {
    reports: HashMap<Uuid, ReportSnapshot>,
}

impl InMemoryReportProvider {
    /// Empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a snapshot
    pub fn insert(&mut self, snapshot: ReportSnapshot) {
        self.reports.insert(snapshot.report_id, snapshot);
    }
}

impl ReportDataProvider for InMemoryReportProvider {
    fn report_snapshot(&self, report_id: Uuid) -> Result<ReportSnapshot> {
        self.reports
            .get(&report_id)
            .cloned()
            .ok_or(Error::MissingReport(report_id))
    }
}

/// In-memory emission intensity registry
#[derive(Debug, Default)]
pub struct InMemoryIntensityRegistry {
    intensities: HashMap<ProductId, Decimal>,
}

impl InMemoryIntensityRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an intensity for a product
    pub fn insert(&mut self, product_id: ProductId, intensity: Decimal) {
        self.intensities.insert(product_id, intensity);
    }
}

impl EmissionIntensityRegistry for InMemoryIntensityRegistry {
    fn emission_intensity(&self, product_id: &ProductId) -> Result<Decimal> {
        self.intensities
            .get(product_id)
            .copied()
            .ok_or_else(|| Error::MissingEmissionIntensity(product_id.to_string()))
    }
}

/// In-memory charge rate table
#[derive(Debug, Default)]
pub struct InMemoryChargeRates {
    rates: HashMap<CompliancePeriod, Decimal>,
}

impl InMemoryChargeRates {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the charge rate for a period
    pub fn insert(&mut self, period: CompliancePeriod, rate: Decimal) {
        self.rates.insert(period, rate);
    }
}

impl ChargeRateProvider for InMemoryChargeRates {
    fn charge_rate(&self, period: CompliancePeriod) -> Result<Decimal> {
        self.rates
            .get(&period)
            .copied()
            .ok_or(Error::MissingChargeRate(period.year()))
    }
}
