//! Effective-dated regulatory value resolution
//!
//! Reduction factor and tightening rate are published per industry (NAICS
//! code) with optional per-product overrides, each valid for a range of
//! compliance periods. Ranges per scope key are non-overlapping; the
//! upstream configuration tooling enforces that.

use crate::{
    types::{CompliancePeriod, NaicsCode, ProductId, RegulatoryValues},
    Error, Result,
};
use serde::{Deserialize, Serialize};

/// Scope a regulatory record applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegulatoryScope {
    /// Industry-wide default for a NAICS code
    Industry(NaicsCode),
    /// Override for one product within an industry
    ProductOverride {
        /// Industry the override belongs to
        naics: NaicsCode,
        /// Product the override applies to
        product_id: ProductId,
    },
}

/// One effective-dated regulatory record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegulatoryRecord {
    /// Scope key
    pub scope: RegulatoryScope,
    /// First period the record is valid for (inclusive)
    pub valid_from: CompliancePeriod,
    /// Last period the record is valid for (inclusive); open-ended if `None`
    pub valid_until: Option<CompliancePeriod>,
    /// The values in effect
    pub values: RegulatoryValues,
}

impl RegulatoryRecord {
    fn covers(&self, period: CompliancePeriod) -> bool {
        period >= self.valid_from && self.valid_until.map_or(true, |until| period <= until)
    }
}

/// Resolves effective regulatory values for a period
#[derive(Debug, Clone, Default)]
pub struct RegulatoryValueResolver {
    records: Vec<RegulatoryRecord>,
}

impl RegulatoryValueResolver {
    /// Resolver over a fixed set of records
    pub fn new(records: Vec<RegulatoryRecord>) -> Self {
        Self { records }
    }

    /// Add a record
    pub fn push(&mut self, record: RegulatoryRecord) {
        self.records.push(record);
    }

    /// Industry-wide values for the period
    ///
    /// Fatal `ConfigurationMissing` when no record covers the period.
    pub fn resolve(&self, naics: &NaicsCode, period: CompliancePeriod) -> Result<RegulatoryValues> {
        self.records
            .iter()
            .find(|r| r.covers(period) && r.scope == RegulatoryScope::Industry(naics.clone()))
            .map(|r| r.values)
            .ok_or_else(|| Error::ConfigurationMissing {
                scope: naics.to_string(),
                period: period.year(),
            })
    }

    /// Product override for the period, if one is published
    pub fn resolve_override(
        &self,
        naics: &NaicsCode,
        product_id: &ProductId,
        period: CompliancePeriod,
    ) -> Option<RegulatoryValues> {
        self.records
            .iter()
            .find(|r| {
                r.covers(period)
                    && r.scope
                        == RegulatoryScope::ProductOverride {
                            naics: naics.clone(),
                            product_id: product_id.clone(),
                        }
            })
            .map(|r| r.values)
    }

    /// Effective values for a product: override when present, industry
    /// default otherwise
    pub fn resolve_for_product(
        &self,
        naics: &NaicsCode,
        product_id: &ProductId,
        period: CompliancePeriod,
    ) -> Result<RegulatoryValues> {
        if let Some(values) = self.resolve_override(naics, product_id, period) {
            return Ok(values);
        }
        self.resolve(naics, period)
    }
}
