//! Per-product emission limit calculation
//!
//! The limit for product `p` in period `cp` is
//!
//! ```text
//! limit(p) = production * ei(p)
//!          * (rf - (1 - ip(p)/afc(p)) * tr * (cp - initial))
//! ```
//!
//! where `ip` is the industrial-process allocation, `afc` the allocation
//! counted toward compliance, `rf`/`tr` the resolved regulatory values.
//! The `ip/afc` ratio is defined as 0 when `afc` is 0; that is documented
//! policy, not an error.
//!
//! For the single transition period the Apr–Dec production substitutes for
//! the annual figure and the compliance allocation is prorated by the
//! production ratio, quantized to 4 decimal places half-up. Every other
//! period uses full-year figures unchanged.

use crate::{
    allocation,
    config::EngineConfig,
    providers::{EmissionIntensityRegistry, ProductReport, ReportSnapshot},
    regulatory::RegulatoryValueResolver,
    types::{quantize_emissions, ProductComplianceData},
    Result,
};
use rust_decimal::Decimal;

/// Compute the compliance figures for one product of a report
pub fn compute_product(
    snapshot: &ReportSnapshot,
    product: &ProductReport,
    resolver: &RegulatoryValueResolver,
    registry: &dyn EmissionIntensityRegistry,
    config: &EngineConfig,
) -> Result<ProductComplianceData> {
    let emission_intensity = registry.emission_intensity(&product.product_id)?;
    let regulatory_values =
        resolver.resolve_for_product(&snapshot.naics_code, &product.product_id, snapshot.period)?;

    let alloc = allocation::product_allocation(product);
    let allocated_for_compliance = alloc.basic - alloc.reporting_only;

    let (production_for_limit, allocated_for_compliance_effective) =
        if config.is_partial_year(snapshot.period) {
            let prorated = prorate(
                allocated_for_compliance,
                product.apr_dec_production,
                product.annual_production,
            );
            (product.apr_dec_production, prorated)
        } else {
            (product.annual_production, allocated_for_compliance)
        };

    // ip/afc defined as 0 on a zero denominator
    let process_ratio = if allocated_for_compliance_effective.is_zero() {
        Decimal::ZERO
    } else {
        alloc.industrial_process / allocated_for_compliance_effective
    };

    let years = Decimal::from(snapshot.period.years_since(config.initial_period));
    let compliance_factor = regulatory_values.reduction_factor
        - (Decimal::ONE - process_ratio) * regulatory_values.tightening_rate * years;

    let emission_limit = production_for_limit * emission_intensity * compliance_factor;

    Ok(ProductComplianceData {
        product_id: product.product_id.clone(),
        annual_production: product.annual_production,
        apr_dec_production: product.apr_dec_production,
        emission_intensity,
        allocated_basic: alloc.basic,
        allocated_industrial_process: alloc.industrial_process,
        allocated_reporting_only: alloc.reporting_only,
        allocated_for_compliance,
        allocated_for_compliance_effective,
        production_for_limit,
        regulatory_values,
        emission_limit,
    })
}

/// Prorate a full-year allocation by the partial-year production share,
/// quantized to 4 decimal places half-up
fn prorate(full_year: Decimal, apr_dec_production: Decimal, annual_production: Decimal) -> Decimal {
    if annual_production.is_zero() {
        return Decimal::ZERO;
    }
    quantize_emissions(full_year * apr_dec_production / annual_production)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{EmissionAllocation, EmissionCategory, InMemoryIntensityRegistry};
    use crate::regulatory::{RegulatoryRecord, RegulatoryScope};
    use crate::types::{
        CompliancePeriod, NaicsCode, ProductId, RegistrationPurpose, RegulatoryValues,
    };
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn resolver() -> RegulatoryValueResolver {
        RegulatoryValueResolver::new(vec![RegulatoryRecord {
            scope: RegulatoryScope::Industry(NaicsCode::new("324110")),
            valid_from: CompliancePeriod::new(2024),
            valid_until: None,
            values: RegulatoryValues {
                reduction_factor: dec!(0.65),
                tightening_rate: dec!(0.01),
            },
        }])
    }

    fn registry(intensity: Decimal) -> InMemoryIntensityRegistry {
        let mut r = InMemoryIntensityRegistry::new();
        r.insert(ProductId::new("cement"), intensity);
        r
    }

    fn snapshot(period: i32, product: ProductReport) -> ReportSnapshot {
        ReportSnapshot {
            report_id: Uuid::new_v4(),
            operation_id: Uuid::new_v4(),
            period: CompliancePeriod::new(period),
            purpose: RegistrationPurpose::Regulated,
            naics_code: NaicsCode::new("324110"),
            products: vec![product],
            unattributed_emissions: Decimal::ZERO,
        }
    }

    fn cement(annual: Decimal, apr_dec: Decimal, basic: Decimal) -> ProductReport {
        ProductReport {
            product_id: ProductId::new("cement"),
            annual_production: annual,
            apr_dec_production: apr_dec,
            allocations: vec![EmissionAllocation {
                category: EmissionCategory::StationaryCombustion,
                amount: basic,
            }],
        }
    }

    #[test]
    fn test_transition_year_uses_partial_figures() {
        let product = cement(dec!(100000), dec!(50000), dec!(120001.0077));
        let snap = snapshot(2024, product.clone());
        let config = EngineConfig::default();

        let data = compute_product(
            &snap,
            &product,
            &resolver(),
            &registry(dec!(0.6262)),
            &config,
        )
        .unwrap();

        assert_eq!(data.production_for_limit, dec!(50000));
        // 120001.0077 * 0.5 = 60000.50385, half-up to 4dp
        assert_eq!(data.allocated_for_compliance_effective, dec!(60000.5039));
        // cp - initial == 0, so limit = 50000 * 0.6262 * 0.65
        assert_eq!(quantize_emissions(data.emission_limit), dec!(20351.5000));
    }

    #[test]
    fn test_non_transition_year_uses_full_figures() {
        let product = cement(dec!(100000), dec!(50000), dec!(120001.0077));
        let snap = snapshot(2026, product.clone());
        let config = EngineConfig::default();

        let data = compute_product(
            &snap,
            &product,
            &resolver(),
            &registry(dec!(0.6262)),
            &config,
        )
        .unwrap();

        assert_eq!(data.production_for_limit, dec!(100000));
        assert_eq!(data.allocated_for_compliance_effective, dec!(120001.0077));
        // limit = 100000 * 0.6262 * (0.65 - 1 * 0.01 * 2) = 62620 * 0.63
        assert_eq!(quantize_emissions(data.emission_limit), dec!(39450.6000));
    }

    #[test]
    fn test_zero_denominator_ratio_is_zero() {
        // No basic allocation at all: afc == 0, ratio must evaluate to 0
        let product = ProductReport {
            product_id: ProductId::new("cement"),
            annual_production: dec!(1000),
            apr_dec_production: dec!(500),
            allocations: vec![],
        };
        let snap = snapshot(2026, product.clone());
        let config = EngineConfig::default();

        let data = compute_product(
            &snap,
            &product,
            &resolver(),
            &registry(dec!(0.5)),
            &config,
        )
        .unwrap();

        // factor = 0.65 - (1 - 0) * 0.01 * 2 = 0.63; no division error
        assert_eq!(data.emission_limit, dec!(1000) * dec!(0.5) * dec!(0.63));
    }

    #[test]
    fn test_industrial_process_softens_tightening() {
        let product = ProductReport {
            product_id: ProductId::new("cement"),
            annual_production: dec!(1000),
            apr_dec_production: dec!(500),
            allocations: vec![
                EmissionAllocation {
                    category: EmissionCategory::StationaryCombustion,
                    amount: dec!(600),
                },
                EmissionAllocation {
                    category: EmissionCategory::IndustrialProcess,
                    amount: dec!(400),
                },
            ],
        };
        let snap = snapshot(2025, product.clone());
        let config = EngineConfig::default();

        let data = compute_product(
            &snap,
            &product,
            &resolver(),
            &registry(dec!(1)),
            &config,
        )
        .unwrap();

        // ip/afc = 0.4, factor = 0.65 - 0.6 * 0.01 * 1 = 0.644
        assert_eq!(data.emission_limit, dec!(1000) * dec!(0.644));
    }

    #[test]
    fn test_zero_annual_production_prorates_to_zero() {
        let product = cement(dec!(0), dec!(0), dec!(100));
        let snap = snapshot(2024, product.clone());
        let config = EngineConfig::default();

        let data = compute_product(
            &snap,
            &product,
            &resolver(),
            &registry(dec!(0.5)),
            &config,
        )
        .unwrap();

        assert_eq!(data.allocated_for_compliance_effective, Decimal::ZERO);
        assert_eq!(data.emission_limit, Decimal::ZERO);
    }
}
