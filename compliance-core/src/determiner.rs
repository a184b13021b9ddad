//! Compliance aggregation and status determination

use crate::{
    allocation, calculator,
    config::EngineConfig,
    providers::{EmissionIntensityRegistry, ReportSnapshot},
    regulatory::RegulatoryValueResolver,
    types::{ComplianceData, ComplianceStatus, RegistrationPurpose},
    Result,
};
use rust_decimal::Decimal;

/// Compute the full compliance determination for one report snapshot
pub fn determine(
    snapshot: &ReportSnapshot,
    resolver: &RegulatoryValueResolver,
    registry: &dyn EmissionIntensityRegistry,
    config: &EngineConfig,
) -> Result<ComplianceData> {
    let regulatory_values = resolver.resolve(&snapshot.naics_code, snapshot.period)?;

    let mut products = Vec::with_capacity(snapshot.products.len());
    for product in &snapshot.products {
        products.push(calculator::compute_product(
            snapshot, product, resolver, registry, config,
        )?);
    }

    let mut emissions_limit: Decimal = products.iter().map(|p| p.emission_limit).sum();
    let mut emissions_attributable_for_compliance: Decimal = products
        .iter()
        .map(|p| p.allocated_for_compliance_effective)
        .sum();

    // New entrants report but carry no compliance comparison
    if snapshot.purpose == RegistrationPurpose::NewEntrant {
        emissions_limit = Decimal::ZERO;
        emissions_attributable_for_compliance = Decimal::ZERO;
    }

    let (excess_emissions, credited_emissions) =
        if emissions_attributable_for_compliance > emissions_limit {
            (
                emissions_attributable_for_compliance - emissions_limit,
                Decimal::ZERO,
            )
        } else {
            (
                Decimal::ZERO,
                emissions_limit - emissions_attributable_for_compliance,
            )
        };

    let data = ComplianceData {
        emissions_attributable_for_reporting: allocation::attributable_for_reporting(snapshot),
        reporting_only_emissions: allocation::reporting_only_total(snapshot),
        emissions_attributable_for_compliance,
        emissions_limit,
        excess_emissions,
        credited_emissions,
        regulatory_values,
        products,
    };
    debug_assert!(data.invariant_holds());

    tracing::debug!(
        report_id = %snapshot.report_id,
        period = %snapshot.period,
        excess = %data.excess_emissions,
        credited = %data.credited_emissions,
        "Compliance determination complete"
    );

    Ok(data)
}

/// Map excess/credited emissions to the version status
///
/// `Superceded` is never produced here; only the version lifecycle assigns it.
pub fn determine_status(excess: Decimal, credited: Decimal) -> ComplianceStatus {
    if excess > Decimal::ZERO {
        ComplianceStatus::ObligationPendingInvoiceCreation
    } else if credited > Decimal::ZERO {
        ComplianceStatus::EarnedCredits
    } else {
        ComplianceStatus::NoObligationOrEarnedCredits
    }
}
