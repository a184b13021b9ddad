//! Emission allocation aggregation
//!
//! Pure sums over a report snapshot: compliance-relevant ("basic")
//! categories, the industrial-process subset, reporting-only categories,
//! and the operation-wide unattributed emissions, which are folded into
//! the reporting-only total at aggregate level.

use crate::providers::{CategoryKind, ProductReport, ReportSnapshot};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Allocation breakdown for one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAllocation {
    /// Total across the basic categories
    pub basic: Decimal,
    /// Industrial-process subset of the basic total
    pub industrial_process: Decimal,
    /// Total across reporting-only categories
    pub reporting_only: Decimal,
}

/// Allocation breakdown for a product's report lines
pub fn product_allocation(product: &ProductReport) -> ProductAllocation {
    let mut basic = Decimal::ZERO;
    let mut industrial_process = Decimal::ZERO;
    let mut reporting_only = Decimal::ZERO;

    for line in &product.allocations {
        match line.category.kind() {
            CategoryKind::Basic => {
                basic += line.amount;
                if line.category.is_industrial_process() {
                    industrial_process += line.amount;
                }
            }
            CategoryKind::ReportingOnly => reporting_only += line.amount,
        }
    }

    ProductAllocation {
        basic,
        industrial_process,
        reporting_only,
    }
}

/// All attributed emissions plus unattributed, across the operation
pub fn attributable_for_reporting(snapshot: &ReportSnapshot) -> Decimal {
    let attributed: Decimal = snapshot
        .products
        .iter()
        .flat_map(|p| p.allocations.iter())
        .map(|a| a.amount)
        .sum();
    attributed + snapshot.unattributed_emissions
}

/// Reporting-only emissions across the operation, unattributed folded in
pub fn reporting_only_total(snapshot: &ReportSnapshot) -> Decimal {
    let reporting_only: Decimal = snapshot
        .products
        .iter()
        .map(|p| product_allocation(p).reporting_only)
        .sum();
    reporting_only + snapshot.unattributed_emissions
}
