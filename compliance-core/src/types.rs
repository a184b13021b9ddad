//! Core data model for the compliance engine

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Regulatory year against which emissions are measured
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CompliancePeriod(pub i32);

impl CompliancePeriod {
    /// Create a period for the given regulatory year
    pub fn new(year: i32) -> Self {
        Self(year)
    }

    /// Regulatory year
    pub fn year(&self) -> i32 {
        self.0
    }

    /// Whole years elapsed since `initial` (negative if before it)
    pub fn years_since(&self, initial: CompliancePeriod) -> i32 {
        self.0 - initial.0
    }
}

impl fmt::Display for CompliancePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Regulated product identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductId(String);

impl ProductId {
    /// Create a product id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id as string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// NAICS industry classification code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NaicsCode(String);

impl NaicsCode {
    /// Create a NAICS code
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Code as string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NaicsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why the operation is registered under the program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationPurpose {
    /// Regulated operation above the emissions threshold
    Regulated,
    /// New entrant: compliance comparisons are forced to zero
    NewEntrant,
    /// Voluntarily opted in below the threshold
    OptedIn,
}

/// Status of a compliance report version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplianceStatus {
    /// Obligation exists and is not yet met
    ObligationNotMet,
    /// Excess emissions determined, invoice not yet raised
    ObligationPendingInvoiceCreation,
    /// Obligation settled in full
    ObligationFullyMet,
    /// Credited emissions determined
    EarnedCredits,
    /// Neither excess nor credited emissions
    NoObligationOrEarnedCredits,
    /// Replaced by a corrected version; kept as audit record
    Superceded,
}

impl ComplianceStatus {
    /// True for the obligation-type statuses
    pub fn is_obligation(&self) -> bool {
        matches!(
            self,
            ComplianceStatus::ObligationNotMet
                | ComplianceStatus::ObligationPendingInvoiceCreation
                | ComplianceStatus::ObligationFullyMet
        )
    }

    /// True once the version can no longer transition
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ComplianceStatus::ObligationFullyMet | ComplianceStatus::Superceded
        )
    }
}

impl fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComplianceStatus::ObligationNotMet => "OBLIGATION_NOT_MET",
            ComplianceStatus::ObligationPendingInvoiceCreation => {
                "OBLIGATION_PENDING_INVOICE_CREATION"
            }
            ComplianceStatus::ObligationFullyMet => "OBLIGATION_FULLY_MET",
            ComplianceStatus::EarnedCredits => "EARNED_CREDITS",
            ComplianceStatus::NoObligationOrEarnedCredits => "NO_OBLIGATION_OR_EARNED_CREDITS",
            ComplianceStatus::Superceded => "SUPERCEDED",
        };
        write!(f, "{}", s)
    }
}

/// Penalty status on an obligation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PenaltyStatus {
    /// No penalty amounts outstanding or accruing
    NotPaid,
    /// Obligation overdue with a balance; penalty accruing daily
    Accruing,
    /// Penalty invoice settled
    Paid,
}

/// Effective regulator parameters for a period
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegulatoryValues {
    /// Fraction of the product's intensity-based baseline the operation may emit
    pub reduction_factor: Decimal,
    /// Yearly ratchet applied on top of the reduction factor
    pub tightening_rate: Decimal,
}

/// Per-product calculation result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductComplianceData {
    /// Regulated product
    pub product_id: ProductId,

    /// Full-year production
    pub annual_production: Decimal,

    /// April–December production (transition-year figure)
    pub apr_dec_production: Decimal,

    /// Published emission intensity for the product
    pub emission_intensity: Decimal,

    /// Allocation across the compliance-relevant ("basic") categories
    pub allocated_basic: Decimal,

    /// Industrial-process subset of the basic allocation
    pub allocated_industrial_process: Decimal,

    /// Reporting-only subset
    pub allocated_reporting_only: Decimal,

    /// Full-year allocation counted toward compliance (basic − reporting-only)
    pub allocated_for_compliance: Decimal,

    /// Allocation actually used in the limit calculation; equals the
    /// prorated figure in the transition period, the full-year figure otherwise
    pub allocated_for_compliance_effective: Decimal,

    /// Production figure used in the limit calculation
    pub production_for_limit: Decimal,

    /// Regulatory values applied (override or industry-wide)
    pub regulatory_values: RegulatoryValues,

    /// Per-product emission limit in tCO2e
    pub emission_limit: Decimal,
}

/// Aggregate calculation output for one report version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceData {
    /// All attributed emissions plus operation-wide unattributed emissions
    pub emissions_attributable_for_reporting: Decimal,

    /// Reporting-only emissions (including unattributed, folded in at
    /// aggregate level)
    pub reporting_only_emissions: Decimal,

    /// Emissions counted toward compliance across all products
    pub emissions_attributable_for_compliance: Decimal,

    /// Sum of per-product emission limits
    pub emissions_limit: Decimal,

    /// Compliance emissions exceeding the limit; drives a monetary obligation
    pub excess_emissions: Decimal,

    /// Limit exceeding compliance emissions; convertible to tradable credits
    pub credited_emissions: Decimal,

    /// Industry-wide regulatory values resolved for the period
    pub regulatory_values: RegulatoryValues,

    /// Per-product breakdown
    pub products: Vec<ProductComplianceData>,
}

impl ComplianceData {
    /// `excess * credited == 0`, both non-negative
    pub fn invariant_holds(&self) -> bool {
        self.excess_emissions >= Decimal::ZERO
            && self.credited_emissions >= Decimal::ZERO
            && (self.excess_emissions.is_zero() || self.credited_emissions.is_zero())
    }
}

/// Quantize an emissions figure: 4 decimal places, half-up
pub fn quantize_emissions(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

/// Quantize a currency figure: 2 decimal places, half-up
pub fn quantize_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
