//! Persistent-shaped lifecycle records

use chrono::{DateTime, NaiveDate, Utc};
use compliance_core::{ComplianceData, ComplianceStatus, PenaltyStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One immutable determination of a report's compliance outcome.
///
/// Versions are never physically deleted; a corrected submission creates a
/// new version and marks this one `Superceded`. `previous_version` is set at
/// creation and never changes, so supersession forms a singly-linked list
/// rooted at the report's first version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReportVersion {
    /// Version id
    pub id: Uuid,

    /// Report this version determines
    pub report_id: Uuid,

    /// Current status
    pub status: ComplianceStatus,

    /// Version this one supersedes, if any
    pub previous_version: Option<Uuid>,

    /// True when created by a supplementary (corrected) submission
    pub is_supplementary: bool,

    /// Change in excess emissions relative to the superseded version;
    /// display field only, companion records are sized by the new total
    pub excess_delta_from_previous: Option<Decimal>,

    /// Computed compliance summary
    pub data: ComplianceData,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Monetary liability from positive excess emissions; one-to-one with its
/// version and deleted (not archived) when that version is superseded while
/// still un-invoiced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceObligation {
    /// Obligation id
    pub id: Uuid,

    /// Version the obligation belongs to
    pub version_id: Uuid,

    /// Excess emissions times the period's charge rate, currency-quantized
    pub fee_amount: Decimal,

    /// Date the fee was determined
    pub fee_date: NaiveDate,

    /// Statutory payment deadline
    pub deadline: NaiveDate,

    /// Penalty status
    pub penalty_status: PenaltyStatus,

    /// External invoice reference, set once the ledger raises the invoice
    pub invoice_ref: Option<String>,
}

impl ComplianceObligation {
    /// True once an external invoice has been raised
    pub fn is_invoiced(&self) -> bool {
        self.invoice_ref.is_some()
    }
}

/// Issuance state of an earned credit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssuanceStatus {
    /// Determined but not yet issued to the trading registry
    CreditsNotIssued,
    /// Issued as tradable credits
    Issued,
}

/// Tradable entitlement from positive credited emissions; same one-to-one
/// and delete-on-supersede rules as obligations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceEarnedCredit {
    /// Credit id
    pub id: Uuid,

    /// Version the credit belongs to
    pub version_id: Uuid,

    /// Credited emissions, quantized
    pub credited_amount: Decimal,

    /// Issuance state
    pub issuance_status: IssuanceStatus,
}

/// Administrative penalty on an overdue obligation; at most one per
/// obligation, invoiced separately from the obligation itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompliancePenalty {
    /// Penalty id
    pub id: Uuid,

    /// Obligation the penalty accrued against
    pub obligation_id: Uuid,

    /// Distinct external invoice reference for the penalty
    pub invoice_ref: Option<String>,

    /// When the penalty was created
    pub created_at: DateTime<Utc>,
}
