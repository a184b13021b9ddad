//! Atomic in-memory compliance store
//!
//! Real persistence lives outside this engine; the store keeps the same
//! conceptual layout (one row per version, at most one obligation XOR earned
//! credit per version, at most one penalty per obligation) and gives each
//! lifecycle operation a unit-of-work: mutations are staged into a
//! [`Transaction`] and applied under a single write lock in [`ComplianceStore::commit`].
//! A failed commit leaves no partial state.

use crate::{
    records::{
        ComplianceEarnedCredit, ComplianceObligation, CompliancePenalty, ComplianceReportVersion,
    },
    Error, Result,
};
use compliance_core::{ComplianceStatus, PenaltyStatus};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// One staged mutation
#[derive(Debug, Clone)]
pub enum Mutation {
    /// Insert a new report version
    InsertVersion(ComplianceReportVersion),
    /// Change a version's status
    SetVersionStatus {
        /// Version to update
        version_id: Uuid,
        /// New status
        status: ComplianceStatus,
    },
    /// Insert a new obligation
    InsertObligation(ComplianceObligation),
    /// Delete an un-invoiced obligation
    DeleteObligation(Uuid),
    /// Record the external invoice reference on an obligation
    SetObligationInvoiceRef {
        /// Obligation to update
        obligation_id: Uuid,
        /// External reference
        invoice_ref: String,
    },
    /// Change an obligation's penalty status
    SetPenaltyStatus {
        /// Obligation to update
        obligation_id: Uuid,
        /// New penalty status
        status: PenaltyStatus,
    },
    /// Insert a new earned credit
    InsertEarnedCredit(ComplianceEarnedCredit),
    /// Delete an un-issued earned credit
    DeleteEarnedCredit(Uuid),
    /// Insert a new penalty
    InsertPenalty(CompliancePenalty),
    /// Record the external invoice reference on a penalty
    SetPenaltyInvoiceRef {
        /// Penalty to update
        penalty_id: Uuid,
        /// External reference of the penalty invoice
        invoice_ref: String,
    },
}

/// Staged mutations for one lifecycle operation
#[derive(Debug, Clone, Default)]
pub struct Transaction {
    mutations: Vec<Mutation>,
}

impl Transaction {
    /// Empty transaction
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a mutation
    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    /// Number of staged mutations
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// True when nothing is staged
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
struct Inner {
    versions: HashMap<Uuid, ComplianceReportVersion>,
    obligations: HashMap<Uuid, ComplianceObligation>,
    credits: HashMap<Uuid, ComplianceEarnedCredit>,
    penalties: HashMap<Uuid, CompliancePenalty>,
}

impl Inner {
    fn apply(&mut self, mutation: Mutation) -> Result<()> {
        match mutation {
            Mutation::InsertVersion(version) => {
                if self.versions.contains_key(&version.id) {
                    return Err(Error::Invariant(format!(
                        "Version {} already exists",
                        version.id
                    )));
                }
                self.versions.insert(version.id, version);
            }
            Mutation::SetVersionStatus { version_id, status } => {
                let version = self.versions.get_mut(&version_id).ok_or_else(|| {
                    Error::NotFound(format!("Version {}", version_id))
                })?;
                version.status = status;
            }
            Mutation::InsertObligation(obligation) => {
                if self.obligations.contains_key(&obligation.id) {
                    return Err(Error::Invariant(format!(
                        "Obligation {} already exists",
                        obligation.id
                    )));
                }
                if !self.versions.contains_key(&obligation.version_id) {
                    return Err(Error::NotFound(format!(
                        "Version {}",
                        obligation.version_id
                    )));
                }
                self.obligations.insert(obligation.id, obligation);
            }
            Mutation::DeleteObligation(obligation_id) => {
                let obligation = self.obligations.get(&obligation_id).ok_or_else(|| {
                    Error::NotFound(format!("Obligation {}", obligation_id))
                })?;
                if obligation.is_invoiced() {
                    return Err(Error::Invariant(format!(
                        "Obligation {} is invoiced and cannot be deleted",
                        obligation_id
                    )));
                }
                self.obligations.remove(&obligation_id);
            }
            Mutation::SetObligationInvoiceRef {
                obligation_id,
                invoice_ref,
            } => {
                let obligation = self.obligations.get_mut(&obligation_id).ok_or_else(|| {
                    Error::NotFound(format!("Obligation {}", obligation_id))
                })?;
                obligation.invoice_ref = Some(invoice_ref);
            }
            Mutation::SetPenaltyStatus {
                obligation_id,
                status,
            } => {
                let obligation = self.obligations.get_mut(&obligation_id).ok_or_else(|| {
                    Error::NotFound(format!("Obligation {}", obligation_id))
                })?;
                obligation.penalty_status = status;
            }
            Mutation::InsertEarnedCredit(credit) => {
                if self.credits.contains_key(&credit.id) {
                    return Err(Error::Invariant(format!(
                        "Earned credit {} already exists",
                        credit.id
                    )));
                }
                if !self.versions.contains_key(&credit.version_id) {
                    return Err(Error::NotFound(format!("Version {}", credit.version_id)));
                }
                self.credits.insert(credit.id, credit);
            }
            Mutation::DeleteEarnedCredit(credit_id) => {
                if self.credits.remove(&credit_id).is_none() {
                    return Err(Error::NotFound(format!("Earned credit {}", credit_id)));
                }
            }
            Mutation::InsertPenalty(penalty) => {
                if !self.obligations.contains_key(&penalty.obligation_id) {
                    return Err(Error::NotFound(format!(
                        "Obligation {}",
                        penalty.obligation_id
                    )));
                }
                if self
                    .penalties
                    .values()
                    .any(|p| p.obligation_id == penalty.obligation_id)
                {
                    return Err(Error::Invariant(format!(
                        "Obligation {} already has a penalty",
                        penalty.obligation_id
                    )));
                }
                self.penalties.insert(penalty.id, penalty);
            }
            Mutation::SetPenaltyInvoiceRef {
                penalty_id,
                invoice_ref,
            } => {
                let penalty = self.penalties.get_mut(&penalty_id).ok_or_else(|| {
                    Error::NotFound(format!("Penalty {}", penalty_id))
                })?;
                penalty.invoice_ref = Some(invoice_ref);
            }
        }
        Ok(())
    }

    /// Structural invariants checked after every transaction
    fn validate(&self) -> Result<()> {
        // Exactly one non-superceded version per report
        let mut current_per_report: HashMap<Uuid, usize> = HashMap::new();
        for version in self.versions.values() {
            if version.status != ComplianceStatus::Superceded {
                *current_per_report.entry(version.report_id).or_insert(0) += 1;
            }
        }
        for (report_id, count) in current_per_report {
            if count > 1 {
                return Err(Error::Invariant(format!(
                    "Report {} has {} current versions",
                    report_id, count
                )));
            }
        }

        // At most one obligation XOR earned credit per version
        for version_id in self.versions.keys() {
            let obligations = self
                .obligations
                .values()
                .filter(|o| o.version_id == *version_id)
                .count();
            let credits = self
                .credits
                .values()
                .filter(|c| c.version_id == *version_id)
                .count();
            if obligations > 1 || credits > 1 || (obligations > 0 && credits > 0) {
                return Err(Error::Invariant(format!(
                    "Version {} has {} obligations and {} credits",
                    version_id, obligations, credits
                )));
            }
        }

        Ok(())
    }
}

/// In-memory compliance store with atomic transactions
#[derive(Debug, Default)]
pub struct ComplianceStore {
    inner: RwLock<Inner>,
}

impl ComplianceStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply all mutations of `txn` atomically. On any error the store is
    /// unchanged.
    pub fn commit(&self, txn: Transaction) -> Result<()> {
        let mut inner = self.inner.write();

        // Stage against a copy so a mid-transaction failure cannot leave
        // partial state behind
        let mut staged = inner.clone();
        for mutation in txn.mutations {
            staged.apply(mutation)?;
        }
        staged.validate()?;

        *inner = staged;
        Ok(())
    }

    /// Version by id
    pub fn version(&self, version_id: Uuid) -> Option<ComplianceReportVersion> {
        self.inner.read().versions.get(&version_id).cloned()
    }

    /// The single non-superceded version of a report
    pub fn current_version(&self, report_id: Uuid) -> Option<ComplianceReportVersion> {
        self.inner
            .read()
            .versions
            .values()
            .find(|v| v.report_id == report_id && v.status != ComplianceStatus::Superceded)
            .cloned()
    }

    /// All versions of a report, oldest first
    pub fn versions_for_report(&self, report_id: Uuid) -> Vec<ComplianceReportVersion> {
        let mut versions: Vec<_> = self
            .inner
            .read()
            .versions
            .values()
            .filter(|v| v.report_id == report_id)
            .cloned()
            .collect();
        versions.sort_by_key(|v| v.created_at);
        versions
    }

    /// Obligation by id
    pub fn obligation(&self, obligation_id: Uuid) -> Option<ComplianceObligation> {
        self.inner.read().obligations.get(&obligation_id).cloned()
    }

    /// Obligation attached to a version
    pub fn obligation_for_version(&self, version_id: Uuid) -> Option<ComplianceObligation> {
        self.inner
            .read()
            .obligations
            .values()
            .find(|o| o.version_id == version_id)
            .cloned()
    }

    /// Earned credit attached to a version
    pub fn credit_for_version(&self, version_id: Uuid) -> Option<ComplianceEarnedCredit> {
        self.inner
            .read()
            .credits
            .values()
            .find(|c| c.version_id == version_id)
            .cloned()
    }

    /// Penalty attached to an obligation
    pub fn penalty_for_obligation(&self, obligation_id: Uuid) -> Option<CompliancePenalty> {
        self.inner
            .read()
            .penalties
            .values()
            .find(|p| p.obligation_id == obligation_id)
            .cloned()
    }
}
