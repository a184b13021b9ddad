//! Invoice rule chain
//!
//! External invoice snapshots drive obligation and penalty status. Rules
//! are ordered and mutually exclusive; the first matching rule wins and
//! that ordering is a hard contract (penalty settlement is checked before
//! penalty accrual). Handlers are stateless and idempotent: re-delivering
//! an already-handled snapshot matches no rule and is a no-op.

use crate::{
    records::{ComplianceObligation, CompliancePenalty, ComplianceReportVersion},
    store::{ComplianceStore, Mutation, Transaction},
    Error, Result,
};
use chrono::{NaiveDate, Utc};
use compliance_core::{ComplianceStatus, PenaltyStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Point-in-time view of an external invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceSnapshot {
    /// Obligation the invoice is linked to
    pub obligation_id: Uuid,
    /// External invoice reference
    pub invoice_ref: String,
    /// True for the separately-raised penalty invoice, false for the
    /// obligation invoice itself
    pub is_penalty_invoice: bool,
    /// Balance still owing; zero or negative once settled
    pub outstanding_balance: Decimal,
    /// Payment due date
    pub due_date: NaiveDate,
}

/// Everything a rule may look at, read from the store before evaluation
pub struct RuleContext<'a> {
    /// The delivered snapshot
    pub snapshot: &'a InvoiceSnapshot,
    /// Obligation the snapshot is linked to
    pub obligation: &'a ComplianceObligation,
    /// Version owning the obligation
    pub version: &'a ComplianceReportVersion,
    /// Existing penalty on the obligation, if any
    pub penalty: Option<&'a CompliancePenalty>,
    /// Evaluation date, injected for determinism
    pub today: NaiveDate,
}

impl RuleContext<'_> {
    fn settled(&self) -> bool {
        self.snapshot.outstanding_balance <= Decimal::ZERO
    }

    fn overdue(&self) -> bool {
        self.snapshot.due_date < self.today
    }
}

/// One rule in the chain
pub trait InvoiceRule: Send + Sync {
    /// Rule name for logging
    fn name(&self) -> &'static str;

    /// Whether this rule handles the snapshot
    fn applies(&self, ctx: &RuleContext<'_>) -> bool;

    /// Stage the rule's mutations
    fn apply(&self, ctx: &RuleContext<'_>, txn: &mut Transaction);
}

/// Penalty invoice settled in full
struct PenaltyPaid;

impl InvoiceRule for PenaltyPaid {
    fn name(&self) -> &'static str {
        "penalty-paid"
    }

    fn applies(&self, ctx: &RuleContext<'_>) -> bool {
        ctx.snapshot.is_penalty_invoice
            && ctx.penalty.is_some()
            && ctx.settled()
            && ctx.obligation.penalty_status != PenaltyStatus::Paid
    }

    fn apply(&self, ctx: &RuleContext<'_>, txn: &mut Transaction) {
        if let Some(penalty) = ctx.penalty {
            txn.push(Mutation::SetPenaltyInvoiceRef {
                penalty_id: penalty.id,
                invoice_ref: ctx.snapshot.invoice_ref.clone(),
            });
        }
        txn.push(Mutation::SetPenaltyStatus {
            obligation_id: ctx.obligation.id,
            status: PenaltyStatus::Paid,
        });
    }
}

/// Obligation overdue with a balance and no penalty yet
struct PenaltyAccruing;

impl InvoiceRule for PenaltyAccruing {
    fn name(&self) -> &'static str {
        "penalty-accruing"
    }

    fn applies(&self, ctx: &RuleContext<'_>) -> bool {
        !ctx.snapshot.is_penalty_invoice
            && ctx.version.status == ComplianceStatus::ObligationNotMet
            && ctx.overdue()
            && ctx.snapshot.outstanding_balance > Decimal::ZERO
            && ctx.penalty.is_none()
            && ctx.obligation.penalty_status != PenaltyStatus::Accruing
    }

    fn apply(&self, ctx: &RuleContext<'_>, txn: &mut Transaction) {
        txn.push(Mutation::SetPenaltyStatus {
            obligation_id: ctx.obligation.id,
            status: PenaltyStatus::Accruing,
        });
    }
}

/// Obligation invoice settled; penalize late settlement
struct ObligationPaid;

impl InvoiceRule for ObligationPaid {
    fn name(&self) -> &'static str {
        "obligation-paid"
    }

    fn applies(&self, ctx: &RuleContext<'_>) -> bool {
        !ctx.snapshot.is_penalty_invoice
            && ctx.version.status == ComplianceStatus::ObligationNotMet
            && ctx.settled()
            && ctx.penalty.is_none()
    }

    fn apply(&self, ctx: &RuleContext<'_>, txn: &mut Transaction) {
        txn.push(Mutation::SetVersionStatus {
            version_id: ctx.version.id,
            status: ComplianceStatus::ObligationFullyMet,
        });
        if ctx.overdue() {
            txn.push(Mutation::InsertPenalty(CompliancePenalty {
                id: Uuid::new_v4(),
                obligation_id: ctx.obligation.id,
                invoice_ref: None,
                created_at: Utc::now(),
            }));
        }
    }
}

/// First snapshot for a pending obligation: record the invoice reference
/// and move the version out of pending
struct InvoiceRaised;

impl InvoiceRule for InvoiceRaised {
    fn name(&self) -> &'static str {
        "invoice-raised"
    }

    fn applies(&self, ctx: &RuleContext<'_>) -> bool {
        !ctx.snapshot.is_penalty_invoice
            && ctx.version.status == ComplianceStatus::ObligationPendingInvoiceCreation
            && !ctx.obligation.is_invoiced()
    }

    fn apply(&self, ctx: &RuleContext<'_>, txn: &mut Transaction) {
        txn.push(Mutation::SetObligationInvoiceRef {
            obligation_id: ctx.obligation.id,
            invoice_ref: ctx.snapshot.invoice_ref.clone(),
        });
        txn.push(Mutation::SetVersionStatus {
            version_id: ctx.version.id,
            status: ComplianceStatus::ObligationNotMet,
        });
    }
}

/// Ordered rule chain over one store
pub struct InvoiceRuleChain {
    rules: Vec<Box<dyn InvoiceRule>>,
}

impl Default for InvoiceRuleChain {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceRuleChain {
    /// The standard chain. Order matters: penalty settlement is evaluated
    /// before penalty accrual.
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(PenaltyPaid),
                Box::new(PenaltyAccruing),
                Box::new(ObligationPaid),
                Box::new(InvoiceRaised),
            ],
        }
    }

    /// Evaluate a snapshot against the chain; the first matching rule's
    /// mutations commit as one transaction. Returns the applied rule's
    /// name, or `None` when the snapshot is already handled.
    pub fn handle(
        &self,
        store: &ComplianceStore,
        snapshot: &InvoiceSnapshot,
        today: NaiveDate,
    ) -> Result<Option<&'static str>> {
        let obligation = store.obligation(snapshot.obligation_id).ok_or_else(|| {
            Error::NotFound(format!("Obligation {}", snapshot.obligation_id))
        })?;
        let version = store.version(obligation.version_id).ok_or_else(|| {
            Error::NotFound(format!("Version {}", obligation.version_id))
        })?;
        let penalty = store.penalty_for_obligation(obligation.id);

        let ctx = RuleContext {
            snapshot,
            obligation: &obligation,
            version: &version,
            penalty: penalty.as_ref(),
            today,
        };

        for rule in &self.rules {
            if rule.applies(&ctx) {
                let mut txn = Transaction::new();
                rule.apply(&ctx, &mut txn);
                store.commit(txn)?;
                info!(
                    obligation_id = %obligation.id,
                    rule = rule.name(),
                    "Invoice snapshot handled"
                );
                return Ok(Some(rule.name()));
            }
        }

        // Already handled; redelivery is a no-op
        Ok(None)
    }
}
