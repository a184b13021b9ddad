//! Report version lifecycle
//!
//! Creates the initial version for a submitted report and supplementary
//! versions for corrected submissions. Each operation commits exactly one
//! transaction; integration side effects run afterwards and are retried
//! externally on failure.

use crate::{
    records::{
        ComplianceEarnedCredit, ComplianceObligation, ComplianceReportVersion, IssuanceStatus,
    },
    store::{ComplianceStore, Mutation, Transaction},
    Error, Result,
};
use chrono::{NaiveDate, Utc};
use compliance_adapters::{NotificationService, ObligationSync, SyncRetryQueue};
use compliance_core::{
    determiner,
    providers::{ChargeRateProvider, EmissionIntensityRegistry, ReportDataProvider},
    quantize_currency, quantize_emissions, ComplianceData, ComplianceStatus, EngineConfig,
    PenaltyStatus, RegulatoryValueResolver,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Broad outcome category of a status, used for transition comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusCategory {
    Obligation,
    Credit,
    Neither,
}

fn category(status: ComplianceStatus) -> StatusCategory {
    match status {
        ComplianceStatus::ObligationNotMet
        | ComplianceStatus::ObligationPendingInvoiceCreation
        | ComplianceStatus::ObligationFullyMet => StatusCategory::Obligation,
        ComplianceStatus::EarnedCredits => StatusCategory::Credit,
        ComplianceStatus::NoObligationOrEarnedCredits | ComplianceStatus::Superceded => {
            StatusCategory::Neither
        }
    }
}

/// Orchestrates version creation, supersession, and companion records
pub struct ComplianceVersionLifecycle {
    store: Arc<ComplianceStore>,
    reports: Arc<dyn ReportDataProvider>,
    resolver: RegulatoryValueResolver,
    registry: Arc<dyn EmissionIntensityRegistry>,
    charge_rates: Arc<dyn ChargeRateProvider>,
    adapter: Arc<dyn ObligationSync>,
    retry_queue: Arc<SyncRetryQueue>,
    notifier: Arc<dyn NotificationService>,
    config: EngineConfig,
}

impl ComplianceVersionLifecycle {
    /// Create a lifecycle over the given store, providers, and adapters
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<ComplianceStore>,
        reports: Arc<dyn ReportDataProvider>,
        resolver: RegulatoryValueResolver,
        registry: Arc<dyn EmissionIntensityRegistry>,
        charge_rates: Arc<dyn ChargeRateProvider>,
        adapter: Arc<dyn ObligationSync>,
        retry_queue: Arc<SyncRetryQueue>,
        notifier: Arc<dyn NotificationService>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            reports,
            resolver,
            registry,
            charge_rates,
            adapter,
            retry_queue,
            notifier,
            config,
        }
    }

    /// Shared store handle
    pub fn store(&self) -> &Arc<ComplianceStore> {
        &self.store
    }

    /// Determine a submitted report and create its first version with its
    /// exactly-one companion record.
    ///
    /// Idempotent: calling this again for a report that already has a
    /// current version is a defensively-checked programmer error, nothing is
    /// dispatched twice.
    pub async fn create_version(&self, report_id: Uuid) -> Result<ComplianceReportVersion> {
        if self.store.current_version(report_id).is_some() {
            return Err(Error::Idempotency(format!(
                "Report {} already has a current version",
                report_id
            )));
        }

        let snapshot = self.reports.report_snapshot(report_id)?;
        let data = determiner::determine(
            &snapshot,
            &self.resolver,
            self.registry.as_ref(),
            &self.config,
        )?;
        let status = determiner::determine_status(data.excess_emissions, data.credited_emissions);

        let version = ComplianceReportVersion {
            id: Uuid::new_v4(),
            report_id,
            status,
            previous_version: None,
            is_supplementary: false,
            excess_delta_from_previous: None,
            data: quantized(data),
            created_at: Utc::now(),
        };

        let mut txn = Transaction::new();
        txn.push(Mutation::InsertVersion(version.clone()));
        let obligation_id = self.stage_companion(&version, &snapshot.period, &mut txn)?;
        self.store.commit(txn)?;

        info!(
            %report_id,
            version_id = %version.id,
            status = %version.status,
            "Compliance version created"
        );

        // Side effects after the local commit; failures never roll it back
        match version.status {
            ComplianceStatus::ObligationPendingInvoiceCreation => {
                if let Some(obligation_id) = obligation_id {
                    self.dispatch_sync(obligation_id).await;
                }
            }
            ComplianceStatus::NoObligationOrEarnedCredits => {
                self.dispatch_no_obligation_notice(version.id).await;
            }
            _ => {}
        }

        Ok(version)
    }

    /// Supersede the current version with a determination against corrected
    /// report data.
    ///
    /// The old version is marked `Superceded` in the same transaction that
    /// inserts the new one; its un-invoiced companion record is deleted and
    /// a fresh one created for the new total. Invoiced obligations and
    /// issued credits stay attached to the superseded version as audit
    /// trail.
    pub async fn create_supplementary_version(
        &self,
        report_id: Uuid,
    ) -> Result<ComplianceReportVersion> {
        let old = self.store.current_version(report_id).ok_or_else(|| {
            Error::NotFound(format!("Report {} has no current version", report_id))
        })?;

        let snapshot = self.reports.report_snapshot(report_id)?;
        let data = determiner::determine(
            &snapshot,
            &self.resolver,
            self.registry.as_ref(),
            &self.config,
        )?;
        let new_status =
            determiner::determine_status(data.excess_emissions, data.credited_emissions);
        let data = quantized(data);

        let version = ComplianceReportVersion {
            id: Uuid::new_v4(),
            report_id,
            status: new_status,
            previous_version: Some(old.id),
            is_supplementary: true,
            excess_delta_from_previous: Some(
                data.excess_emissions - old.data.excess_emissions,
            ),
            data,
            created_at: Utc::now(),
        };

        let mut txn = Transaction::new();
        txn.push(Mutation::SetVersionStatus {
            version_id: old.id,
            status: ComplianceStatus::Superceded,
        });
        txn.push(Mutation::InsertVersion(version.clone()));

        // Reconcile the old companion: un-invoiced/un-issued records are
        // deleted, invoiced/issued ones remain on the superseded version
        if let Some(old_obligation) = self.store.obligation_for_version(old.id) {
            if old_obligation.is_invoiced() {
                warn!(
                    obligation_id = %old_obligation.id,
                    "Superseding version with an invoiced obligation; invoice adjustment is handled externally"
                );
            } else {
                txn.push(Mutation::DeleteObligation(old_obligation.id));
            }
        }
        if let Some(old_credit) = self.store.credit_for_version(old.id) {
            if old_credit.issuance_status == IssuanceStatus::CreditsNotIssued {
                txn.push(Mutation::DeleteEarnedCredit(old_credit.id));
            } else {
                warn!(
                    credit_id = %old_credit.id,
                    "Superseding version with issued credits; registry retraction is handled externally"
                );
            }
        }

        // Fresh companion for the new total, not the delta
        let obligation_id = self.stage_companion(&version, &snapshot.period, &mut txn)?;
        self.store.commit(txn)?;

        info!(
            %report_id,
            old_version = %old.id,
            new_version = %version.id,
            old_status = %old.status,
            new_status = %version.status,
            "Supplementary version created"
        );

        // Side effects fire at most once per transition
        if let Some(obligation_id) = obligation_id {
            self.dispatch_sync(obligation_id).await;
        }
        if old.status != version.status {
            if let Err(e) = self
                .notifier
                .notify_status_transition(
                    version.id,
                    &old.status.to_string(),
                    &version.status.to_string(),
                )
                .await
            {
                warn!(error = %e, "Status transition notification failed");
            }
            if version.status == ComplianceStatus::NoObligationOrEarnedCredits {
                self.dispatch_no_obligation_notice(version.id).await;
            }
        }

        Ok(version)
    }

    /// Stage the exactly-one companion record the version's status calls
    /// for; returns the new obligation id when one was staged
    fn stage_companion(
        &self,
        version: &ComplianceReportVersion,
        period: &compliance_core::CompliancePeriod,
        txn: &mut Transaction,
    ) -> Result<Option<Uuid>> {
        match category(version.status) {
            StatusCategory::Obligation => {
                let charge_rate = self.charge_rates.charge_rate(*period)?;
                let obligation = ComplianceObligation {
                    id: Uuid::new_v4(),
                    version_id: version.id,
                    fee_amount: quantize_currency(version.data.excess_emissions * charge_rate),
                    fee_date: Utc::now().date_naive(),
                    deadline: self.obligation_deadline(*period)?,
                    penalty_status: PenaltyStatus::NotPaid,
                    invoice_ref: None,
                };
                let obligation_id = obligation.id;
                txn.push(Mutation::InsertObligation(obligation));
                Ok(Some(obligation_id))
            }
            StatusCategory::Credit => {
                txn.push(Mutation::InsertEarnedCredit(ComplianceEarnedCredit {
                    id: Uuid::new_v4(),
                    version_id: version.id,
                    credited_amount: version.data.credited_emissions,
                    issuance_status: IssuanceStatus::CreditsNotIssued,
                }));
                Ok(None)
            }
            StatusCategory::Neither => Ok(None),
        }
    }

    /// Statutory deadline: the configured day in the year after the period
    fn obligation_deadline(
        &self,
        period: compliance_core::CompliancePeriod,
    ) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(
            period.year() + 1,
            self.config.obligation_deadline_month,
            self.config.obligation_deadline_day,
        )
        .ok_or_else(|| {
            Error::Core(compliance_core::Error::Config(format!(
                "Invalid obligation deadline {}-{:02}-{:02}",
                period.year() + 1,
                self.config.obligation_deadline_month,
                self.config.obligation_deadline_day
            )))
        })
    }

    /// Fire-and-forget ledger sync; a failure is queued for retry
    async fn dispatch_sync(&self, obligation_id: Uuid) {
        let result = match self.adapter.ensure_authenticated().await {
            Ok(()) => self.adapter.sync_obligation(obligation_id).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            warn!(
                %obligation_id,
                adapter = self.adapter.name(),
                error = %e,
                "Obligation sync failed, queuing for retry"
            );
            if let Err(e) = self.retry_queue.push(obligation_id, e.to_string()).await {
                tracing::error!(%obligation_id, error = %e, "Failed to queue sync retry");
            }
        }
    }

    async fn dispatch_no_obligation_notice(&self, version_id: Uuid) {
        if let Err(e) = self.notifier.notify_no_obligation(version_id).await {
            warn!(%version_id, error = %e, "No-obligation notification failed");
        }
    }
}

/// Quantize a computed summary for persistence: emissions at 4 decimal
/// places, half-up
fn quantized(mut data: ComplianceData) -> ComplianceData {
    data.emissions_attributable_for_reporting =
        quantize_emissions(data.emissions_attributable_for_reporting);
    data.reporting_only_emissions = quantize_emissions(data.reporting_only_emissions);
    data.emissions_attributable_for_compliance =
        quantize_emissions(data.emissions_attributable_for_compliance);
    data.emissions_limit = quantize_emissions(data.emissions_limit);
    data.excess_emissions = quantize_emissions(data.excess_emissions);
    data.credited_emissions = quantize_emissions(data.credited_emissions);
    for product in &mut data.products {
        product.emission_limit = quantize_emissions(product.emission_limit);
    }
    data
}
