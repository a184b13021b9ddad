//! End-to-end lifecycle flows
//!
//! Drive the lifecycle the way the surrounding application would: submit a
//! report, supersede it with corrected data, and deliver invoice snapshots,
//! asserting the invariants the engine guarantees.

use async_trait::async_trait;
use chrono::NaiveDate;
use compliance_adapters::{
    Error as AdapterError, LogNotifier, ObligationSync, Result as AdapterResult, SyncRetryQueue,
};
use compliance_lifecycle::{
    ComplianceStore, ComplianceVersionLifecycle, Error, InvoiceRuleChain, InvoiceSnapshot,
};
use compliance_core::{
    providers::{
        EmissionAllocation, EmissionCategory, InMemoryChargeRates, InMemoryIntensityRegistry,
        InMemoryReportProvider, ProductReport, ReportSnapshot,
    },
    CompliancePeriod, ComplianceStatus, EngineConfig, NaicsCode, ProductId, RegistrationPurpose,
    RegulatoryRecord, RegulatoryScope, RegulatoryValueResolver, RegulatoryValues,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, Mutex,
};
use uuid::Uuid;

/// Adapter that records sync calls; optionally fails every call
struct RecordingAdapter {
    fail: bool,
    synced: Mutex<Vec<Uuid>>,
    calls: AtomicU32,
}

impl RecordingAdapter {
    fn new(fail: bool) -> Self {
        Self {
            fail,
            synced: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl ObligationSync for RecordingAdapter {
    async fn ensure_authenticated(&self) -> AdapterResult<()> {
        Ok(())
    }

    async fn sync_obligation(&self, obligation_id: Uuid) -> AdapterResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AdapterError::Sync("ledger unavailable".to_string()));
        }
        self.synced.lock().unwrap().push(obligation_id);
        Ok(())
    }

    async fn health_check(&self) -> AdapterResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

struct Fixture {
    lifecycle: ComplianceVersionLifecycle,
    store: Arc<ComplianceStore>,
    adapter: Arc<RecordingAdapter>,
    retry_queue: Arc<SyncRetryQueue>,
    reports: Arc<InMemoryReportProvider>,
    report_id: Uuid,
}

fn cement_snapshot(report_id: Uuid, basic_allocation: Decimal) -> ReportSnapshot {
    ReportSnapshot {
        report_id,
        operation_id: Uuid::new_v4(),
        period: CompliancePeriod::new(2024),
        purpose: RegistrationPurpose::Regulated,
        naics_code: NaicsCode::new("324110"),
        products: vec![ProductReport {
            product_id: ProductId::new("cement"),
            annual_production: dec!(100000),
            apr_dec_production: dec!(50000),
            allocations: vec![EmissionAllocation {
                category: EmissionCategory::StationaryCombustion,
                amount: basic_allocation,
            }],
        }],
        unattributed_emissions: Decimal::ZERO,
    }
}

fn fixture(basic_allocation: Decimal, fail_sync: bool) -> Fixture {
    let report_id = Uuid::new_v4();
    let mut reports = InMemoryReportProvider::new();
    reports.insert(cement_snapshot(report_id, basic_allocation));
    let reports = Arc::new(reports);

    let resolver = RegulatoryValueResolver::new(vec![RegulatoryRecord {
        scope: RegulatoryScope::Industry(NaicsCode::new("324110")),
        valid_from: CompliancePeriod::new(2024),
        valid_until: None,
        values: RegulatoryValues {
            reduction_factor: dec!(0.65),
            tightening_rate: dec!(0.01),
        },
    }]);

    let mut registry = InMemoryIntensityRegistry::new();
    registry.insert(ProductId::new("cement"), dec!(0.6262));

    let mut charge_rates = InMemoryChargeRates::new();
    charge_rates.insert(CompliancePeriod::new(2024), dec!(80));
    charge_rates.insert(CompliancePeriod::new(2025), dec!(95));

    let store = Arc::new(ComplianceStore::new());
    let adapter = Arc::new(RecordingAdapter::new(fail_sync));
    let retry_queue = Arc::new(SyncRetryQueue::new(100, 5));

    let lifecycle = ComplianceVersionLifecycle::new(
        store.clone(),
        reports.clone(),
        resolver,
        Arc::new(registry),
        Arc::new(charge_rates),
        adapter.clone(),
        retry_queue.clone(),
        Arc::new(LogNotifier::new()),
        EngineConfig::default(),
    );

    Fixture {
        lifecycle,
        store,
        adapter,
        retry_queue,
        reports,
        report_id,
    }
}

#[tokio::test]
async fn test_create_version_with_obligation() {
    let f = fixture(dec!(120001.0077), false);

    let version = f.lifecycle.create_version(f.report_id).await.unwrap();

    assert_eq!(
        version.status,
        ComplianceStatus::ObligationPendingInvoiceCreation
    );
    // Transition year: prorated allocation, Apr–Dec production
    assert_eq!(
        version.data.emissions_attributable_for_compliance,
        dec!(60000.5039)
    );
    assert_eq!(version.data.emissions_limit, dec!(20351.5000));
    assert_eq!(version.data.excess_emissions, dec!(39649.0039));

    let obligation = f.store.obligation_for_version(version.id).unwrap();
    // fee = excess * $80/t, currency-quantized
    assert_eq!(obligation.fee_amount, dec!(3171920.31));
    assert_eq!(
        obligation.deadline,
        NaiveDate::from_ymd_opt(2025, 11, 30).unwrap()
    );
    assert!(f.store.credit_for_version(version.id).is_none());

    // Synced exactly once, nothing queued for retry
    assert_eq!(f.adapter.synced.lock().unwrap().as_slice(), &[obligation.id]);
    assert!(f.retry_queue.is_empty().await);
}

#[tokio::test]
async fn test_create_version_with_earned_credits() {
    let f = fixture(dec!(10000), false);

    let version = f.lifecycle.create_version(f.report_id).await.unwrap();

    assert_eq!(version.status, ComplianceStatus::EarnedCredits);
    let credit = f.store.credit_for_version(version.id).unwrap();
    assert_eq!(credit.credited_amount, version.data.credited_emissions);
    assert!(f.store.obligation_for_version(version.id).is_none());
    assert_eq!(f.adapter.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_create_version_is_idempotent() {
    let f = fixture(dec!(120001.0077), false);

    f.lifecycle.create_version(f.report_id).await.unwrap();
    let err = f.lifecycle.create_version(f.report_id).await.unwrap_err();

    assert!(matches!(err, Error::Idempotency(_)));
    // No second companion record was ever created
    assert_eq!(f.adapter.calls.load(Ordering::SeqCst), 1);
    assert_eq!(f.store.versions_for_report(f.report_id).len(), 1);
}

#[tokio::test]
async fn test_sync_failure_queues_retry_without_rollback() {
    let f = fixture(dec!(120001.0077), true);

    let version = f.lifecycle.create_version(f.report_id).await.unwrap();

    // Local state committed despite the adapter failure
    let obligation = f.store.obligation_for_version(version.id).unwrap();
    assert_eq!(f.retry_queue.len().await, 1);
    assert_eq!(f.retry_queue.jobs().await[0].obligation_id, obligation.id);
}

#[tokio::test]
async fn test_supersession_replaces_obligation_for_new_total() {
    let f = fixture(dec!(120001.0077), false);

    let original = f.lifecycle.create_version(f.report_id).await.unwrap();
    let old_obligation = f.store.obligation_for_version(original.id).unwrap();

    // Corrected submission reports a lower allocation
    let mut reports = InMemoryReportProvider::new();
    reports.insert(cement_snapshot(f.report_id, dec!(100000)));
    // Rebuild the lifecycle against the corrected provider
    let f2 = Fixture {
        lifecycle: ComplianceVersionLifecycle::new(
            f.store.clone(),
            Arc::new(reports),
            RegulatoryValueResolver::new(vec![RegulatoryRecord {
                scope: RegulatoryScope::Industry(NaicsCode::new("324110")),
                valid_from: CompliancePeriod::new(2024),
                valid_until: None,
                values: RegulatoryValues {
                    reduction_factor: dec!(0.65),
                    tightening_rate: dec!(0.01),
                },
            }]),
            {
                let mut registry = InMemoryIntensityRegistry::new();
                registry.insert(ProductId::new("cement"), dec!(0.6262));
                Arc::new(registry)
            },
            {
                let mut charge_rates = InMemoryChargeRates::new();
                charge_rates.insert(CompliancePeriod::new(2024), dec!(80));
                Arc::new(charge_rates)
            },
            f.adapter.clone(),
            f.retry_queue.clone(),
            Arc::new(LogNotifier::new()),
            EngineConfig::default(),
        ),
        store: f.store.clone(),
        adapter: f.adapter.clone(),
        retry_queue: f.retry_queue.clone(),
        reports: f.reports.clone(),
        report_id: f.report_id,
    };

    let supplementary = f2
        .lifecycle
        .create_supplementary_version(f.report_id)
        .await
        .unwrap();

    // Exactly two versions; the original is superceded and linked
    let versions = f.store.versions_for_report(f.report_id);
    assert_eq!(versions.len(), 2);
    assert_eq!(
        f.store.version(original.id).unwrap().status,
        ComplianceStatus::Superceded
    );
    assert_eq!(supplementary.previous_version, Some(original.id));
    assert!(supplementary.is_supplementary);

    // Old un-invoiced obligation is gone; exactly one obligation exists,
    // sized by the new total (50000 allocated, limit 20351.50)
    assert!(f.store.obligation(old_obligation.id).is_none());
    let new_obligation = f.store.obligation_for_version(supplementary.id).unwrap();
    assert_eq!(
        new_obligation.fee_amount,
        (supplementary.data.excess_emissions * dec!(80)).round_dp(2)
    );
    assert!(supplementary.data.excess_emissions > Decimal::ZERO);

    // Delta is a display field
    assert_eq!(
        supplementary.excess_delta_from_previous,
        Some(supplementary.data.excess_emissions - original.data.excess_emissions)
    );
}

#[tokio::test]
async fn test_supersession_category_change_to_credits() {
    let f = fixture(dec!(120001.0077), false);
    let original = f.lifecycle.create_version(f.report_id).await.unwrap();

    // Corrected data comes in far below the limit
    let mut reports = InMemoryReportProvider::new();
    reports.insert(cement_snapshot(f.report_id, dec!(10000)));

    let lifecycle = ComplianceVersionLifecycle::new(
        f.store.clone(),
        Arc::new(reports),
        RegulatoryValueResolver::new(vec![RegulatoryRecord {
            scope: RegulatoryScope::Industry(NaicsCode::new("324110")),
            valid_from: CompliancePeriod::new(2024),
            valid_until: None,
            values: RegulatoryValues {
                reduction_factor: dec!(0.65),
                tightening_rate: dec!(0.01),
            },
        }]),
        {
            let mut registry = InMemoryIntensityRegistry::new();
            registry.insert(ProductId::new("cement"), dec!(0.6262));
            Arc::new(registry)
        },
        {
            let mut charge_rates = InMemoryChargeRates::new();
            charge_rates.insert(CompliancePeriod::new(2024), dec!(80));
            Arc::new(charge_rates)
        },
        f.adapter.clone(),
        f.retry_queue.clone(),
        Arc::new(LogNotifier::new()),
        EngineConfig::default(),
    );

    let supplementary = lifecycle
        .create_supplementary_version(f.report_id)
        .await
        .unwrap();

    assert_eq!(supplementary.status, ComplianceStatus::EarnedCredits);
    // Obligation deleted, credit created
    assert!(f.store.obligation_for_version(original.id).is_none());
    assert!(f.store.credit_for_version(supplementary.id).is_some());
    // The one sync call was for the original obligation
    assert_eq!(f.adapter.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_full_invoice_lifecycle_with_late_payment() {
    let f = fixture(dec!(120001.0077), false);
    let version = f.lifecycle.create_version(f.report_id).await.unwrap();
    let obligation = f.store.obligation_for_version(version.id).unwrap();

    let chain = InvoiceRuleChain::new();
    let due = obligation.deadline;
    let after_due = NaiveDate::from_ymd_opt(2025, 12, 15).unwrap();

    // 1. Ledger raises the invoice
    chain
        .handle(
            &f.store,
            &InvoiceSnapshot {
                obligation_id: obligation.id,
                invoice_ref: "INV-42".to_string(),
                is_penalty_invoice: false,
                outstanding_balance: obligation.fee_amount,
                due_date: due,
            },
            NaiveDate::from_ymd_opt(2025, 1, 20).unwrap(),
        )
        .unwrap();
    assert_eq!(
        f.store.version(version.id).unwrap().status,
        ComplianceStatus::ObligationNotMet
    );

    // 2. Deadline passes with a balance: penalty accrues
    chain
        .handle(
            &f.store,
            &InvoiceSnapshot {
                obligation_id: obligation.id,
                invoice_ref: "INV-42".to_string(),
                is_penalty_invoice: false,
                outstanding_balance: obligation.fee_amount,
                due_date: due,
            },
            after_due,
        )
        .unwrap();
    assert_eq!(
        f.store.obligation(obligation.id).unwrap().penalty_status,
        compliance_core::PenaltyStatus::Accruing
    );

    // 3. Paid late: fully met plus a penalty record
    let settlement = InvoiceSnapshot {
        obligation_id: obligation.id,
        invoice_ref: "INV-42".to_string(),
        is_penalty_invoice: false,
        outstanding_balance: Decimal::ZERO,
        due_date: due,
    };
    chain.handle(&f.store, &settlement, after_due).unwrap();
    assert_eq!(
        f.store.version(version.id).unwrap().status,
        ComplianceStatus::ObligationFullyMet
    );
    assert!(f.store.penalty_for_obligation(obligation.id).is_some());

    // Redelivered obligation settlement is a no-op; it must not settle the
    // separately-invoiced penalty
    assert_eq!(chain.handle(&f.store, &settlement, after_due).unwrap(), None);
    assert_eq!(
        f.store.obligation(obligation.id).unwrap().penalty_status,
        compliance_core::PenaltyStatus::NotPaid
    );

    // 4. Penalty invoice settled under its own reference
    chain
        .handle(
            &f.store,
            &InvoiceSnapshot {
                obligation_id: obligation.id,
                invoice_ref: "INV-43".to_string(),
                is_penalty_invoice: true,
                outstanding_balance: Decimal::ZERO,
                due_date: due,
            },
            after_due,
        )
        .unwrap();
    assert_eq!(
        f.store.obligation(obligation.id).unwrap().penalty_status,
        compliance_core::PenaltyStatus::Paid
    );
    assert_eq!(
        f.store
            .penalty_for_obligation(obligation.id)
            .unwrap()
            .invoice_ref
            .as_deref(),
        Some("INV-43")
    );
}
