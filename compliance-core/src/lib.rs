//! Compliance Determination Engine — core calculations
//!
//! Computes, per regulated product, how many tonnes of CO2-equivalent an
//! operation is permitted to emit versus how many it reported, using
//! effective-dated regulatory parameters.
//!
//! # Pipeline
//!
//! 1. **Resolver**: effective reduction factor / tightening rate for the
//!    compliance period (industry default, optional product override)
//! 2. **Aggregator**: per-product emission allocations split into
//!    compliance-relevant, reporting-only, and industrial-process categories
//! 3. **Calculator**: per-product emission limit, with the 2024 partial-year
//!    prorating rule
//! 4. **Determiner**: aggregate totals, excess/credited emissions, status
//!
//! All arithmetic is on fixed-point decimals; rounding (half-up, 4 places
//! for emissions, 2 for currency) is applied only at persistence and
//! presentation boundaries.
//!
//! # Example
//!
//! ```no_run
//! use compliance_core::{determiner, EngineConfig, RegulatoryValueResolver};
//! use compliance_core::providers::{InMemoryIntensityRegistry, InMemoryReportProvider, ReportDataProvider};
//!
//! # fn run(resolver: RegulatoryValueResolver,
//! #        reports: InMemoryReportProvider,
//! #        registry: InMemoryIntensityRegistry,
//! #        report_id: uuid::Uuid) -> compliance_core::Result<()> {
//! let config = EngineConfig::default();
//! let snapshot = reports.report_snapshot(report_id)?;
//! let data = determiner::determine(&snapshot, &resolver, &registry, &config)?;
//! println!("excess {} credited {}", data.excess_emissions, data.credited_emissions);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod allocation;
pub mod calculator;
pub mod config;
pub mod determiner;
pub mod error;
pub mod providers;
pub mod regulatory;
pub mod types;

// Re-exports
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use regulatory::{RegulatoryRecord, RegulatoryScope, RegulatoryValueResolver};
pub use types::*;
