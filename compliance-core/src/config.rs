//! Configuration for the compliance engine

use serde::{Deserialize, Serialize};

use crate::types::CompliancePeriod;

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// First compliance period of the program; the tightening rate ratchets
    /// against this year
    pub initial_period: CompliancePeriod,

    /// The single transition period for which partial-year (Apr–Dec) figures
    /// substitute for full-year ones
    pub partial_year_period: CompliancePeriod,

    /// Month of the statutory obligation deadline (in the year after the
    /// compliance period)
    pub obligation_deadline_month: u32,

    /// Day of the statutory obligation deadline
    pub obligation_deadline_day: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_period: CompliancePeriod::new(2024),
            partial_year_period: CompliancePeriod::new(2024),
            obligation_deadline_month: 11, // November 30 of the following year
            obligation_deadline_day: 30,
        }
    }
}

impl EngineConfig {
    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config: {}", e)))?;
        let config: EngineConfig = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = EngineConfig::default();

        if let Ok(year) = std::env::var("COMPLIANCE_INITIAL_PERIOD") {
            let year: i32 = year
                .parse()
                .map_err(|e| crate::Error::Config(format!("Bad initial period: {}", e)))?;
            config.initial_period = CompliancePeriod::new(year);
        }

        if let Ok(year) = std::env::var("COMPLIANCE_PARTIAL_YEAR_PERIOD") {
            let year: i32 = year
                .parse()
                .map_err(|e| crate::Error::Config(format!("Bad partial-year period: {}", e)))?;
            config.partial_year_period = CompliancePeriod::new(year);
        }

        if let Ok(month) = std::env::var("COMPLIANCE_OBLIGATION_DEADLINE_MONTH") {
            config.obligation_deadline_month = month
                .parse()
                .map_err(|e| crate::Error::Config(format!("Bad deadline month: {}", e)))?;
        }

        if let Ok(day) = std::env::var("COMPLIANCE_OBLIGATION_DEADLINE_DAY") {
            config.obligation_deadline_day = day
                .parse()
                .map_err(|e| crate::Error::Config(format!("Bad deadline day: {}", e)))?;
        }

        Ok(config)
    }

    /// True when the partial-year substitution applies to `period`
    pub fn is_partial_year(&self, period: CompliancePeriod) -> bool {
        period == self.partial_year_period
    }
}
