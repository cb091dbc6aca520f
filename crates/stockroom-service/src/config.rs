//! # Service Configuration
//!
//! Settings the use cases read at runtime.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`STOCKROOM_*`)
//! 2. Defaults (this file)
//!
//! ## Thread Safety
//! Configuration is read-only after initialization, so no mutex needed.

use serde::{Deserialize, Serialize};

use stockroom_core::TaxRate;

/// Service configuration.
///
/// The tax rate lives here and nowhere else: order flows receive it as a
/// parameter, so no literal rate appears anywhere in the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceConfig {
    /// Tax rate applied to sales, in basis points.
    /// e.g. 1800 = 18%. Default: 1800
    pub default_tax_rate_bps: u32,

    /// Series used for sale documents when the caller does not name one.
    /// Default: "B001"
    pub default_series: String,

    /// Row cap for list operations.
    /// Default: 100
    pub list_limit: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            default_tax_rate_bps: 1800,
            default_series: "B001".to_string(),
            list_limit: 100,
        }
    }
}

impl ServiceConfig {
    /// Loads configuration from the environment, falling back to defaults
    /// for anything unset or unparseable.
    ///
    /// ## Variables
    /// - `STOCKROOM_TAX_RATE_BPS`
    /// - `STOCKROOM_DEFAULT_SERIES`
    /// - `STOCKROOM_LIST_LIMIT`
    pub fn from_env() -> Self {
        let defaults = ServiceConfig::default();

        let default_tax_rate_bps = std::env::var("STOCKROOM_TAX_RATE_BPS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.default_tax_rate_bps);

        let default_series = std::env::var("STOCKROOM_DEFAULT_SERIES")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.default_series);

        let list_limit = std::env::var("STOCKROOM_LIST_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.list_limit);

        ServiceConfig {
            default_tax_rate_bps,
            default_series,
            list_limit,
        }
    }

    /// The configured tax rate as a typed value.
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.default_tax_rate_bps)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
