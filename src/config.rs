use std::env;

use crate::error::{DashboardError, DashboardResult};
use crate::gaps::GapThresholds;

/// Named value ranges for each sheet the dashboard reads.
#[derive(Clone, Debug)]
pub struct RangeNames {
    pub targets: String,
    pub revenue: String,
    pub quality: String,
    pub gaps: String,
    pub key_mapping: String,
    pub funnel: String,
    pub data: String,
}

impl Default for RangeNames {
    fn default() -> Self {
        RangeNames {
            targets: "Targets!A2:Y".to_string(),
            revenue: "Dietitian Revenue!A2:T".to_string(),
            quality: "Dietitian Quality!A2:AB".to_string(),
            gaps: "Dietitian Gaps!A2:T".to_string(),
            key_mapping: "Key Mapping!C2:C".to_string(),
            funnel: "Funnel!A2:AD".to_string(),
            data: "Sheet1!A1:Z2000".to_string(),
        }
    }
}

/// Credentials for the sheets API. Token issuance belongs to the auth
/// collaborator; this backend only carries ready-to-use credentials - an API
/// key, or a pre-issued OAuth bearer token. At least one must be present.
#[derive(Clone, Debug, Default)]
pub struct SheetsCredentials {
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
}

/// Everything the dashboard needs to run, built once at startup and passed
/// in explicitly. The aggregation core never reads ambient configuration.
#[derive(Clone, Debug)]
pub struct DashboardConfig {
    pub sheet_id: String,
    pub credentials: SheetsCredentials,
    pub ranges: RangeNames,
    pub thresholds: GapThresholds,
    /// Inclusive cutoff for the underperformer report, in percent.
    pub underperformer_pct: f64,
    pub admin_email: String,
    /// Argon2 PHC hash of the admin password. Preferred over the plain
    /// variant when both are set.
    pub admin_password_hash: Option<String>,
    pub admin_password: Option<String>,
    pub cron_secret: Option<String>,
    pub bind_addr: String,
    pub fetch_timeout_secs: u64,
}

impl DashboardConfig {
    /// Load from the environment, failing fast on anything required. Called
    /// by the server binary before any row is fetched; the rest of the crate
    /// only ever sees the resulting struct.
    pub fn from_env() -> DashboardResult<Self> {
        let sheet_id = require("GOOGLE_SHEET_ID")?;
        let credentials = SheetsCredentials {
            api_key: optional("GOOGLE_API_KEY"),
            bearer_token: optional("GOOGLE_BEARER_TOKEN"),
        };
        if credentials.api_key.is_none() && credentials.bearer_token.is_none() {
            return Err(DashboardError::ConfigurationMissing(
                "GOOGLE_API_KEY or GOOGLE_BEARER_TOKEN",
            ));
        }

        let admin_email = require("ADMIN_EMAIL")?;
        let admin_password_hash = optional("ADMIN_PASSWORD_HASH");
        let admin_password = optional("ADMIN_PASSWORD");
        if admin_password_hash.is_none() && admin_password.is_none() {
            return Err(DashboardError::ConfigurationMissing(
                "ADMIN_PASSWORD_HASH or ADMIN_PASSWORD",
            ));
        }

        let mut ranges = RangeNames::default();
        override_range(&mut ranges.targets, "RANGE_TARGETS");
        override_range(&mut ranges.revenue, "RANGE_REVENUE");
        override_range(&mut ranges.quality, "RANGE_QUALITY");
        override_range(&mut ranges.gaps, "RANGE_GAPS");
        override_range(&mut ranges.key_mapping, "RANGE_KEY_MAPPING");
        override_range(&mut ranges.funnel, "RANGE_FUNNEL");
        override_range(&mut ranges.data, "RANGE_DATA");

        Ok(DashboardConfig {
            sheet_id,
            credentials,
            ranges,
            thresholds: GapThresholds::default(),
            underperformer_pct: 25.0,
            admin_email,
            admin_password_hash,
            admin_password,
            cron_secret: optional("CRON_SECRET"),
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3000".to_string()),
            fetch_timeout_secs: 10,
        })
    }
}

fn require(name: &'static str) -> DashboardResult<String> {
    optional(name).ok_or(DashboardError::ConfigurationMissing(name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn override_range(slot: &mut String, name: &str) {
    if let Some(value) = optional(name) {
        *slot = value;
    }
}
