use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}

/// Cell text the sheet emits for a lookup miss; treated as absent, never an error.
pub const NA_SENTINEL: &str = "#N/A";

/// One spreadsheet row: an ordered list of string cells.
///
/// Rows arrive ragged (trailing blank cells are simply not sent), so every
/// accessor treats an out-of-bounds index as an empty cell.
#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct RawRow(pub Vec<String>);

impl RawRow {
    pub fn new(cells: Vec<String>) -> Self {
        RawRow(cells)
    }

    pub fn from_strs(cells: &[&str]) -> Self {
        RawRow(cells.iter().map(|c| c.to_string()).collect())
    }

    /// Build a row from the JSON cell values the sheets API returns.
    /// Numbers and bools are stringified rather than rejected.
    pub fn from_values(cells: Vec<serde_json::Value>) -> Self {
        RawRow(
            cells
                .into_iter()
                .map(|value| match value {
                    serde_json::Value::String(s) => s,
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect(),
        )
    }

    pub fn cell(&self, index: usize) -> &str {
        self.0.get(index).map(String::as_str).unwrap_or("")
    }

    /// Trimmed cell text, `None` when blank. An empty-after-trim cell is
    /// absent, never an empty-string entity key.
    pub fn name(&self, index: usize) -> Option<&str> {
        parse_name(self.cell(index))
    }

    pub fn number(&self, index: usize) -> f64 {
        parse_number(self.cell(index))
    }

    /// Numeric cell that may carry the `#N/A` sentinel instead of a value.
    pub fn optional_count(&self, index: usize) -> Option<f64> {
        let cell = self.cell(index).trim();
        if cell == NA_SENTINEL {
            None
        } else {
            Some(parse_number(cell))
        }
    }
}

/// Total number parser for sheet cells: strips comma thousands separators
/// and surrounding whitespace, then parses as a decimal. Blank, `#N/A`, and
/// otherwise non-numeric cells parse to 0 - sparse sheets must never fail a
/// request.
pub fn parse_number(cell: &str) -> f64 {
    let cleaned = cell.replace([',', ' '], "");
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().unwrap_or(0.0)
}

pub fn parse_name(cell: &str) -> Option<&str> {
    let trimmed = cell.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

/// Lowercase a display name and collapse whitespace runs to single hyphens.
/// `"  Ananya   Singh "` and `"ananya singh"` produce the same slug.
pub fn slugify(name: &str) -> String {
    WHITESPACE_RUN
        .replace_all(name.trim(), "-")
        .to_lowercase()
}

/// Column positions for each configured sheet range.
///
/// The index-to-meaning mapping is sheet configuration, not computation;
/// keeping it here as named constants makes the mapping reviewable without
/// reading the aggregation code. Indices are zero-based offsets into the
/// fetched range (the letters note the sheet column for ranges that start
/// at column A).
pub mod layout {
    /// `Targets` sheet: four independent column groups, one per role.
    pub mod targets {
        pub const SM_NAME: usize = 0; // A
        pub const SM_SERVICE_TARGET: usize = 2; // C
        pub const SM_COMMERCE_TARGET: usize = 4; // E

        pub const M_NAME: usize = 6; // G
        pub const M_SERVICE_TARGET: usize = 7; // H
        pub const M_SM_NAME: usize = 8; // I
        pub const M_COMMERCE_TARGET: usize = 10; // K

        pub const AM_NAME: usize = 12; // M
        pub const AM_SERVICE_TARGET: usize = 13; // N
        pub const AM_MANAGER_NAME: usize = 14; // O
        pub const AM_SM_NAME: usize = 15; // P
        pub const AM_ROLE: usize = 17; // R
        pub const AM_COMMERCE_TARGET: usize = 19; // T

        pub const EM_NAME: usize = 21; // V
        pub const EM_SERVICE_TARGET: usize = 22; // W
        pub const EM_SM_NAME: usize = 23; // X
        pub const EM_ACTIVE_CLIENTS: usize = 24; // Y
    }

    /// Revenue sheet: one row per sale attribution, amounts per window.
    pub mod revenue {
        pub const EM_NAME: usize = 8; // I
        pub const FLAP_NAME: usize = 9; // J
        pub const AM_NAME: usize = 10; // K
        pub const M_NAME: usize = 11; // L
        pub const SM_NAME: usize = 12; // M

        pub const SERVICE_Y: usize = 14; // O
        pub const SERVICE_W: usize = 15; // P
        pub const SERVICE_M: usize = 16; // Q
        pub const COMMERCE_Y: usize = 17; // R
        pub const COMMERCE_W: usize = 18; // S
        pub const COMMERCE_M: usize = 19; // T
    }

    /// Quality sheet: one row per customer, shared by the quality and
    /// customer-rating engines.
    pub mod quality {
        pub const CUSTOMER_ID: usize = 0; // A
        pub const ACTIVE_CLIENTS: usize = 6; // G
        pub const EM_NAME: usize = 7; // H
        pub const FLAP_NAME: usize = 8; // I
        pub const AM_NAME: usize = 9; // J
        pub const M_NAME: usize = 10; // K
        pub const SM_NAME: usize = 11; // L

        pub const YTD_CSAT: usize = 21; // V ("y" is yesterday throughout)
        pub const WTD_CSAT: usize = 22; // W
        pub const LATEST_CSAT: usize = 23; // X
        pub const YTD_NPS: usize = 24; // Y
        pub const MTD_NPS: usize = 25; // Z
        pub const WEEKLY_WEIGHT_LOSS: usize = 26; // AA
        pub const MONTHLY_WEIGHT_LOSS: usize = 27; // AB
    }

    /// Gaps sheet: one row per field-worker.
    pub mod gaps {
        pub const WORKER_NAME: usize = 1; // B
        pub const DAYS_SINCE_JOINING: usize = 3; // D
        pub const SM_NAME: usize = 8; // I
        pub const SALES_TARGET: usize = 9; // J
        pub const SALES_ACHIEVED: usize = 10; // K
        pub const SALES_ZERO_DAYS: usize = 11; // L
        pub const EXCLUDE_FLAG: usize = 12; // M
        pub const SALES_PCT: usize = 15; // P
        pub const COMMERCE_TARGET: usize = 17; // R
        pub const COMMERCE_ACHIEVED: usize = 18; // S
        pub const COMMERCE_ZERO_DAYS: usize = 19; // T
    }

    /// Key-mapping sheet, fetched as the single exclusion column.
    pub mod key_mapping {
        pub const EXCLUDED_NAME: usize = 0; // C (range starts at C)
    }

    /// Funnel sheet: worker, attribution names, then eight tallies per
    /// window (yesterday / WTD / MTD).
    pub mod funnel {
        pub const WORKER_NAME: usize = 0; // A
        pub const EM_NAME: usize = 1; // B
        pub const FLAP_NAME: usize = 2; // C
        pub const AM_NAME: usize = 3; // D
        pub const M_NAME: usize = 4; // E
        pub const SM_NAME: usize = 5; // F

        pub const Y_BASE: usize = 6; // G..N
        pub const W_BASE: usize = 14; // O..V
        pub const M_BASE: usize = 22; // W..AD

        // Tally offsets from a window base column.
        pub const CALLS: usize = 0;
        pub const CONNECTED: usize = 1;
        pub const TALKTIME: usize = 2;
        pub const LEADS: usize = 3;
        pub const TOTAL_LINKS: usize = 4;
        pub const SALES_LINKS: usize = 5;
        pub const CONVERSIONS: usize = 6;
        pub const SALES_CONVERSIONS: usize = 7;
    }
}
