use serde::{Deserialize, Serialize};

/// Canonical contact row posted to the `contacts` table
///
/// Optional fields are left out of the JSON body entirely when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactRecord {
    /// Logging station callsign
    pub callsign: String,
    /// Worked station callsign (never empty)
    pub contacted_callsign: String,
    /// ISO 8601 date, YYYY-MM-DD
    pub qso_date: String,
    /// ISO 8601 time, HH:MM:SS
    pub time_on: String,
    pub operator_callsign: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Frequency in MHz
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rst_sent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rst_rcvd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gridsquare: Option<String>,
    /// `POINT(lon lat)` derived from `gridsquare`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_gridsquare: Option<String>,
    /// `POINT(lon lat)` derived from `my_gridsquare`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_location: Option<String>,
    /// Original ADIF text, kept for auditing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_adif: Option<String>,
}

impl ContactRecord {
    /// Short human summary used in log lines
    pub fn summary(&self) -> String {
        format!(
            "{} on {} {}",
            self.contacted_callsign,
            self.band.as_deref().unwrap_or("?"),
            self.mode.as_deref().unwrap_or("?")
        )
    }
}
