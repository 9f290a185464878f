//! Record normalization
//!
//! Turns a tokenized ADIF FieldSet into the ContactRecord posted upstream.
//! `CALL` is the only hard requirement; every other field is best-effort
//! and simply left out when it is missing or can't be derived.

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::record::ContactRecord;
use super::time_utils::{adif_date, adif_time, format_qso_date, format_time_on};
use crate::adif::{tokenize, FieldSet};
use crate::reference::grid_to_point;

/// Fallback when neither config nor ADIF names the logging station
pub const UNKNOWN_CALLSIGN: &str = "UNKNOWN";

/// Source of "now" for QSOs that arrive without a date or time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock in UTC
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Why a record was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("No ADIF fields parsed")]
    NoFields,
    #[error("Missing CALL field in ADIF")]
    MissingCall,
}

/// Builds ContactRecords from ADIF text
#[derive(Debug, Clone)]
pub struct Normalizer<C = SystemClock> {
    operator_callsign: Option<String>,
    clock: C,
}

impl Normalizer<SystemClock> {
    pub fn new(operator_callsign: Option<String>) -> Self {
        Self::with_clock(operator_callsign, SystemClock)
    }
}

impl<C: Clock> Normalizer<C> {
    pub fn with_clock(operator_callsign: Option<String>, clock: C) -> Self {
        // An empty configured callsign counts as unset
        let operator_callsign = operator_callsign
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Self { operator_callsign, clock }
    }

    /// Tokenize and normalize one ADIF record
    pub fn normalize(&self, adif: &str) -> Result<ContactRecord, NormalizeError> {
        let fields = tokenize(adif);
        self.normalize_fields(&fields, adif)
    }

    /// Normalize an already tokenized record; `raw_adif` is kept verbatim
    pub fn normalize_fields(
        &self,
        fields: &FieldSet,
        raw_adif: &str,
    ) -> Result<ContactRecord, NormalizeError> {
        if fields.is_empty() {
            return Err(NormalizeError::NoFields);
        }

        let contacted_callsign = match fields.call() {
            Some(call) if !call.is_empty() => call.to_string(),
            _ => return Err(NormalizeError::MissingCall),
        };

        let station_call = self
            .operator_callsign
            .as_deref()
            .or_else(|| fields.station_callsign().filter(|c| !c.is_empty()))
            .unwrap_or(UNKNOWN_CALLSIGN)
            .to_string();

        let now = self.clock.now();
        let qso_date = match fields.qso_date() {
            Some(date) => format_qso_date(date),
            None => format_qso_date(&adif_date(now)),
        };
        let time_on = match fields.time_on() {
            Some(time) => format_time_on(time),
            None => format_time_on(&adif_time(now)),
        };

        let frequency = fields.freq().and_then(|freq| match freq.trim().parse::<f64>() {
            Ok(mhz) if mhz.is_finite() => Some(mhz),
            _ => {
                log::debug!("Ignoring unparseable FREQ '{}' for {}", freq, contacted_callsign);
                None
            }
        });

        let gridsquare = fields.gridsquare().map(str::to_string);
        let location = gridsquare.as_deref().and_then(geocode);
        let my_gridsquare = fields.my_gridsquare().map(str::to_string);
        let my_location = my_gridsquare.as_deref().and_then(geocode);

        Ok(ContactRecord {
            callsign: station_call.clone(),
            contacted_callsign,
            qso_date,
            time_on,
            operator_callsign: station_call,
            band: fields.band().map(str::to_string),
            mode: fields.mode().map(str::to_string),
            frequency,
            rst_sent: fields.get("RST_SENT").map(str::to_string),
            rst_rcvd: fields.get("RST_RCVD").map(str::to_string),
            gridsquare,
            location,
            my_gridsquare,
            my_location,
            raw_adif: Some(raw_adif.to_string()),
        })
    }
}

fn geocode(grid: &str) -> Option<String> {
    let point = grid_to_point(grid);
    if point.is_none() {
        log::warn!("Failed to geocode grid square '{}'", grid);
    }
    point
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn normalizer(operator: Option<&str>) -> Normalizer<FixedClock> {
        let now = Utc.with_ymd_and_hms(2026, 1, 3, 15, 26, 7).unwrap();
        Normalizer::with_clock(operator.map(str::to_string), FixedClock(now))
    }

    #[test]
    fn test_end_to_end_datagram() {
        let adif = "<CALL:4>W1AW<QSO_DATE:8>20240101<TIME_ON:6>120000<EOR>";
        let record = normalizer(None).normalize(adif).unwrap();
        assert_eq!(record.contacted_callsign, "W1AW");
        assert_eq!(record.qso_date, "2024-01-01");
        assert_eq!(record.time_on, "12:00:00");
        assert_eq!(record.raw_adif.as_deref(), Some(adif));
    }

    #[test]
    fn test_missing_call_rejected() {
        let n = normalizer(Some("K1ABC"));
        assert_eq!(n.normalize(""), Err(NormalizeError::NoFields));
        assert_eq!(n.normalize("garbage without tags"), Err(NormalizeError::NoFields));
        assert_eq!(
            n.normalize("<BAND:3>20m<MODE:3>FT8<GRIDSQUARE:4>FN31"),
            Err(NormalizeError::MissingCall)
        );
        assert_eq!(n.normalize("<CALL:0><BAND:3>20m"), Err(NormalizeError::MissingCall));
    }

    #[test]
    fn test_date_time_reformatting() {
        let n = normalizer(None);
        let r = n.normalize("<CALL:4>W1AW<QSO_DATE:8>20240115<TIME_ON:4>1230").unwrap();
        assert_eq!(r.qso_date, "2024-01-15");
        assert_eq!(r.time_on, "12:30:00");

        let r = n.normalize("<CALL:4>W1AW<TIME_ON:6>123045").unwrap();
        assert_eq!(r.time_on, "12:30:45");

        // Unexpected lengths pass through untouched
        let r = n.normalize("<CALL:4>W1AW<QSO_DATE:6>240115<TIME_ON:3>123").unwrap();
        assert_eq!(r.qso_date, "240115");
        assert_eq!(r.time_on, "123");
    }

    #[test]
    fn test_missing_date_time_uses_clock() {
        let r = normalizer(None).normalize("<CALL:4>W1AW").unwrap();
        assert_eq!(r.qso_date, "2026-01-03");
        assert_eq!(r.time_on, "15:26:07");
    }

    #[test]
    fn test_frequency_parsing() {
        let n = normalizer(None);
        let r = n.normalize("<CALL:4>W1AW<FREQ:6>14.250").unwrap();
        assert_eq!(r.frequency, Some(14.25));

        let r = n.normalize("<CALL:4>W1AW<FREQ:10>notanumber<BAND:3>20m").unwrap();
        assert_eq!(r.frequency, None);
        assert_eq!(r.band.as_deref(), Some("20m"));

        let r = n.normalize("<CALL:4>W1AW<FREQ:3>NaN").unwrap();
        assert_eq!(r.frequency, None);
    }

    #[test]
    fn test_station_callsign_fallbacks() {
        let adif = "<CALL:4>W1AW<STATION_CALLSIGN:5>N0XYZ";

        let r = normalizer(Some("K1ABC")).normalize(adif).unwrap();
        assert_eq!(r.callsign, "K1ABC");
        assert_eq!(r.operator_callsign, "K1ABC");

        let r = normalizer(None).normalize(adif).unwrap();
        assert_eq!(r.callsign, "N0XYZ");
        assert_eq!(r.operator_callsign, "N0XYZ");

        let r = normalizer(Some("  ")).normalize("<CALL:4>W1AW").unwrap();
        assert_eq!(r.callsign, UNKNOWN_CALLSIGN);
        assert_eq!(r.operator_callsign, UNKNOWN_CALLSIGN);
    }

    #[test]
    fn test_optional_fields_copied() {
        let adif = "<CALL:4>W1AW<BAND:3>20m<MODE:3>FT8<RST_SENT:3>-10<RST_RCVD:3>+02";
        let r = normalizer(None).normalize(adif).unwrap();
        assert_eq!(r.band.as_deref(), Some("20m"));
        assert_eq!(r.mode.as_deref(), Some("FT8"));
        assert_eq!(r.rst_sent.as_deref(), Some("-10"));
        assert_eq!(r.rst_rcvd.as_deref(), Some("+02"));
        assert_eq!(r.gridsquare, None);
        assert_eq!(r.location, None);
    }

    #[test]
    fn test_gridsquare_geocoded() {
        let adif = "<CALL:4>W1AW<GRIDSQUARE:4>FN42<MY_GRIDSQUARE:6>FN31pr";
        let r = normalizer(None).normalize(adif).unwrap();
        assert_eq!(r.gridsquare.as_deref(), Some("FN42"));
        assert_eq!(r.location.as_deref(), Some("POINT(-72.0 42.0)"));
        assert_eq!(r.my_gridsquare.as_deref(), Some("FN31pr"));
        assert!(r.my_location.as_deref().unwrap().starts_with("POINT(-72.75 41.7"));
    }

    #[test]
    fn test_bad_gridsquare_keeps_record() {
        let adif = "<CALL:4>W1AW<GRIDSQUARE:3>RRR<MY_GRIDSQUARE:2>XY";
        let r = normalizer(None).normalize(adif).unwrap();
        assert_eq!(r.gridsquare.as_deref(), Some("RRR"));
        assert_eq!(r.location, None);
        assert_eq!(r.my_gridsquare.as_deref(), Some("XY"));
        assert_eq!(r.my_location, None);
    }
}
