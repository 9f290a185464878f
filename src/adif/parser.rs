// ADIF Tokenizer
// Handles the flat <FIELD:LENGTH>VALUE subset sent by loggers over UDP
// and found in exported .adi files.

use std::collections::HashMap;

/// Fields of a single ADIF record (one QSO)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    /// All fields as key-value pairs (uppercase keys)
    pub fields: HashMap<String, String>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self { fields: HashMap::new() }
    }

    /// Get a field value (case-insensitive lookup)
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(&key.to_uppercase()).map(|s| s.as_str())
    }

    /// Check if a field exists
    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(&key.to_uppercase())
    }

    /// Store a field, replacing any earlier value under the same name
    pub fn insert(&mut self, name: &str, value: &str) {
        self.fields.insert(name.to_uppercase(), value.trim().to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn call(&self) -> Option<&str> { self.get("CALL") }
    pub fn band(&self) -> Option<&str> { self.get("BAND") }
    pub fn mode(&self) -> Option<&str> { self.get("MODE") }
    pub fn qso_date(&self) -> Option<&str> { self.get("QSO_DATE") }
    pub fn time_on(&self) -> Option<&str> { self.get("TIME_ON") }
    pub fn freq(&self) -> Option<&str> { self.get("FREQ") }
    pub fn gridsquare(&self) -> Option<&str> { self.get("GRIDSQUARE") }
    pub fn my_gridsquare(&self) -> Option<&str> { self.get("MY_GRIDSQUARE") }
    pub fn station_callsign(&self) -> Option<&str> { self.get("STATION_CALLSIGN") }
}

/// Tokenize ADIF text into a FieldSet.
///
/// Never fails: malformed descriptors are skipped, a declared length running
/// past the end of the buffer is truncated, and an unterminated `<` ends the
/// scan with whatever was collected so far.
pub fn tokenize(content: &str) -> FieldSet {
    let mut set = FieldSet::new();
    let bytes = content.as_bytes();
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'<' {
            pos += 1;
            continue;
        }

        // Find matching '>'
        let tag_end = match bytes[pos + 1..].iter().position(|&b| b == b'>') {
            Some(offset) => pos + 1 + offset,
            None => break,
        };

        // Descriptor: NAME:LENGTH or NAME:LENGTH:TYPE
        let descriptor = String::from_utf8_lossy(&bytes[pos + 1..tag_end]);
        let mut parts = descriptor.split(':');
        let name = parts.next().unwrap_or_default();
        let length = match parts.next().map(|l| l.trim().parse::<usize>()) {
            Some(Ok(length)) => length,
            // <EOR>, <EOH> or a bad length
            _ => {
                pos = tag_end + 1;
                continue;
            }
        };

        let value_start = tag_end + 1;
        let value_end = value_start.saturating_add(length).min(bytes.len());
        let value = String::from_utf8_lossy(&bytes[value_start..value_end]);
        set.insert(name, &value);

        pos = value_end;
    }

    set
}

/// Split an ADIF document into the raw text of each record.
///
/// A header terminated by `<EOH>` is dropped, records are separated by
/// `<EOR>` (any case) and blank records are skipped.
pub fn split_records(content: &str) -> Vec<&str> {
    // ASCII uppercasing keeps byte offsets aligned with `content`
    let upper = content.to_ascii_uppercase();

    let body_start = upper.find("<EOH>").map(|eoh| eoh + 5).unwrap_or(0);

    let mut records = Vec::new();
    let mut current = body_start;

    while current < content.len() {
        let record_end = match upper[current..].find("<EOR>") {
            Some(offset) => current + offset,
            None => content.len(),
        };

        let record = &content[current..record_end];
        if !record.trim().is_empty() {
            records.push(record);
        }

        current = record_end + 5;
    }

    records
}
