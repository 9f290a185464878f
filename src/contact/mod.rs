//! Contact records
//!
//! - `record` - The ContactRecord row sent to the data store
//! - `normalize` - FieldSet → ContactRecord conversion
//! - `time_utils` - ADIF date/time reformatting

pub mod normalize;
pub mod record;
pub mod time_utils;

pub use normalize::{Clock, FixedClock, NormalizeError, Normalizer, SystemClock, UNKNOWN_CALLSIGN};
pub use record::ContactRecord;
