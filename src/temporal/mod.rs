//! Temporal module - Date encodings found in API payloads
//!
//! The bank API uses two textual encodings:
//! - Offset timestamps with millisecond precision (`2021-06-15T10:30:00.123+03:00`)
//! - Calendar dates without a time of day (`2021-06-15`), which are only
//!   meaningful in the API's own timezone
//!
//! The timezone is resolved lazily, once per process, through a
//! [`TimezoneResolver`].

mod decode;
mod timezone;

pub use decode::{Date, DateTimeMilliOffset, TemporalError};
pub use timezone::{api_timezone, TimezoneError, TimezoneResolver, API_TIMEZONE};
