//! Device-local timestamp encode/decode.
//!
//! The device has no notion of timezone; all timestamps are naive
//! local date-times packed into a single compact `u32`, or (for a few
//! commands) six raw bytes `YY MM DD HH mm ss` offset from year 2000.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use super::error::{Result, ZkError};

/// Encode a local date-time into the device's compact `u32` form.
pub fn encode_compact(dt: &NaiveDateTime) -> u32 {
    let yy = (dt.year() - 2000).max(0) as u32;
    let mm = dt.month() - 1;
    let dd = dt.day() - 1;
    (((yy * 12 + mm) * 31 + dd) * 86400) + dt.hour() * 3600 + dt.minute() * 60 + dt.second()
}

/// Decode the device's compact `u32` form back into a local date-time.
pub fn decode_compact(encoded: u32) -> Result<NaiveDateTime> {
    let mut v = encoded;
    let second = v % 60;
    v /= 60;
    let minute = v % 60;
    v /= 60;
    let hour = v % 24;
    v /= 24;
    let day = v % 31 + 1;
    v /= 31;
    let month = v % 12 + 1;
    v /= 12;
    let year = v as i32 + 2000;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .ok_or_else(|| ZkError::Protocol(format!("invalid compact timestamp {encoded:#010x}")))
}

/// Encode a local date-time into the 6-byte `YY MM DD HH mm ss` hex form.
pub fn encode_hex(dt: &NaiveDateTime) -> [u8; 6] {
    [
        (dt.year() - 2000).max(0) as u8,
        dt.month() as u8,
        dt.day() as u8,
        dt.hour() as u8,
        dt.minute() as u8,
        dt.second() as u8,
    ]
}

/// Decode the 6-byte `YY MM DD HH mm ss` hex form back into a local date-time.
pub fn decode_hex(bytes: [u8; 6]) -> Result<NaiveDateTime> {
    let [yy, mm, dd, hh, mi, ss] = bytes;
    NaiveDate::from_ymd_opt(i32::from(yy) + 2000, u32::from(mm), u32::from(dd))
        .and_then(|d| d.and_hms_opt(u32::from(hh), u32::from(mi), u32::from(ss)))
        .ok_or_else(|| ZkError::Protocol(format!("invalid hex timestamp {bytes:02x?}")))
}
