// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Timestamp representation.
//!
//! Containers store timestamps as signed 64-bit nanosecond counts. Public
//! APIs expose them as a `(sec, nsec)` pair; conversions in both directions
//! are exact integer arithmetic.

use std::fmt;
use std::ops::{Add, Sub};
use std::time::Duration;

use serde::{Deserialize, Serialize};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// A point in time as seconds plus nanoseconds since the Unix epoch.
///
/// `nsec` is always below one second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Time {
    /// Whole seconds
    pub sec: i64,
    /// Nanoseconds within the second
    pub nsec: u32,
}

impl Time {
    /// The Unix epoch.
    pub const ZERO: Time = Time { sec: 0, nsec: 0 };

    /// Create a time, carrying excess nanoseconds into seconds.
    pub fn new(sec: i64, nsec: u32) -> Self {
        let carry = (nsec as u64 / NANOS_PER_SEC) as i64;
        Self {
            sec: sec.saturating_add(carry),
            nsec: (nsec as u64 % NANOS_PER_SEC) as u32,
        }
    }

    /// Convert a nanosecond count into a time.
    pub fn from_nanos(nanos: u64) -> Self {
        Self {
            sec: (nanos / NANOS_PER_SEC) as i64,
            nsec: (nanos % NANOS_PER_SEC) as u32,
        }
    }

    /// Convert to a nanosecond count.
    ///
    /// Times before the epoch clamp to 0 and times past `u64::MAX`
    /// nanoseconds clamp to `u64::MAX`.
    pub fn to_nanos(&self) -> u64 {
        if self.sec < 0 {
            return 0;
        }
        (self.sec as u64)
            .checked_mul(NANOS_PER_SEC)
            .and_then(|n| n.checked_add(self.nsec as u64))
            .unwrap_or(u64::MAX)
    }

    /// Whether `self` lies in `[start, end]`.
    pub fn is_in_range_inclusive(&self, start: Time, end: Time) -> bool {
        *self >= start && *self <= end
    }
}

impl Add<Duration> for Time {
    type Output = Time;

    fn add(self, rhs: Duration) -> Time {
        let nanos = self.nsec as u64 + rhs.subsec_nanos() as u64;
        let carry = (nanos / NANOS_PER_SEC) as i64;
        let secs = i64::try_from(rhs.as_secs()).unwrap_or(i64::MAX);
        Time {
            sec: self.sec.saturating_add(secs).saturating_add(carry),
            nsec: (nanos % NANOS_PER_SEC) as u32,
        }
    }
}

impl Sub<Duration> for Time {
    type Output = Time;

    fn sub(self, rhs: Duration) -> Time {
        let this = Time::new(self.sec, self.nsec);
        let secs = i64::try_from(rhs.as_secs()).unwrap_or(i64::MAX);
        let mut sec = this.sec.saturating_sub(secs);
        let mut nsec = this.nsec as i64 - rhs.subsec_nanos() as i64;
        if nsec < 0 {
            nsec += NANOS_PER_SEC as i64;
            sec = sec.saturating_sub(1);
        }
        Time::new(sec, nsec as u32)
    }
}

impl From<u64> for Time {
    fn from(nanos: u64) -> Self {
        Time::from_nanos(nanos)
    }
}

impl fmt::Display for Time {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.sec, self.nsec)
    }
}
