// The scrim entity and its two identity notions.

use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::format::ScrimFormat;
use super::team::Opponent;

/// Minutes per game the scheduling service keeps a booked slot visible after
/// its start time.
pub const REMOVAL_MINUTES_PER_GAME: i64 = 40;

/// The loose identity of a scrim: one calendar slot in one format, regardless
/// of who fills it or whether it is still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot {
    pub time: NaiveDateTime,
    pub format: ScrimFormat,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.format, self.time.format("%m/%d/%y %I:%M %p"))
    }
}

/// A scrim request or booking as reported by the scheduling service.
///
/// `Scrim` has no `PartialEq`. Use [`Scrim::same_slot`] (or key
/// collections by [`Scrim::slot`]) when asking "is this the same scrim", and
/// [`Scrim::equals_exact`] when every observable field must match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scrim {
    /// Scheduled start, naive local time.
    pub time: NaiveDateTime,
    pub format: ScrimFormat,
    pub opponent: Opponent,
    /// `true` while the request is outstanding, `false` once booked.
    pub open: bool,
    /// The service's identifier for the underlying event; 0 when unknown.
    pub gankster_id: u64,
}

impl Scrim {
    /// An outstanding request with no opponent yet.
    pub fn open(time: NaiveDateTime, format: ScrimFormat) -> Self {
        Self {
            time,
            format,
            opponent: Opponent::Unknown,
            open: true,
            gankster_id: 0,
        }
    }

    /// A confirmed booking against `opponent`.
    pub fn booked(time: NaiveDateTime, format: ScrimFormat, opponent: Opponent) -> Self {
        Self {
            time,
            format,
            opponent,
            open: false,
            gankster_id: 0,
        }
    }

    /// An open request that names an opponent, e.g. one received from or sent
    /// to another team.
    pub fn request(time: NaiveDateTime, format: ScrimFormat, opponent: Opponent) -> Self {
        Self {
            open: true,
            ..Self::booked(time, format, opponent)
        }
    }

    pub fn with_gankster_id(mut self, id: u64) -> Self {
        self.gankster_id = id;
        self
    }

    pub fn slot(&self) -> Slot {
        Slot {
            time: self.time,
            format: self.format,
        }
    }

    /// Loose identity: same start time and format.
    pub fn same_slot(&self, other: &Scrim) -> bool {
        self.time == other.time && self.format == other.format
    }

    /// Exact identity: same slot, same opponent, same open/booked state.
    pub fn equals_exact(&self, other: &Scrim) -> bool {
        self.same_slot(other) && self.opponent == other.opponent && self.open == other.open
    }

    /// Scheduled end: one hour per game after the start.
    pub fn end_time(&self) -> NaiveDateTime {
        self.time + Duration::hours(i64::from(self.format.games()))
    }

    /// When the service stops listing the slot: 40 minutes per game after the
    /// start.
    pub fn removal_time(&self) -> NaiveDateTime {
        self.time + Duration::minutes(REMOVAL_MINUTES_PER_GAME * i64::from(self.format.games()))
    }

    pub fn start_millis(&self) -> i64 {
        naive_to_millis(self.time)
    }

    pub fn end_millis(&self) -> i64 {
        naive_to_millis(self.end_time())
    }
}

impl fmt::Display for Scrim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.open { "open" } else { "booked" };
        write!(
            f,
            "{} vs {} ({state})",
            self.slot(),
            self.opponent.display_name()
        )
    }
}

/// Convert epoch milliseconds from the service into naive local time.
pub fn datetime_from_millis(millis: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis).map(|dt| dt.with_timezone(&Local).naive_local())
}

/// Convert naive local time into epoch milliseconds. Times that fall into a
/// DST gap are interpreted as UTC.
pub fn naive_to_millis(time: NaiveDateTime) -> i64 {
    Local
        .from_local_datetime(&time)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| time.and_utc().timestamp_millis())
}
