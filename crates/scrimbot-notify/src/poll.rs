// Weekly availability poll, posted on Saturdays for the following week.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Weekday};
use serde_json::{json, Value};

const DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
const POLL_DURATION_HOURS: u32 = 48;

/// The Monday..Sunday span a poll asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollWeek {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PollWeek {
    /// The week after the Saturday `posted_on`.
    pub fn following(posted_on: NaiveDate) -> Self {
        Self {
            start: posted_on + Duration::days(2),
            end: posted_on + Duration::days(8),
        }
    }

    pub fn question(&self) -> String {
        format!(
            "📅 Scrim Availability {} - {}",
            self.start.format("%d/%m"),
            self.end.format("%d/%m")
        )
    }

    /// Message body for the chat platform's poll API.
    pub fn payload(&self) -> Value {
        let answers: Vec<Value> = DAYS
            .iter()
            .map(|day| json!({"poll_media": {"text": day}}))
            .collect();
        json!({
            "poll": {
                "question": {"text": self.question()},
                "answers": answers,
                "allow_multiselect": true,
                "duration": POLL_DURATION_HOURS,
            }
        })
    }
}

/// Decides when the poll is due: Saturdays at or after `hour`, once per day.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    hour: u32,
    last_posted: Option<NaiveDate>,
}

impl PollSchedule {
    pub fn new(hour: u32) -> Self {
        Self {
            hour,
            last_posted: None,
        }
    }

    pub fn due(&self, now: NaiveDateTime) -> Option<PollWeek> {
        let today = now.date();
        let due = today.weekday() == Weekday::Sat
            && now.hour() >= self.hour
            && self.last_posted != Some(today);
        due.then(|| PollWeek::following(today))
    }

    pub fn mark_posted(&mut self, now: NaiveDateTime) {
        self.last_posted = Some(now.date());
    }
}
