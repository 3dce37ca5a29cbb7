// Enrichment records: roster players, champion mastery, and team reputation.
// None of this participates in reconciliation; it is display data.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Champion {
    pub name: String,
    pub level: u32,
    pub points: u64,
    pub image_url: String,
}

/// A player on a team roster.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    /// Rank label including division, e.g. `"Gold II"`.
    pub rank: String,
    pub tag: String,
    pub puuid: String,
    /// Game server shard (`NA`, `EUW`, ...).
    pub server: String,
    pub champions: Vec<Champion>,
    pub is_sub: bool,
    pub last_updated: Option<NaiveDateTime>,
}

/// Average response time in seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseTime(pub u64);

impl ResponseTime {
    /// Coarse human bucket, matching the labels the service shows.
    pub fn bucket(self) -> &'static str {
        const BUCKETS: [(u64, &str); 10] = [
            (30, "Seconds"),
            (75, "A Minute"),
            (300, "A Few Minutes"),
            (2700, "Many Minutes"),
            (5040, "An Hour"),
            (8280, "Two Hours"),
            (16000, "A Few Hours"),
            (60000, "Many Hours"),
            (112320, "A Day"),
            (190080, "Two Days"),
        ];
        BUCKETS
            .iter()
            .find(|(limit, _)| self.0 < *limit)
            .map(|(_, label)| *label)
            .unwrap_or("Too Many Days")
    }
}

/// Trust signals the scheduling service publishes for a team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reputation {
    pub gank_rep: f64,
    pub likes: u32,
    pub dislikes: u32,
    pub response_time: ResponseTime,
    pub response_rate: f64,
    pub cancellation_rate: f64,
    pub communication: f64,
    pub behavior: f64,
    pub on_time: f64,
    pub reviews: Vec<String>,
}
