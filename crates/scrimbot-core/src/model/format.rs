// Scrim formats offered by the scheduling service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a scrim block: either a best-of series or a fixed game count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScrimFormat {
    BestOf1,
    BestOf2,
    BestOf3,
    BestOf4,
    BestOf5,
    Games1,
    Games2,
    Games3,
    Games4,
    Games5,
    None,
}

/// Immutable labels and codes attached to each format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    pub short: &'static str,
    pub long: &'static str,
    pub games: u32,
    pub gankster_code: &'static str,
}

const fn info(
    short: &'static str,
    long: &'static str,
    gankster_code: &'static str,
    games: u32,
) -> FormatInfo {
    FormatInfo {
        short,
        long,
        games,
        gankster_code,
    }
}

impl ScrimFormat {
    /// Every format, in declaration order.
    pub const ALL: [ScrimFormat; 11] = [
        ScrimFormat::BestOf1,
        ScrimFormat::BestOf2,
        ScrimFormat::BestOf3,
        ScrimFormat::BestOf4,
        ScrimFormat::BestOf5,
        ScrimFormat::Games1,
        ScrimFormat::Games2,
        ScrimFormat::Games3,
        ScrimFormat::Games4,
        ScrimFormat::Games5,
        ScrimFormat::None,
    ];

    pub fn info(self) -> FormatInfo {
        match self {
            ScrimFormat::BestOf1 => info("Bo1", "Best of One", "BO1", 1),
            ScrimFormat::BestOf2 => info("Bo2", "Best of Two", "BO2", 2),
            ScrimFormat::BestOf3 => info("Bo3", "Best of Three", "BO3", 3),
            ScrimFormat::BestOf4 => info("Bo4", "Best of Four", "BO4", 4),
            ScrimFormat::BestOf5 => info("Bo5", "Best of Five", "BO5", 5),
            ScrimFormat::Games1 => info("1 Game", "One Game", "G1", 1),
            ScrimFormat::Games2 => info("2 Games", "Two Games", "G2", 2),
            ScrimFormat::Games3 => info("3 Games", "Three Games", "G3", 3),
            ScrimFormat::Games4 => info("4 Games", "Four Games", "G4", 4),
            ScrimFormat::Games5 => info("5 Games", "Five Games", "G5", 5),
            ScrimFormat::None => info("None", "None", "None", 0),
        }
    }

    pub fn short(self) -> &'static str {
        self.info().short
    }

    pub fn long(self) -> &'static str {
        self.info().long
    }

    /// Number of games played in this block (upper bound for best-of series).
    pub fn games(self) -> u32 {
        self.info().games
    }

    /// Format code used on the scheduling service's wire format (`format.bestOf`).
    pub fn gankster_code(self) -> &'static str {
        self.info().gankster_code
    }

    /// Parse a short label such as `"Bo3"` or `"2 Games"`. Returns `None` for
    /// unknown input; callers must validate.
    pub fn from_short(short: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.short() == short)
    }

    pub fn from_long(long: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.long() == long)
    }

    pub fn from_gankster_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.gankster_code() == code)
    }

    /// Lenient parser for user input: accepts the short label, the service
    /// code, or the long label, ignoring ASCII case.
    pub fn parse_user(input: &str) -> Option<Self> {
        let input = input.trim();
        Self::ALL.into_iter().find(|f| {
            f.short().eq_ignore_ascii_case(input)
                || f.gankster_code().eq_ignore_ascii_case(input)
                || f.long().eq_ignore_ascii_case(input)
        })
    }
}

impl fmt::Display for ScrimFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short())
    }
}
