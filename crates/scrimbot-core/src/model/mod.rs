// Value types the reconciliation engine operates over.

mod format;
mod profile;
mod scrim;
mod team;

pub use format::{FormatInfo, ScrimFormat};
pub use profile::{Champion, Player, Reputation, ResponseTime};
pub use scrim::{datetime_from_millis, naive_to_millis, Scrim, Slot, REMOVAL_MINUTES_PER_GAME};
pub use team::{GanksterRank, Opponent, Team};
