// Notification side of the bot: chat messages, sheet bookkeeping and the
// weekly availability poll.

pub mod discord;
pub mod embed;
pub mod poll;
pub mod sheet;

pub use discord::DiscordDispatcher;
pub use poll::{PollSchedule, PollWeek};
pub use sheet::{AppsScriptSheet, LedgerSheet, ScrimSheet};
