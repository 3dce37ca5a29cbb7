// Process-level pieces of the bot: command-line parsing and the tick loop.

pub mod cli;
pub mod service;

pub use cli::{Cli, Command};
pub use service::{PollPoster, Service};
