// Command-line surface: `scrimbot` runs the bot; the subcommands issue one
// mutation against the scheduling service and exit.

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};

use scrimbot_core::model::{Opponent, Scrim, ScrimFormat, Team};
use scrimbot_core::{ErrorKind, ScrimActions, ScrimError};

pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Parser, Debug)]
#[command(
    name = "scrimbot",
    version,
    about = "Scrim scheduling bot",
    after_help = "<TIME> is local time as YYYY-MM-DDTHH:MM, <FORMAT> is a short code such as \
                  Bo3, 2 Games or G2, <TEAM> is a team name or number.\n\
                  Log filter: RUST_LOG (default scrimbot=info,...,warn)."
)]
pub struct Cli {
    /// Command; runs the polling loop when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Run)
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the polling loop
    Run,
    /// Open a scrim request
    Create {
        #[arg(value_parser = parse_time)]
        time: NaiveDateTime,
        #[arg(value_parser = parse_format)]
        format: ScrimFormat,
    },
    /// Withdraw an open request
    Cancel {
        #[arg(value_parser = parse_time)]
        time: NaiveDateTime,
        #[arg(value_parser = parse_format)]
        format: ScrimFormat,
    },
    /// Accept a received request
    Accept {
        #[arg(value_parser = parse_time)]
        time: NaiveDateTime,
        #[arg(value_parser = parse_format)]
        format: ScrimFormat,
        #[arg(value_parser = parse_team_arg)]
        team: String,
    },
    /// Decline a received request
    Decline {
        #[arg(value_parser = parse_time)]
        time: NaiveDateTime,
        #[arg(value_parser = parse_format)]
        format: ScrimFormat,
        #[arg(value_parser = parse_team_arg)]
        team: String,
    },
    /// Cancel a confirmed booking
    CancelBooking {
        #[arg(value_parser = parse_time)]
        time: NaiveDateTime,
        #[arg(value_parser = parse_format)]
        format: ScrimFormat,
        #[arg(value_parser = parse_team_arg)]
        team: String,
        /// Reason shown to the opponent
        #[arg(required = true, num_args = 1.., trailing_var_arg = true)]
        reason: Vec<String>,
    },
    /// Answer another team's open request
    Send {
        #[arg(value_parser = parse_time)]
        time: NaiveDateTime,
        #[arg(value_parser = parse_format)]
        format: ScrimFormat,
        #[arg(value_parser = parse_team_arg)]
        team: String,
    },
}

// ---------------------------------------------------------------------------
// Value parsers
// ---------------------------------------------------------------------------

fn parse_time(input: &str) -> Result<NaiveDateTime, ScrimError> {
    NaiveDateTime::parse_from_str(input.trim(), TIME_FORMAT).map_err(|e| {
        ScrimError::new(ErrorKind::InvalidTime, format!("time={input}")).with_source(e)
    })
}

fn parse_format(input: &str) -> Result<ScrimFormat, ScrimError> {
    match ScrimFormat::parse_user(input) {
        Some(ScrimFormat::None) | None => Err(ScrimError::new(
            ErrorKind::InvalidFormat,
            format!("format={input}"),
        )),
        Some(format) => Ok(format),
    }
}

/// A numeric argument is a team number, anything else a name.
pub fn parse_team(input: &str) -> Result<Team, ScrimError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ScrimError::new(ErrorKind::InvalidTeam, "team=''"));
    }
    Ok(match input.parse::<u64>() {
        Ok(number) if number != 0 => Team::numbered(number),
        _ => Team::named(input),
    })
}

fn parse_team_arg(input: &str) -> Result<String, ScrimError> {
    parse_team(input)?;
    Ok(input.trim().to_string())
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

fn opponent(team: &str) -> Result<Opponent, ScrimError> {
    Ok(Opponent::Team(parse_team(team)?))
}

/// Run a one-shot mutation. Returns a confirmation line to print; `Run` is
/// handled by the caller and yields `None`.
pub async fn execute<A: ScrimActions>(
    actions: &A,
    command: &Command,
) -> Result<Option<String>, ScrimError> {
    let message = match command {
        Command::Run => return Ok(None),
        Command::Create { time, format } => {
            let scrim = Scrim::open(*time, *format);
            actions.create_request(&scrim).await?;
            format!("created request for {}", scrim.slot())
        }
        Command::Cancel { time, format } => {
            let scrim = Scrim::open(*time, *format);
            actions.cancel_request(&scrim).await?;
            format!("cancelled request for {}", scrim.slot())
        }
        Command::Accept { time, format, team } | Command::Decline { time, format, team } => {
            let accept = matches!(command, Command::Accept { .. });
            let scrim = Scrim::request(*time, *format, opponent(team)?);
            actions.respond_to_request(&scrim, accept).await?;
            let verb = if accept { "accepted" } else { "declined" };
            format!("{verb} {team} for {}", scrim.slot())
        }
        Command::CancelBooking {
            time,
            format,
            team,
            reason,
        } => {
            let scrim = Scrim::booked(*time, *format, opponent(team)?);
            actions.cancel_booking(&scrim, &reason.join(" ")).await?;
            format!("cancelled booking vs {team} for {}", scrim.slot())
        }
        Command::Send { time, format, team } => {
            let scrim = Scrim::request(*time, *format, opponent(team)?);
            actions.send_request(&scrim).await?;
            format!("sent request to {team} for {}", scrim.slot())
        }
    };
    Ok(Some(message))
}
