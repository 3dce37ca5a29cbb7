// Chat message rendering: one embed per event kind.

use chrono::NaiveDateTime;
use serde::Serialize;

use scrimbot_core::model::{Scrim, Team};
use scrimbot_core::ScrimEvent;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const COLOR_GOLD: u32 = 0xF1C40F;
pub const COLOR_GREEN: u32 = 0x2ECC71;
pub const COLOR_BLUE: u32 = 0x3498DB;
pub const COLOR_RED: u32 = 0xE74C3C;
pub const COLOR_BLURPLE: u32 = 0x5865F2;

const PING_BASE: &str = "https://wiki.leagueoflegends.com/en-us/images";
const OPGG_ICON: &str = "https://play-lh.googleusercontent.com/FeRWKSHpYNEW21xZCQ-Y4AkKAaKVqLIy__PxmiE_kGN1uRh7eiB87ZFlp3j1DRp9r8k";
const MISSING_VALUE: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ping {
    EnemyMissing,
    AssistMe,
    OnMyWay,
    Retreat,
}

impl Ping {
    fn url(self) -> String {
        let name = match self {
            Ping::EnemyMissing => "Enemy_Missing_ping",
            Ping::AssistMe => "Assist_Me_ping",
            Ping::OnMyWay => "On_My_Way_ping",
            Ping::Retreat => "Retreat_ping",
        };
        format!("{PING_BASE}/{name}.png")
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbedAuthor {
    pub name: String,
    pub url: String,
    pub icon_url: String,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub fn date_string(time: NaiveDateTime) -> String {
    time.format("%A, %B %d").to_string()
}

/// 12-hour clock without a leading zero, e.g. `9:00 PM`.
pub fn time_string(time: NaiveDateTime) -> String {
    time.format("%I:%M %p")
        .to_string()
        .trim_start_matches('0')
        .to_string()
}

/// Renders events for one tracked team.
#[derive(Debug, Clone)]
pub struct Renderer {
    team_name: String,
    team_page_base: String,
}

impl Renderer {
    pub fn new(team_name: impl Into<String>, team_page_base: impl Into<String>) -> Self {
        Self {
            team_name: team_name.into(),
            team_page_base: team_page_base.into(),
        }
    }

    fn team_page(&self, team: &Team) -> Option<String> {
        (team.number != 0 && !self.team_page_base.is_empty()).then(|| {
            format!(
                "{}/{}",
                self.team_page_base.trim_end_matches('/'),
                team.number
            )
        })
    }

    /// The embed for `event`, or `None` for kinds that post nothing.
    pub fn render(&self, event: &ScrimEvent) -> Option<Embed> {
        let scrim = event.scrim();
        let opponent = opponent_name(scrim);
        let us = &self.team_name;

        let embed = match event {
            ScrimEvent::Created(_) => base(
                "Scrim Request Sent",
                format!("{us} has sent out a request for a scrim!"),
                COLOR_GOLD,
                Ping::EnemyMissing,
                scrim,
            ),
            ScrimEvent::Resent(_) => base(
                "Scrim Request Resent",
                format!("{us} is looking for a new opponent for this slot."),
                COLOR_GOLD,
                Ping::EnemyMissing,
                scrim,
            ),
            ScrimEvent::Updated { old, .. } => base(
                "Scrim Request Updated",
                format!("Format changed from {} to {}.", old.format, scrim.format),
                COLOR_GOLD,
                Ping::EnemyMissing,
                scrim,
            ),
            ScrimEvent::RequestSent(_) => self.with_opponent(
                base(
                    &format!("Scrim Request Sent to {opponent}"),
                    "Waiting on their answer.".to_string(),
                    COLOR_GOLD,
                    Ping::EnemyMissing,
                    scrim,
                ),
                scrim,
            ),
            ScrimEvent::RequestReceived(_) => self.with_opponent(
                base(
                    &format!("Scrim Request Received From {opponent}"),
                    "Should you accept or decline? The choice is yours!".to_string(),
                    COLOR_GREEN,
                    Ping::AssistMe,
                    scrim,
                ),
                scrim,
            ),
            ScrimEvent::Booked(_)
            | ScrimEvent::WildcardBooked(_)
            | ScrimEvent::UpdatedBooked { .. }
            | ScrimEvent::WildcardUpdatedBooked { .. } => self.found(scrim, None),
            ScrimEvent::BookedUpdated { old, .. } | ScrimEvent::WildcardBookedUpdated { old, .. } => {
                self.found(scrim, Some(old))
            }
            ScrimEvent::FoundCancelled(_) => base(
                &format!("Scrim Cancelled vs {opponent}"),
                format!("Darn {opponent} how unreliable!"),
                COLOR_RED,
                Ping::Retreat,
                scrim,
            ),
            ScrimEvent::CreatedCancelled(_) => base(
                "Scrim Request Withdrawn",
                format!("{us} is no longer looking for this scrim."),
                COLOR_RED,
                Ping::Retreat,
                scrim,
            ),
            ScrimEvent::Played(_) => base(
                &format!("Scrim Played vs {opponent}"),
                "GG! Results are being recorded.".to_string(),
                COLOR_BLURPLE,
                Ping::OnMyWay,
                scrim,
            ),
            ScrimEvent::RequestPassed(_)
            | ScrimEvent::ReceivedRequestRemoved(_)
            | ScrimEvent::SentRequestRemoved(_) => return None,
        };
        Some(embed)
    }

    /// A booking, or a booking whose format changed from `old`'s.
    fn found(&self, scrim: &Scrim, old: Option<&Scrim>) -> Embed {
        let verb = if old.is_some() { "Updated" } else { "Found" };
        let title = if scrim.opponent.is_known() {
            format!("Scrim {verb} vs {}", opponent_name(scrim))
        } else {
            format!("Scrim {verb}")
        };
        let mut description = match old {
            Some(old) => format!("Format changed from {} to {}.", old.format, scrim.format),
            None => "Get ready to rumble!".to_string(),
        };
        if !scrim.opponent.is_known() {
            description.push_str(" Opponent to be confirmed.");
        }
        self.with_opponent(
            base(&title, description, COLOR_BLUE, Ping::OnMyWay, scrim),
            scrim,
        )
    }

    /// Team, rank and reputation fields plus links for a known opponent.
    fn with_opponent(&self, mut embed: Embed, scrim: &Scrim) -> Embed {
        let Some(team) = scrim.opponent.team() else {
            return embed;
        };
        let rank = team.rank.map(|r| r.label().to_string());
        let rep = team.reputation.as_ref().map(|r| format!("{:.2}", r.gank_rep));
        embed.fields.push(field("Team", non_empty(team.name.clone())));
        embed.fields.push(field("Rank", rank.unwrap_or_else(|| MISSING_VALUE.into())));
        embed.fields.push(field("GankRep", rep.unwrap_or_else(|| MISSING_VALUE.into())));
        embed.url = self.team_page(team);
        if !team.opgg_link.is_empty() {
            embed.author = Some(EmbedAuthor {
                name: "OP.GG".into(),
                url: team.opgg_link.clone(),
                icon_url: OPGG_ICON.into(),
            });
        }
        embed
    }
}

fn base(title: &str, description: String, color: u32, ping: Ping, scrim: &Scrim) -> Embed {
    Embed {
        title: title.to_string(),
        description,
        color,
        url: None,
        fields: vec![
            field("Date", date_string(scrim.time)),
            field("Time", time_string(scrim.time)),
            field("Format", scrim.format.short().to_string()),
        ],
        thumbnail: Some(EmbedImage { url: ping.url() }),
        author: None,
    }
}

/// The opponent's name when known, otherwise its placeholder.
fn opponent_name(scrim: &Scrim) -> String {
    match scrim.opponent.team() {
        Some(team) if !team.name.is_empty() => team.name.clone(),
        _ => scrim.opponent.display_name(),
    }
}

fn field(name: &str, value: String) -> EmbedField {
    EmbedField {
        name: name.to_string(),
        value,
        inline: true,
    }
}

/// Embed field values may not be empty.
fn non_empty(value: String) -> String {
    if value.trim().is_empty() {
        MISSING_VALUE.to_string()
    } else {
        value
    }
}
